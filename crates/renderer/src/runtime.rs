use std::time::Instant;

use chrono::{Local, Timelike};

/// Snapshot of the time state supplied to the animation driver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSample {
    /// Elapsed wall-clock or simulated time in seconds.
    pub seconds: f32,
    /// Monotonic frame counter for the running session.
    pub frame_index: u64,
    /// Local hour of day (0-23) used for the tint schedule.
    pub local_hour: u32,
}

/// Abstraction over where time values originate from.
pub trait TimeSource {
    /// Restarts elapsed time from zero.
    fn reset(&mut self);
    /// Produces a time sample for the next frame.
    fn sample(&mut self) -> TimeSample;
}

/// Time source backed by the system monotonic clock and local wall clock.
#[derive(Debug, Clone, Copy)]
pub struct SystemTimeSource {
    origin: Instant,
    frame: u64,
}

impl SystemTimeSource {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            frame: 0,
        }
    }
}

impl Default for SystemTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for SystemTimeSource {
    fn reset(&mut self) {
        self.origin = Instant::now();
        self.frame = 0;
    }

    fn sample(&mut self) -> TimeSample {
        let sample = TimeSample {
            seconds: self.origin.elapsed().as_secs_f32(),
            frame_index: self.frame,
            local_hour: Local::now().hour(),
        };
        self.frame = self.frame.saturating_add(1);
        sample
    }
}

/// Time source that always reports the same instant; frames still count up.
#[derive(Debug, Clone, Copy)]
pub struct FixedTimeSource {
    seconds: f32,
    local_hour: u32,
    frame: u64,
}

impl FixedTimeSource {
    /// Non-finite or negative times pin to zero.
    pub fn new(seconds: f32, local_hour: u32) -> Self {
        Self {
            seconds: if seconds.is_finite() { seconds.max(0.0) } else { 0.0 },
            local_hour: local_hour.min(23),
            frame: 0,
        }
    }
}

impl TimeSource for FixedTimeSource {
    fn reset(&mut self) {
        self.frame = 0;
    }

    fn sample(&mut self) -> TimeSample {
        let sample = TimeSample {
            seconds: self.seconds,
            frame_index: self.frame,
            local_hour: self.local_hour,
        };
        self.frame = self.frame.saturating_add(1);
        sample
    }
}

/// Picks the clock for a run: pinned when `fixed_time` is set.
pub fn time_source_for(fixed_time: Option<f32>) -> Box<dyn TimeSource> {
    match fixed_time {
        Some(seconds) => Box::new(FixedTimeSource::new(seconds, Local::now().hour())),
        None => Box::new(SystemTimeSource::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_source_pins_time_but_counts_frames() {
        let mut source = FixedTimeSource::new(2.5, 30);
        let first = source.sample();
        let second = source.sample();
        assert_eq!(first.seconds, 2.5);
        assert_eq!(second.seconds, 2.5);
        assert_eq!(first.local_hour, 23);
        assert_eq!((first.frame_index, second.frame_index), (0, 1));
        source.reset();
        assert_eq!(source.sample().frame_index, 0);
    }

    #[test]
    fn fixed_source_rejects_unusable_times() {
        assert_eq!(FixedTimeSource::new(f32::INFINITY, 12).sample().seconds, 0.0);
        assert_eq!(FixedTimeSource::new(f32::NAN, 12).sample().seconds, 0.0);
        assert_eq!(FixedTimeSource::new(-4.0, 12).sample().seconds, 0.0);
    }

    #[test]
    fn system_source_is_monotonic() {
        let mut source = SystemTimeSource::new();
        let first = source.sample();
        let second = source.sample();
        assert!(second.seconds >= first.seconds);
        assert!(first.local_hour < 24);
        assert_eq!(second.frame_index, 1);
    }
}
