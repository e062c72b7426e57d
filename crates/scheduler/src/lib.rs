use std::time::Duration;

use heroconfig::{FlashSettings, TintSettings};
use rand::prelude::*;

#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("{name} window is inverted: {min:?} > {max:?}")]
    InvertedWindow {
        name: &'static str,
        min: Duration,
        max: Duration,
    },
    #[error("flash decay must be within (0, 1), got {0}")]
    InvalidDecay(f32),
}

/// Randomised timing windows for flash events.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlashTiming {
    warmup: (Duration, Duration),
    interval: (Duration, Duration),
    decay: f32,
}

impl FlashTiming {
    pub fn new(
        warmup: (Duration, Duration),
        interval: (Duration, Duration),
        decay: f32,
    ) -> Result<Self, SchedulerError> {
        if warmup.0 > warmup.1 {
            return Err(SchedulerError::InvertedWindow {
                name: "warm-up",
                min: warmup.0,
                max: warmup.1,
            });
        }
        if interval.0 > interval.1 {
            return Err(SchedulerError::InvertedWindow {
                name: "interval",
                min: interval.0,
                max: interval.1,
            });
        }
        if !(decay > 0.0 && decay < 1.0) {
            return Err(SchedulerError::InvalidDecay(decay));
        }
        Ok(Self {
            warmup,
            interval,
            decay,
        })
    }

    pub fn decay(&self) -> f32 {
        self.decay
    }
}

impl TryFrom<&FlashSettings> for FlashTiming {
    type Error = SchedulerError;

    fn try_from(settings: &FlashSettings) -> Result<Self, Self::Error> {
        Self::new(
            (settings.warmup_min, settings.warmup_max),
            (settings.interval_min, settings.interval_max),
            settings.decay as f32,
        )
    }
}

impl Default for FlashTiming {
    fn default() -> Self {
        Self {
            warmup: (Duration::from_millis(800), Duration::from_millis(6_800)),
            interval: (Duration::from_millis(300), Duration::from_secs(10)),
            decay: 0.90,
        }
    }
}

/// Geometrically decaying flash intensity re-triggered at random intervals.
///
/// `tick` is called once per frame with the elapsed time since the animation
/// started. Every tick first decays the intensity; a tick that reaches the
/// scheduled trigger time resets it to `1.0` and draws the next trigger from
/// the interval window. The very first trigger is drawn from the warm-up
/// window instead.
pub struct FlashScheduler {
    timing: Option<FlashTiming>,
    rng: StdRng,
    next_at: Duration,
    intensity: f32,
}

impl FlashScheduler {
    pub fn new(timing: FlashTiming, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let next_at = sample_window(&mut rng, timing.warmup);
        Self {
            timing: Some(timing),
            rng,
            next_at,
            intensity: 0.0,
        }
    }

    /// A scheduler that never fires.
    pub fn disabled() -> Self {
        Self {
            timing: None,
            rng: StdRng::seed_from_u64(0),
            next_at: Duration::MAX,
            intensity: 0.0,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.timing.is_some()
    }

    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    /// Time (since animation start) of the next scheduled flash.
    pub fn next_trigger(&self) -> Option<Duration> {
        self.timing.as_ref().map(|_| self.next_at)
    }

    pub fn tick(&mut self, elapsed: Duration) -> f32 {
        let Some(timing) = self.timing.as_ref() else {
            return 0.0;
        };
        self.intensity *= timing.decay;
        if elapsed >= self.next_at {
            self.intensity = 1.0;
            self.next_at = elapsed.saturating_add(sample_window(&mut self.rng, timing.interval));
        }
        self.intensity
    }

    /// Re-arms the warm-up window relative to `elapsed`, clearing any flash.
    pub fn restart(&mut self, elapsed: Duration) {
        if let Some(timing) = self.timing.as_ref() {
            self.next_at = elapsed.saturating_add(sample_window(&mut self.rng, timing.warmup));
        }
        self.intensity = 0.0;
    }
}

fn sample_window(rng: &mut StdRng, window: (Duration, Duration)) -> Duration {
    let (min, max) = window;
    if min >= max {
        return min;
    }
    let seconds = rng.gen_range(min.as_secs_f64()..=max.as_secs_f64());
    // f64 rounding can land just outside a very wide window.
    Duration::try_from_secs_f64(seconds)
        .unwrap_or(max)
        .clamp(min, max)
}

/// Day/night colour multiplier gated by the local hour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TintSchedule {
    day: [f32; 3],
    night: [f32; 3],
    day_start_hour: u32,
    day_end_hour: u32,
}

impl TintSchedule {
    pub fn new(day: [f32; 3], night: [f32; 3], day_start_hour: u32, day_end_hour: u32) -> Self {
        Self {
            day,
            night,
            day_start_hour,
            day_end_hour,
        }
    }

    pub fn is_day(&self, hour: u32) -> bool {
        (self.day_start_hour..=self.day_end_hour).contains(&hour)
    }

    pub fn tint_at(&self, hour: u32) -> [f32; 3] {
        let weight = if self.is_day(hour) { 1.0 } else { 0.0 };
        std::array::from_fn(|channel| {
            self.night[channel] * (1.0 - weight) + self.day[channel] * weight
        })
    }
}

impl From<&TintSettings> for TintSchedule {
    fn from(settings: &TintSettings) -> Self {
        Self::new(
            settings.day.map(|channel| channel as f32),
            settings.night.map(|channel| channel as f32),
            settings.day_start_hour,
            settings.day_end_hour,
        )
    }
}

impl Default for TintSchedule {
    fn default() -> Self {
        Self::from(&TintSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heroconfig::HeroConfig;

    fn quiet_timing() -> FlashTiming {
        FlashTiming::new(
            (Duration::from_secs(1), Duration::from_secs(1)),
            (Duration::from_secs(600), Duration::from_secs(600)),
            0.90,
        )
        .unwrap()
    }

    #[test]
    fn first_flash_lands_inside_warmup_window() {
        let timing = FlashTiming::default();
        for seed in 0..32 {
            let scheduler = FlashScheduler::new(timing, seed);
            let next = scheduler.next_trigger().unwrap();
            assert!(next >= Duration::from_millis(800), "seed {seed}: {next:?}");
            assert!(next <= Duration::from_millis(6_800), "seed {seed}: {next:?}");
        }
    }

    #[test]
    fn trigger_resets_intensity_to_one() {
        let mut scheduler = FlashScheduler::new(quiet_timing(), 7);
        assert_eq!(scheduler.tick(Duration::from_millis(500)), 0.0);
        assert_eq!(scheduler.tick(Duration::from_secs(1)), 1.0);
        assert_eq!(scheduler.next_trigger(), Some(Duration::from_secs(601)));
    }

    #[test]
    fn intensity_decays_geometrically_per_frame() {
        let mut scheduler = FlashScheduler::new(quiet_timing(), 7);
        let mut now = Duration::from_secs(1);
        assert_eq!(scheduler.tick(now), 1.0);

        for frame in 1..=44 {
            now += Duration::from_millis(16);
            let value = scheduler.tick(now);
            let expected = 0.90f32.powi(frame);
            assert!((value - expected).abs() < 1e-5, "frame {frame}: {value}");
        }
        assert!(scheduler.intensity() < 0.01);
    }

    #[test]
    fn flash_is_still_visible_after_43_frames() {
        let mut scheduler = FlashScheduler::new(quiet_timing(), 3);
        let mut now = Duration::from_secs(1);
        scheduler.tick(now);
        for _ in 0..43 {
            now += Duration::from_millis(16);
            scheduler.tick(now);
        }
        assert!(scheduler.intensity() > 0.01);
    }

    #[test]
    fn retrigger_interval_stays_inside_window() {
        let mut scheduler = FlashScheduler::new(FlashTiming::default(), 11);
        let mut now = Duration::ZERO;
        let mut triggers = 0;
        while triggers < 20 {
            let due = scheduler.next_trigger().unwrap();
            now = due;
            assert_eq!(scheduler.tick(now), 1.0);
            let gap = scheduler.next_trigger().unwrap() - now;
            assert!(gap >= Duration::from_millis(300), "gap {gap:?}");
            assert!(gap <= Duration::from_secs(10), "gap {gap:?}");
            triggers += 1;
        }
    }

    #[test]
    fn same_seed_produces_same_schedule() {
        let mut a = FlashScheduler::new(FlashTiming::default(), 42);
        let mut b = FlashScheduler::new(FlashTiming::default(), 42);
        for step in 0..600u64 {
            let now = Duration::from_millis(step * 16);
            assert_eq!(a.tick(now), b.tick(now));
        }
    }

    #[test]
    fn disabled_scheduler_never_fires() {
        let mut scheduler = FlashScheduler::disabled();
        assert!(!scheduler.is_enabled());
        assert_eq!(scheduler.tick(Duration::from_secs(3600)), 0.0);
        assert_eq!(scheduler.next_trigger(), None);
    }

    #[test]
    fn restart_clears_flash_and_rearms_warmup() {
        let mut scheduler = FlashScheduler::new(quiet_timing(), 5);
        scheduler.tick(Duration::from_secs(1));
        scheduler.restart(Duration::from_secs(30));
        assert_eq!(scheduler.intensity(), 0.0);
        assert_eq!(scheduler.next_trigger(), Some(Duration::from_secs(31)));
    }

    #[test]
    fn rejects_inverted_windows() {
        let err = FlashTiming::new(
            (Duration::from_secs(2), Duration::from_secs(1)),
            (Duration::from_secs(1), Duration::from_secs(2)),
            0.9,
        )
        .unwrap_err();
        assert!(matches!(err, SchedulerError::InvertedWindow { name: "warm-up", .. }));
        assert!(FlashTiming::new(
            (Duration::ZERO, Duration::ZERO),
            (Duration::ZERO, Duration::ZERO),
            1.5
        )
        .is_err());
    }

    #[test]
    fn huge_windows_saturate_instead_of_overflowing() {
        let timing = FlashTiming::new(
            (Duration::MAX, Duration::MAX),
            (Duration::from_secs(u64::MAX / 2), Duration::MAX),
            0.9,
        )
        .unwrap();
        let mut scheduler = FlashScheduler::new(timing, 9);
        assert_eq!(scheduler.next_trigger(), Some(Duration::MAX));

        scheduler.restart(Duration::from_secs(60));
        assert_eq!(scheduler.next_trigger(), Some(Duration::MAX));
        assert_eq!(scheduler.tick(Duration::MAX), 1.0);
        assert_eq!(scheduler.next_trigger(), Some(Duration::MAX));
    }

    #[test]
    fn timing_builds_from_config() {
        let config = HeroConfig::default();
        let timing = FlashTiming::try_from(&config.flash).unwrap();
        assert_eq!(timing, FlashTiming::default());
    }

    #[test]
    fn tint_switches_on_hour_boundaries() {
        let schedule = TintSchedule::default();
        let day = [1.06, 1.0, 0.92];
        let night = [0.9, 0.98, 1.12];
        assert_eq!(schedule.tint_at(6), night);
        assert_eq!(schedule.tint_at(7), day);
        assert_eq!(schedule.tint_at(12), day);
        assert_eq!(schedule.tint_at(18), day);
        assert_eq!(schedule.tint_at(19), night);
        assert_eq!(schedule.tint_at(0), night);
    }
}
