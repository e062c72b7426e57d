//! Host surface measurement and breakpoint classification.

use crate::types::{Breakpoint, BreakpointThresholds};

/// Raw host surface measurement in CSS (logical) pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HostMeasurement {
    pub css_width: f64,
    pub css_height: f64,
    pub device_pixel_ratio: f64,
}

impl HostMeasurement {
    /// Converts a physical window size and scale factor into CSS units.
    pub fn from_physical(width: u32, height: u32, scale_factor: f64) -> Self {
        let scale = if scale_factor.is_finite() && scale_factor > 0.0 {
            scale_factor
        } else {
            1.0
        };
        Self {
            css_width: f64::from(width) / scale,
            css_height: f64::from(height) / scale,
            device_pixel_ratio: scale,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewportState {
    pub pixel_width: u32,
    pub pixel_height: u32,
    pub device_pixel_ratio: f32,
    pub css_width: f32,
    /// Selects the background asset.
    pub breakpoint: Breakpoint,
    /// Selects the desired logo height.
    pub layout_breakpoint: Breakpoint,
}

impl ViewportState {
    pub fn aspect(&self) -> f32 {
        self.pixel_width as f32 / self.pixel_height as f32
    }

    pub fn resolution(&self) -> [f32; 2] {
        [self.pixel_width as f32, self.pixel_height as f32]
    }
}

/// Result of feeding a new measurement into the manager.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewportUpdate {
    pub state: ViewportState,
    /// The backing pixel size differs from the previous measurement.
    pub resized: bool,
}

pub struct ViewportManager {
    thresholds: BreakpointThresholds,
    max_pixel_ratio: f32,
    current: Option<ViewportState>,
}

impl ViewportManager {
    pub fn new(thresholds: BreakpointThresholds, max_pixel_ratio: f32) -> Self {
        Self {
            thresholds,
            max_pixel_ratio: max_pixel_ratio.max(1.0),
            current: None,
        }
    }

    pub fn current(&self) -> Option<&ViewportState> {
        self.current.as_ref()
    }

    /// Pure measurement; does not touch the tracked state.
    pub fn measure(&self, host: HostMeasurement) -> ViewportState {
        let dpr = if host.device_pixel_ratio.is_finite() && host.device_pixel_ratio > 0.0 {
            host.device_pixel_ratio as f32
        } else {
            1.0
        };
        let ratio = dpr.min(self.max_pixel_ratio);
        let css_width = sanitize(host.css_width);
        let css_height = sanitize(host.css_height);
        ViewportState {
            pixel_width: to_pixels(css_width, ratio),
            pixel_height: to_pixels(css_height, ratio),
            device_pixel_ratio: dpr,
            css_width,
            breakpoint: Breakpoint::classify(css_width, self.thresholds.asset),
            layout_breakpoint: Breakpoint::classify(css_width, self.thresholds.logo),
        }
    }

    /// Records a new measurement, invoking `on_breakpoint_change(old, new)`
    /// once when the asset breakpoint flips. The first measurement only
    /// establishes the baseline.
    pub fn update<F>(&mut self, host: HostMeasurement, mut on_breakpoint_change: F) -> ViewportUpdate
    where
        F: FnMut(Breakpoint, Breakpoint),
    {
        let state = self.measure(host);
        let previous = self.current.replace(state);
        let resized = match previous {
            Some(previous) => {
                if previous.breakpoint != state.breakpoint {
                    on_breakpoint_change(previous.breakpoint, state.breakpoint);
                }
                previous.pixel_width != state.pixel_width
                    || previous.pixel_height != state.pixel_height
            }
            None => true,
        };
        ViewportUpdate { state, resized }
    }
}

fn sanitize(css: f64) -> f32 {
    if css.is_finite() && css > 0.0 {
        css as f32
    } else {
        0.0
    }
}

fn to_pixels(css: f32, ratio: f32) -> u32 {
    ((css * ratio).floor() as u32).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> ViewportManager {
        ViewportManager::new(BreakpointThresholds::default(), 2.0)
    }

    fn host(width: f64, height: f64, dpr: f64) -> HostMeasurement {
        HostMeasurement {
            css_width: width,
            css_height: height,
            device_pixel_ratio: dpr,
        }
    }

    #[test]
    fn caps_device_pixel_ratio_and_floors() {
        let state = manager().measure(host(375.5, 812.3, 3.0));
        assert_eq!(state.pixel_width, 751);
        assert_eq!(state.pixel_height, 1624);
        assert_eq!(state.device_pixel_ratio, 3.0);

        let fractional = manager().measure(host(333.0, 100.0, 1.5));
        assert_eq!(fractional.pixel_width, 499);
    }

    #[test]
    fn collapsed_host_still_has_one_pixel() {
        let state = manager().measure(host(0.0, -4.0, f64::NAN));
        assert_eq!((state.pixel_width, state.pixel_height), (1, 1));
        assert_eq!(state.device_pixel_ratio, 1.0);
    }

    #[test]
    fn thresholds_classify_independently() {
        let tablet = manager().measure(host(600.0, 900.0, 1.0));
        assert_eq!(tablet.breakpoint, Breakpoint::Desktop);
        assert_eq!(tablet.layout_breakpoint, Breakpoint::Mobile);

        let phone = manager().measure(host(375.0, 812.0, 2.0));
        assert_eq!(phone.breakpoint, Breakpoint::Mobile);
        assert_eq!(phone.layout_breakpoint, Breakpoint::Mobile);
    }

    #[test]
    fn crossing_the_asset_threshold_fires_once() {
        let mut viewport = manager();
        let mut calls = Vec::new();
        viewport.update(host(1280.0, 720.0, 1.0), |old, new| calls.push((old, new)));
        assert!(calls.is_empty());

        viewport.update(host(500.0, 720.0, 1.0), |old, new| calls.push((old, new)));
        viewport.update(host(480.0, 720.0, 1.0), |old, new| calls.push((old, new)));
        viewport.update(host(420.0, 700.0, 1.0), |old, new| calls.push((old, new)));
        assert_eq!(calls, vec![(Breakpoint::Desktop, Breakpoint::Mobile)]);
    }

    #[test]
    fn staying_on_one_side_never_fires() {
        let mut viewport = manager();
        let mut calls = 0;
        for width in [1920.0, 1600.0, 1024.0, 700.0, 561.0, 1920.0] {
            viewport.update(host(width, 1080.0, 1.0), |_, _| calls += 1);
        }
        assert_eq!(calls, 0);
    }

    #[test]
    fn logo_threshold_alone_does_not_reload_assets() {
        let mut viewport = manager();
        let mut calls = 0;
        viewport.update(host(1024.0, 768.0, 1.0), |_, _| calls += 1);
        let update = viewport.update(host(700.0, 768.0, 1.0), |_, _| calls += 1);
        assert_eq!(calls, 0);
        assert_eq!(update.state.layout_breakpoint, Breakpoint::Mobile);
    }

    #[test]
    fn reports_resize_only_when_pixels_change() {
        let mut viewport = manager();
        assert!(viewport.update(host(800.0, 600.0, 1.0), |_, _| {}).resized);
        assert!(!viewport.update(host(800.2, 600.4, 1.0), |_, _| {}).resized);
        assert!(viewport.update(host(800.0, 600.0, 2.0), |_, _| {}).resized);
    }
}
