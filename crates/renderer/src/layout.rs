//! Logo placement in uniform space.
//!
//! The solved [`LogoLayout`] is the only description of where the logo sits:
//! the shader receives its centre and half extents verbatim and the pointer
//! hit test calls [`LogoLayout::contains`] on the same value.

/// Logo quad in `[0, 1]²` uniform space, centred on the viewport.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LogoLayout {
    pub center: [f32; 2],
    pub height: f32,
    pub width: f32,
}

impl LogoLayout {
    pub const CENTER: [f32; 2] = [0.5, 0.5];

    /// A layout that covers nothing; used until the logo texture is known.
    pub fn empty() -> Self {
        Self {
            center: Self::CENTER,
            height: 0.0,
            width: 0.0,
        }
    }

    pub fn half_extents(&self) -> [f32; 2] {
        [self.width * 0.5, self.height * 0.5]
    }

    pub fn min(&self) -> [f32; 2] {
        let half = self.half_extents();
        [self.center[0] - half[0], self.center[1] - half[1]]
    }

    pub fn max(&self) -> [f32; 2] {
        let half = self.half_extents();
        [self.center[0] + half[0], self.center[1] + half[1]]
    }

    /// Inclusive containment test, matching the shader's `step` edges.
    pub fn contains(&self, point: [f32; 2]) -> bool {
        let min = self.min();
        let max = self.max();
        point[0] >= min[0] && point[0] <= max[0] && point[1] >= min[1] && point[1] <= max[1]
    }
}

impl Default for LogoLayout {
    fn default() -> Self {
        Self::empty()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LogoLayoutSolver {
    padding: f32,
}

impl LogoLayoutSolver {
    pub const DEFAULT_PADDING: f32 = 0.9;

    pub fn new(padding: f32) -> Self {
        Self { padding }
    }

    pub fn padding(&self) -> f32 {
        self.padding
    }

    /// Clamps `desired_height` so the logo fits within `padding` of both axes.
    ///
    /// Aspects are width over height. A degenerate logo aspect (zero or NaN)
    /// leaves the width bound non-finite, in which case only the height bound
    /// applies; any non-finite width collapses to zero.
    pub fn solve(&self, logo_aspect: f32, viewport_aspect: f32, desired_height: f32) -> LogoLayout {
        let max_by_height = self.padding;
        let max_by_width = self.padding * viewport_aspect / logo_aspect;
        let bound = if max_by_width.is_finite() {
            max_by_height.min(max_by_width)
        } else {
            max_by_height
        };
        let height = desired_height.min(bound.max(0.0)).max(0.0);
        let width = height * logo_aspect / viewport_aspect;
        LogoLayout {
            center: LogoLayout::CENTER,
            height,
            width: if width.is_finite() { width } else { 0.0 },
        }
    }
}

impl Default for LogoLayoutSolver {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PADDING)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::prelude::*;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn wide_viewport_keeps_desired_height() {
        let layout = LogoLayoutSolver::default().solve(1.0, 1920.0 / 1080.0, 0.35);
        assert!((layout.height - 0.35).abs() < EPSILON);
        assert!((layout.width - 0.196875).abs() < 1e-4, "{}", layout.width);
        assert_eq!(layout.center, [0.5, 0.5]);
    }

    #[test]
    fn narrow_viewport_clamps_height_to_width_bound() {
        let aspect = 375.0 / 812.0;
        let layout = LogoLayoutSolver::default().solve(1.0, aspect, 0.45);
        assert!((layout.height - 0.9 * aspect).abs() < EPSILON);
        assert!((layout.height - 0.4156).abs() < 1e-3, "{}", layout.height);
        assert!((layout.width - 0.9).abs() < EPSILON, "{}", layout.width);
    }

    #[test]
    fn desired_height_is_capped_by_padding() {
        let layout = LogoLayoutSolver::default().solve(0.1, 2.0, 1.5);
        assert!((layout.height - 0.9).abs() < EPSILON);
    }

    #[test]
    fn never_overflows_either_axis() {
        let solver = LogoLayoutSolver::default();
        let mut rng = StdRng::seed_from_u64(0x10_60);
        for _ in 0..10_000 {
            let logo_aspect = rng.gen_range(0.05f32..20.0);
            let viewport_aspect = rng.gen_range(0.2f32..5.0);
            let desired = rng.gen_range(0.0f32..1.5);
            let layout = solver.solve(logo_aspect, viewport_aspect, desired);
            assert!(layout.height <= 0.9 + EPSILON);
            assert!(layout.height <= 0.9 * viewport_aspect / logo_aspect + EPSILON);
            assert!(layout.width <= 0.9 + EPSILON);
            assert!(layout.height >= 0.0 && layout.width >= 0.0);
        }
    }

    #[test]
    fn degenerate_logo_aspect_falls_back_to_height_bound() {
        let solver = LogoLayoutSolver::default();
        let zero = solver.solve(0.0, 1.5, 0.35);
        assert_eq!(zero.height, 0.35);
        assert_eq!(zero.width, 0.0);

        let nan = solver.solve(f32::NAN, 1.5, 0.35);
        assert_eq!(nan.height, 0.35);
        assert_eq!(nan.width, 0.0);
    }

    #[test]
    fn containment_edges_are_inclusive() {
        let layout = LogoLayout {
            center: LogoLayout::CENTER,
            height: 0.5,
            width: 0.25,
        };
        assert!(layout.contains([0.375, 0.25]));
        assert!(layout.contains([0.625, 0.75]));
        assert!(!layout.contains([0.374, 0.5]));
        assert!(!layout.contains([0.5, 0.76]));
        assert!(!LogoLayout::empty().contains([0.4, 0.4]));
    }
}
