use bytemuck::{Pod, Zeroable};

use crate::animation::RenderUniforms;

/// std140 mirror of the `GlitchParams` block in the fragment shader.
#[repr(C, align(16))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct GlitchUniforms {
    pub resolution: [f32; 2],
    pub time: f32,
    pub flash: f32,
    pub bg_size: [f32; 2],
    pub bg_seed: f32,
    pub bg_intensity: f32,
    pub logo_center: [f32; 2],
    pub logo_half: [f32; 2],
    pub logo_seed: f32,
    pub logo_intensity: f32,
    pub logo_hover: f32,
    /// Negative when the background never freezes.
    pub bg_freeze_at: f32,
    pub mouse: [f32; 2],
    pub noise_seed: f32,
    pub noise_opacity: f32,
    pub tint: [f32; 4],
}

unsafe impl Zeroable for GlitchUniforms {}
unsafe impl Pod for GlitchUniforms {}

impl GlitchUniforms {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            resolution: [width.max(1) as f32, height.max(1) as f32],
            bg_size: [1.0, 1.0],
            bg_freeze_at: -1.0,
            mouse: [0.5, 0.5],
            tint: [1.0; 4],
            ..Self::zeroed()
        }
    }
}

impl From<&RenderUniforms> for GlitchUniforms {
    fn from(frame: &RenderUniforms) -> Self {
        Self {
            resolution: frame.resolution,
            time: frame.time,
            flash: frame.flash,
            bg_size: frame.background_size,
            bg_seed: frame.background_seed,
            bg_intensity: frame.background_intensity,
            logo_center: frame.logo_center,
            logo_half: frame.logo_half_extents,
            logo_seed: frame.logo_seed,
            logo_intensity: frame.logo_intensity,
            logo_hover: frame.logo_hover,
            bg_freeze_at: frame.background_freeze_at.unwrap_or(-1.0),
            mouse: frame.pointer,
            noise_seed: frame.noise_seed,
            noise_opacity: frame.noise_opacity,
            tint: [frame.tint[0], frame.tint[1], frame.tint[2], 1.0],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::{offset_of, size_of};

    #[test]
    fn layout_matches_std140_block() {
        assert_eq!(size_of::<GlitchUniforms>(), 96);
        assert_eq!(offset_of!(GlitchUniforms, bg_size), 16);
        assert_eq!(offset_of!(GlitchUniforms, logo_center), 32);
        assert_eq!(offset_of!(GlitchUniforms, bg_freeze_at), 60);
        assert_eq!(offset_of!(GlitchUniforms, mouse), 64);
        assert_eq!(offset_of!(GlitchUniforms, tint), 80);
    }

    #[test]
    fn missing_freeze_maps_to_sentinel() {
        let frame = RenderUniforms {
            resolution: [800.0, 600.0],
            time: 1.5,
            flash: 0.25,
            background_size: [1600.0, 900.0],
            background_seed: 42.0,
            background_intensity: 0.6,
            logo_center: [0.5, 0.5],
            logo_half_extents: [0.1, 0.2],
            logo_seed: 7.0,
            logo_intensity: 0.55,
            logo_hover: 0.0,
            background_freeze_at: None,
            pointer: [0.3, 0.4],
            noise_seed: 512.0,
            noise_opacity: 0.08,
            tint: [1.06, 1.0, 0.92],
        };
        let gpu = GlitchUniforms::from(&frame);
        assert_eq!(gpu.bg_freeze_at, -1.0);
        assert_eq!(gpu.tint, [1.06, 1.0, 0.92, 1.0]);
        assert_eq!(gpu.mouse, [0.3, 0.4]);

        let frozen = GlitchUniforms::from(&RenderUniforms {
            background_freeze_at: Some(2.0),
            ..frame
        });
        assert_eq!(frozen.bg_freeze_at, 2.0);
    }

    #[test]
    fn default_block_has_neutral_tint() {
        let uniforms = GlitchUniforms::new(0, 0);
        assert_eq!(uniforms.resolution, [1.0, 1.0]);
        assert_eq!(uniforms.tint, [1.0; 4]);
        assert_eq!(bytemuck::bytes_of(&uniforms).len(), 96);
    }
}
