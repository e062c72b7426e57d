//! CPU mirrors of the deterministic terms in the hero fragment shader.
//!
//! These follow the GLSL in [`crate::compile`] operation for operation so
//! golden-frame tooling can predict which rows tear for a given seed.

/// Number of tear bands per unit of height.
pub const SLICE_BANDS: f32 = 12.0;

pub fn hash11(p: f32) -> f32 {
    let mut x = fract(p * 0.1031);
    x *= x + 33.33;
    x *= x + x;
    fract(x)
}

pub fn hash21(p: [f32; 2]) -> f32 {
    let mut p3 = [
        fract(p[0] * 0.1031),
        fract(p[1] * 0.1031),
        fract(p[0] * 0.1031),
    ];
    let d = p3[0] * (p3[1] + 33.33) + p3[1] * (p3[2] + 33.33) + p3[2] * (p3[0] + 33.33);
    for value in &mut p3 {
        *value += d;
    }
    fract((p3[0] + p3[1]) * p3[2])
}

/// Horizontal tear offset for the band containing `y`; zero for ~70% of bands.
pub fn slice_offset(y: f32, seed: f32) -> f32 {
    let band = (y * SLICE_BANDS).floor();
    let r = hash11(band + seed * 57.0);
    if r < 0.7 {
        return 0.0;
    }
    glsl_sign(r - 0.5) * (0.002 + 0.02 * r)
}

/// Crop-to-cover remap of a screen UV onto an image of `image_size`.
pub fn cover_uv(uv: [f32; 2], resolution: [f32; 2], image_size: [f32; 2]) -> [f32; 2] {
    let screen_aspect = resolution[0] / resolution[1];
    let image_aspect = image_size[0] / image_size[1];
    if image_aspect > screen_aspect {
        [(uv[0] - 0.5) * (screen_aspect / image_aspect) + 0.5, uv[1]]
    } else {
        [uv[0], (uv[1] - 0.5) * (image_aspect / screen_aspect) + 0.5]
    }
}

fn fract(x: f32) -> f32 {
    x - x.floor()
}

fn glsl_sign(x: f32) -> f32 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}
