use std::borrow::Cow;

use wgpu::naga::{self, ShaderStage};

/// Diagnostic produced while building the hero shader program.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ShaderError {
    #[error("{stage} shader failed to parse: {message}")]
    Parse { stage: &'static str, message: String },
    #[error("{stage} shader failed validation: {message}")]
    Validation { stage: &'static str, message: String },
    #[error("shader program failed to link: {0}")]
    Link(String),
}

fn stage_name(stage: ShaderStage) -> &'static str {
    match stage {
        ShaderStage::Vertex => "vertex",
        ShaderStage::Fragment => "fragment",
        _ => "compute",
    }
}

/// Parses and validates GLSL with naga, without touching a GPU.
pub fn validate_glsl(stage: ShaderStage, source: &str) -> Result<naga::Module, ShaderError> {
    let mut frontend = naga::front::glsl::Frontend::default();
    let module = frontend
        .parse(&naga::front::glsl::Options::from(stage), source)
        .map_err(|err| ShaderError::Parse {
            stage: stage_name(stage),
            message: err.to_string(),
        })?;
    naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    )
    .validate(&module)
    .map_err(|err| ShaderError::Validation {
        stage: stage_name(stage),
        message: err.to_string(),
    })?;
    Ok(module)
}

/// Validates and compiles the full-screen triangle vertex stage.
pub(crate) fn compile_vertex_shader(device: &wgpu::Device) -> Result<wgpu::ShaderModule, ShaderError> {
    compile_stage(device, "hero vertex", VERTEX_SHADER_GLSL, ShaderStage::Vertex)
}

/// Validates and compiles the glitch compositing fragment stage.
pub(crate) fn compile_fragment_shader(
    device: &wgpu::Device,
) -> Result<wgpu::ShaderModule, ShaderError> {
    compile_stage(device, "hero fragment", FRAGMENT_SHADER_GLSL, ShaderStage::Fragment)
}

fn compile_stage(
    device: &wgpu::Device,
    label: &str,
    source: &'static str,
    stage: ShaderStage,
) -> Result<wgpu::ShaderModule, ShaderError> {
    validate_glsl(stage, source)?;
    Ok(device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Borrowed(source),
            stage,
            defines: &[],
        },
    }))
}

/// Oversized triangle covering clip space; `v_uv` spans `[0, 1]²` on screen
/// with the origin at the bottom-left.
pub const VERTEX_SHADER_GLSL: &str = r"#version 450
layout(location = 0) out vec2 v_uv;

const vec2 positions[3] = vec2[3](
    vec2(-1.0, -1.0),
    vec2(3.0, -1.0),
    vec2(-1.0, 3.0)
);

void main() {
    uint vertex_index = uint(gl_VertexIndex);
    vec2 pos = positions[vertex_index];
    v_uv = pos * 0.5 + vec2(0.5, 0.5);
    gl_Position = vec4(pos, 0.0, 1.0);
}
";

/// Background and logo glitch passes composited in one draw.
///
/// The uniform block layout must match `GlitchUniforms` in `gpu/uniforms.rs`.
/// Every texture read uses `textureLod` so sampling stays valid inside the
/// data-dependent branches.
pub const FRAGMENT_SHADER_GLSL: &str = r"#version 450
layout(location = 0) in vec2 v_uv;
layout(location = 0) out vec4 out_color;

layout(std140, set = 0, binding = 0) uniform GlitchParams {
    vec2 resolution;
    float time;
    float flash;
    vec2 bg_size;
    float bg_seed;
    float bg_intensity;
    vec2 logo_center;
    vec2 logo_half;
    float logo_seed;
    float logo_intensity;
    float logo_hover;
    float bg_freeze_at;
    vec2 mouse;
    float noise_seed;
    float noise_opacity;
    vec4 tint;
} params;

layout(set = 1, binding = 0) uniform texture2D bg_texture;
layout(set = 1, binding = 1) uniform sampler bg_sampler;
layout(set = 1, binding = 2) uniform texture2D logo_texture;
layout(set = 1, binding = 3) uniform sampler logo_sampler;

#define BG_IMAGE sampler2D(bg_texture, bg_sampler)
#define LOGO_IMAGE sampler2D(logo_texture, logo_sampler)

float hash11(float p) {
    float x = fract(p * 0.1031);
    x *= x + 33.33;
    x *= x + x;
    return fract(x);
}

float hash21(vec2 p) {
    vec3 p3 = fract(vec3(p.x, p.y, p.x) * 0.1031);
    p3 = p3 + vec3(dot(p3, p3.yzx + vec3(33.33)));
    return fract((p3.x + p3.y) * p3.z);
}

float slice_offset(float y, float seed) {
    float band = floor(y * 12.0);
    float r = hash11(band + seed * 57.0);
    float gate = step(0.7, r);
    return gate * sign(r - 0.5) * (0.002 + 0.02 * r);
}

vec3 sample_background(vec2 uv, float shift) {
    float r = textureLod(BG_IMAGE, uv + vec2(shift, 0.0), 0.0).r;
    float g = textureLod(BG_IMAGE, uv, 0.0).g;
    float b = textureLod(BG_IMAGE, uv - vec2(shift, 0.0), 0.0).b;
    return vec3(r, g, b);
}

vec3 sample_logo(vec2 uv, float shift) {
    float r = textureLod(LOGO_IMAGE, uv + vec2(shift, 0.0), 0.0).r;
    float g = textureLod(LOGO_IMAGE, uv, 0.0).g;
    float b = textureLod(LOGO_IMAGE, uv - vec2(shift, 0.0), 0.0).b;
    return vec3(r, g, b);
}

vec2 cover_uv(vec2 uv) {
    float screen_aspect = params.resolution.x / params.resolution.y;
    float image_aspect = params.bg_size.x / params.bg_size.y;
    vec2 fitted = uv;
    if (image_aspect > screen_aspect) {
        fitted.x = (uv.x - 0.5) * (screen_aspect / image_aspect) + 0.5;
    } else {
        fitted.y = (uv.y - 0.5) * (image_aspect / screen_aspect) + 0.5;
    }
    return fitted;
}

vec3 glitch_background(vec2 uv) {
    float t = params.time * 0.6;
    float effective = params.bg_intensity;
    if (params.bg_freeze_at >= 0.0 && params.time > params.bg_freeze_at) {
        t = params.bg_freeze_at * 0.6;
        effective = 0.0;
    }

    vec2 bg_uv = cover_uv(uv);
    float mouse_push = (params.mouse.x - 0.5) * 0.012;
    bg_uv.y += hash21(vec2(floor(t * 10.0), params.bg_seed)) * 0.002 * effective;

    float tear = slice_offset(bg_uv.y + t * 0.02, params.bg_seed) * effective;
    float micro = (hash21(vec2(bg_uv.y * 200.0 + t * 5.0, params.bg_seed)) - 0.5) * 0.004 * effective;
    bg_uv.x += tear + micro + mouse_push;

    float aberration = (3.0 + 30.0 * effective) / params.resolution.x;
    vec3 col = sample_background(bg_uv, aberration);

    float scan = 0.93 + 0.07 * sin((uv.y + t * 1.5) * params.resolution.y);
    float vignette = smoothstep(1.2, 0.3, length(uv - vec2(0.5)));
    col *= scan * mix(1.0, vignette, 0.15);

    float row_noise = hash21(vec2(floor(uv.y * params.resolution.y * 0.25), floor(t * 20.0) + params.bg_seed * 100.0));
    col *= mix(1.0, 0.65 + 0.35 * row_noise, 0.25 * effective);

    col *= params.tint.rgb;
    return mix(col, vec3(1.0) - col, params.flash * 0.5);
}

vec4 glitch_logo(vec2 uv) {
    vec2 lo = params.logo_center - params.logo_half;
    vec2 hi = params.logo_center + params.logo_half;
    vec2 inside = step(lo, uv) * step(uv, hi);
    float mask = inside.x * inside.y;
    vec2 luv = (uv - lo) / max(hi - lo, vec2(0.0001));

    float t = params.time * 0.9;
    float e = params.logo_intensity + params.logo_hover * 0.35;
    luv.y += hash21(vec2(floor(t * 12.0), params.logo_seed)) * 0.003 * e;

    float tear = slice_offset(luv.y + t * 0.03, params.logo_seed) * e;
    float micro = (hash21(vec2(luv.y * 240.0 + t * 6.0, params.logo_seed)) - 0.5) * 0.006 * e;

    float shatter = params.logo_hover * step(0.6, hash21(vec2(floor(t * 7.0), params.logo_seed)));
    float band = 0.15;
    luv.x = mix(luv.x, floor(luv.x / band) * band, shatter);
    vec2 shift = vec2(tear + micro, 0.0);

    // Tears displace colour only; the silhouette stays put.
    float aberration = (4.0 + 40.0 * e) / params.resolution.x;
    vec3 col = sample_logo(luv + shift, aberration);
    float alpha = textureLod(LOGO_IMAGE, luv, 0.0).a;
    float pulse = 0.97 + 0.07 * sin(t * 2.0 + params.logo_seed);
    return vec4(col * pulse, alpha * mask);
}

vec3 soft_light(vec3 base, vec3 blend) {
    vec3 curve = mix(sqrt(base), ((16.0 * base - vec3(12.0)) * base + vec3(4.0)) * base, step(base, vec3(0.25)));
    vec3 lighten = base + (2.0 * blend - vec3(1.0)) * (curve - base);
    vec3 darken = base - (vec3(1.0) - 2.0 * blend) * base * (vec3(1.0) - base);
    return mix(darken, lighten, step(vec3(0.5), blend));
}

vec3 apply_noise(vec3 col) {
    vec2 cell = floor(gl_FragCoord.xy);
    float lum = (200.0 + 55.0 * hash21(cell + vec2(params.noise_seed, 0.0))) / 255.0;
    float alpha = 35.0 * hash21(cell.yx + vec2(0.0, params.noise_seed * 1.7)) / 255.0;
    vec3 base = clamp(col, vec3(0.0), vec3(1.0));
    return mix(base, soft_light(base, vec3(lum)), params.noise_opacity * alpha);
}

void main() {
    vec3 background = glitch_background(v_uv);
    vec4 logo = glitch_logo(v_uv);
    vec3 color = mix(background, logo.rgb, logo.a);
    out_color = vec4(apply_noise(color), 1.0);
}
";

#[cfg(test)]
mod tests {
    use super::*;

    const UNIFORM_OFFSETS: [u32; 16] = [
        0, 8, 12, 16, 24, 28, 32, 40, 48, 52, 56, 60, 64, 72, 76, 80,
    ];

    #[test]
    fn vertex_stage_validates() {
        let module = validate_glsl(ShaderStage::Vertex, VERTEX_SHADER_GLSL).unwrap();
        assert_eq!(module.entry_points.len(), 1);
    }

    #[test]
    fn fragment_stage_validates() {
        let module = validate_glsl(ShaderStage::Fragment, FRAGMENT_SHADER_GLSL).unwrap();
        assert_eq!(module.entry_points.len(), 1);
        assert_eq!(module.entry_points[0].stage, ShaderStage::Fragment);
    }

    #[test]
    fn uniform_block_matches_host_layout() {
        let module = validate_glsl(ShaderStage::Fragment, FRAGMENT_SHADER_GLSL).unwrap();
        let (_, block) = module
            .global_variables
            .iter()
            .find(|(_, var)| {
                var.binding
                    == Some(naga::ResourceBinding {
                        group: 0,
                        binding: 0,
                    })
            })
            .expect("uniform block bound at set 0 binding 0");

        match &module.types[block.ty].inner {
            naga::TypeInner::Struct { members, span } => {
                let offsets: Vec<u32> = members.iter().map(|member| member.offset).collect();
                assert_eq!(offsets, UNIFORM_OFFSETS);
                assert_eq!(
                    *span as usize,
                    std::mem::size_of::<crate::gpu::GlitchUniforms>()
                );
            }
            other => panic!("uniform block is not a struct: {other:?}"),
        }
    }

    #[test]
    fn binds_both_textures_in_set_one() {
        let module = validate_glsl(ShaderStage::Fragment, FRAGMENT_SHADER_GLSL).unwrap();
        let mut bindings: Vec<u32> = module
            .global_variables
            .iter()
            .filter_map(|(_, var)| var.binding.as_ref())
            .filter(|binding| binding.group == 1)
            .map(|binding| binding.binding)
            .collect();
        bindings.sort_unstable();
        assert_eq!(bindings, vec![0, 1, 2, 3]);
    }

    #[test]
    fn logo_mask_ignores_tear_shift() {
        let body = FRAGMENT_SHADER_GLSL
            .split("vec4 glitch_logo(vec2 uv)")
            .nth(1)
            .and_then(|rest| rest.split("vec3 soft_light").next())
            .unwrap();
        assert!(body.contains("sample_logo(luv + shift, aberration)"));
        assert!(body.contains("textureLod(LOGO_IMAGE, luv, 0.0).a"));
        assert!(!body.contains("luv.x += tear"));
    }

    #[test]
    fn broken_source_reports_diagnostic() {
        let err = validate_glsl(
            ShaderStage::Fragment,
            "#version 450\nlayout(location = 0) out vec4 c;\nvoid main() { c = undefined_call(); }\n",
        )
        .unwrap_err();
        match err {
            ShaderError::Parse { stage, message } => {
                assert_eq!(stage, "fragment");
                assert!(!message.is_empty());
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
