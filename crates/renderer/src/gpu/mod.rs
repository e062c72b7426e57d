//! GPU side of the hero banner.
//!
//! - `context` owns the wgpu instance, device and surface and reconfigures the
//!   swapchain on resize.
//! - `pipeline` builds the single glitch program and its two bind group
//!   layouts (uniforms in set 0, background and logo in set 1).
//! - `textures` uploads decoded images with clamped, linearly filtered
//!   samplers.
//! - `uniforms` is the std140 block written once per frame.
//! - `state` glues everything together behind `GpuState`.

mod context;
mod pipeline;
mod state;
mod textures;
mod uniforms;

pub(crate) use state::GpuState;
#[cfg(test)]
pub(crate) use uniforms::GlitchUniforms;
