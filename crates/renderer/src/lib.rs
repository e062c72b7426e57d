//! Renderer crate for glitchhero, a glitch-distorted hero banner.
//!
//! One fragment shader composites a glitched background photo with a glitched
//! logo. Everything the shader needs is assembled on the CPU once per frame:
//!
//! ```text
//!   glitchhero (CLI)
//!          │ EngineConfig + SeedStore
//!          ▼
//!   Renderer::run ──▶ winit window ──▶ HeroEngine::frame()
//!                                            │
//!        ViewportManager ─ breakpoint ─▶ AssetLoader ─▶ GpuState::install_texture
//!        LogoLayoutSolver ─ LogoLayout ─▶ InteractionTracker (hit test)
//!        AnimationDriver ─ RenderUniforms ─▶ GpuState::render ─▶ GPU UBO
//! ```
//!
//! [`HeroEngine`] owns all per-session state and exposes the control surface
//! (`start`, `frame`, `reseed_*`, `status`, `teardown`). [`Renderer`] is the
//! thin entry point that hosts the engine in a desktop window.

mod animation;
mod assets;
pub mod compile;
mod engine;
pub mod glitch;
mod gpu;
mod interaction;
mod layout;
mod runtime;
mod seeds;
mod types;
mod viewport;
mod window;

use anyhow::Result;

pub use animation::{AnimationDriver, AnimationState, FrameInputs, RenderUniforms};
pub use assets::{decode_image, AssetLoader, DefaultFetcher, ImageFetcher, LoadEvent, LoadState};
pub use compile::ShaderError;
pub use engine::{FrameOutcome, HeroEngine};
pub use interaction::{HostRect, InteractionTracker};
pub use layout::{LogoLayout, LogoLayoutSolver};
pub use runtime::{FixedTimeSource, SystemTimeSource, TimeSample, TimeSource};
pub use seeds::{MemoryBackend, SeedBackend, SeedKey, SeedPair, SeedStore, SEED_RANGE};
pub use types::{
    AssetPaths, AssetSource, Breakpoint, BreakpointThresholds, EngineConfig, EngineError,
    GlitchTuning, GpuPowerPreference, HeroStatus, LayoutTuning, TextureSlot,
};
pub use viewport::{HostMeasurement, ViewportManager, ViewportState, ViewportUpdate};

/// High-level entry point that owns the chosen configuration.
pub struct Renderer {
    engine: Option<HeroEngine>,
}

impl Renderer {
    pub fn new(config: EngineConfig, seeds: SeedStore) -> Self {
        Self {
            engine: Some(HeroEngine::new(config, seeds)),
        }
    }

    /// Opens the window and blocks until it closes.
    ///
    /// Engine failures (no GPU, shader errors, missing images) are not errors
    /// here: they come back as [`HeroStatus::Error`] so the caller can fall
    /// back to something static. `Err` means the window itself could not be
    /// created, or `run` was called twice.
    pub fn run(&mut self) -> Result<HeroStatus> {
        let engine = self
            .engine
            .take()
            .ok_or_else(|| anyhow::anyhow!("renderer already ran"))?;
        window::run_window(engine)
    }
}
