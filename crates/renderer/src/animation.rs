use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use scheduler::{FlashScheduler, TintSchedule};

use crate::layout::LogoLayout;
use crate::runtime::{time_source_for, TimeSource};
use crate::seeds::SeedPair;
use crate::types::{EngineConfig, GlitchTuning};
use crate::viewport::ViewportState;

/// Values that persist from one frame to the next.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnimationState {
    pub elapsed_seconds: f32,
    pub flash_intensity: f32,
    pub tint: [f32; 3],
    pub hover_factor: f32,
}

impl Default for AnimationState {
    fn default() -> Self {
        Self {
            elapsed_seconds: 0.0,
            flash_intensity: 0.0,
            tint: [1.0; 3],
            hover_factor: 0.0,
        }
    }
}

/// Everything the driver needs from the rest of the engine for one frame.
#[derive(Clone, Copy, Debug)]
pub struct FrameInputs {
    pub viewport: ViewportState,
    pub layout: LogoLayout,
    pub background_size: (u32, u32),
    pub seeds: SeedPair,
    pub pointer: [f32; 2],
    pub hover_factor: f32,
}

/// Per-frame snapshot handed to the shader pipeline.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderUniforms {
    pub resolution: [f32; 2],
    pub time: f32,
    pub flash: f32,
    pub background_size: [f32; 2],
    pub background_seed: f32,
    pub background_intensity: f32,
    pub logo_center: [f32; 2],
    pub logo_half_extents: [f32; 2],
    pub logo_seed: f32,
    pub logo_intensity: f32,
    pub logo_hover: f32,
    pub background_freeze_at: Option<f32>,
    pub pointer: [f32; 2],
    pub noise_seed: f32,
    pub noise_opacity: f32,
    pub tint: [f32; 3],
}

/// Advances time, flash and tint once per frame and assembles uniforms.
pub struct AnimationDriver {
    clock: Box<dyn TimeSource>,
    flash: FlashScheduler,
    tint: TintSchedule,
    glitch: GlitchTuning,
    noise: StdRng,
    state: AnimationState,
}

impl AnimationDriver {
    pub fn new(
        clock: Box<dyn TimeSource>,
        flash: FlashScheduler,
        tint: TintSchedule,
        glitch: GlitchTuning,
        noise_seed: u64,
    ) -> Self {
        Self {
            clock,
            flash,
            tint,
            glitch,
            noise: StdRng::seed_from_u64(noise_seed),
            state: AnimationState::default(),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        let seed = config.random_seed.unwrap_or_else(rand::random);
        let flash = match config.flash {
            Some(timing) => FlashScheduler::new(timing, seed),
            None => FlashScheduler::disabled(),
        };
        Self::new(
            time_source_for(config.fixed_time),
            flash,
            config.tint,
            config.glitch,
            seed.rotate_left(17),
        )
    }

    pub fn state(&self) -> &AnimationState {
        &self.state
    }

    pub fn tick(&mut self, inputs: &FrameInputs) -> RenderUniforms {
        let sample = self.clock.sample();
        let elapsed = Duration::try_from_secs_f32(sample.seconds.max(0.0)).unwrap_or(Duration::MAX);
        self.state = AnimationState {
            elapsed_seconds: sample.seconds,
            flash_intensity: self.flash.tick(elapsed),
            tint: self.tint.tint_at(sample.local_hour),
            hover_factor: inputs.hover_factor,
        };

        let (bg_width, bg_height) = inputs.background_size;
        RenderUniforms {
            resolution: inputs.viewport.resolution(),
            time: self.state.elapsed_seconds,
            flash: self.state.flash_intensity,
            background_size: [bg_width.max(1) as f32, bg_height.max(1) as f32],
            background_seed: inputs.seeds.background as f32,
            background_intensity: self.glitch.background_intensity,
            logo_center: inputs.layout.center,
            logo_half_extents: inputs.layout.half_extents(),
            logo_seed: inputs.seeds.logo as f32,
            logo_intensity: self.glitch.logo_intensity,
            logo_hover: self.state.hover_factor,
            background_freeze_at: self.glitch.freeze_after,
            pointer: inputs.pointer,
            noise_seed: self.noise.gen_range(0.0..1000.0),
            noise_opacity: self.glitch.noise_opacity,
            tint: self.state.tint,
        }
    }

    /// Restarts elapsed time and re-arms the flash warm-up.
    pub fn restart(&mut self) {
        self.clock.reset();
        self.flash.restart(Duration::ZERO);
        self.state = AnimationState::default();
    }
}
