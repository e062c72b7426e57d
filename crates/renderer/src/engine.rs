use std::sync::Arc;

use image::RgbaImage;
use tracing::{error, info, warn};
use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::animation::{AnimationDriver, FrameInputs};
use crate::assets::{AssetLoader, LoadEvent};
use crate::gpu::GpuState;
use crate::interaction::{HostRect, InteractionTracker};
use crate::layout::{LogoLayout, LogoLayoutSolver};
use crate::seeds::{SeedKey, SeedPair, SeedStore};
use crate::types::{EngineConfig, EngineError, HeroStatus, TextureSlot};
use crate::viewport::{HostMeasurement, ViewportManager, ViewportState, ViewportUpdate};

/// What a call to [`HeroEngine::frame`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Still waiting for the initial textures.
    Waiting,
    Rendered,
    /// The surface was briefly unavailable; try again next frame.
    Skipped,
    /// Not started, torn down, or failed.
    Stopped,
}

/// Everything that lives between `start` and `teardown`.
struct RendererContext {
    gpu: GpuState,
    loader: AssetLoader,
    viewport: ViewportManager,
    solver: LogoLayoutSolver,
    layout: LogoLayout,
    tracker: InteractionTracker,
    animation: AnimationDriver,
    seeds: SeedPair,
}

/// The hero banner core driven by a host shell.
///
/// All state is owned here and mutated from the thread that calls into it.
/// Image decoding happens on worker threads but textures are only uploaded
/// from [`HeroEngine::frame`].
pub struct HeroEngine {
    config: EngineConfig,
    seeds: SeedStore,
    status: HeroStatus,
    context: Option<RendererContext>,
}

impl HeroEngine {
    pub fn new(config: EngineConfig, seeds: SeedStore) -> Self {
        Self {
            config,
            seeds,
            status: HeroStatus::Loading,
            context: None,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn status(&self) -> &HeroStatus {
        &self.status
    }

    pub fn is_started(&self) -> bool {
        self.context.is_some()
    }

    /// Creates the GPU context and begins loading both images. Calling it
    /// again while started is a no-op.
    pub fn start(&mut self, window: Arc<Window>, host: HostMeasurement) -> &HeroStatus {
        if self.context.is_some() {
            return &self.status;
        }

        let mut viewport =
            ViewportManager::new(self.config.thresholds, self.config.layout.max_pixel_ratio);
        let state = viewport.update(host, |_, _| {}).state;

        let gpu = match GpuState::new(
            window,
            PhysicalSize::new(state.pixel_width, state.pixel_height),
            self.config.gpu_power,
        ) {
            Ok(gpu) => gpu,
            Err(err) => {
                error!(error = %err, "hero engine failed to start");
                self.status = HeroStatus::Error(err);
                return &self.status;
            }
        };

        let seeds = self.seeds.pair();
        let mut loader = AssetLoader::new(self.config.assets.clone());
        loader.load_for_breakpoint(state.breakpoint);
        loader.load_logo();

        info!(
            width = state.pixel_width,
            height = state.pixel_height,
            breakpoint = ?state.breakpoint,
            background_seed = seeds.background,
            logo_seed = seeds.logo,
            "hero engine started"
        );

        self.context = Some(RendererContext {
            gpu,
            loader,
            viewport,
            solver: LogoLayoutSolver::new(self.config.layout.padding),
            layout: LogoLayout::empty(),
            tracker: InteractionTracker::new(),
            animation: AnimationDriver::from_config(&self.config),
            seeds,
        });
        self.status = HeroStatus::Loading;
        &self.status
    }

    /// Advances one frame: applies resizes and finished loads, then draws.
    pub fn frame(&mut self, host: HostMeasurement) -> FrameOutcome {
        if self.status.is_error() {
            return FrameOutcome::Stopped;
        }
        let Some(ctx) = self.context.as_mut() else {
            return FrameOutcome::Stopped;
        };

        let update = track_viewport(&mut ctx.viewport, &mut ctx.loader, host);
        if update.resized {
            ctx.gpu.resize(PhysicalSize::new(
                update.state.pixel_width,
                update.state.pixel_height,
            ));
        }

        for event in ctx.loader.poll() {
            if let Err(err) = apply_load_event(&mut ctx.gpu, &self.status, event) {
                error!(error = %err, "initial image load failed");
                self.status = HeroStatus::Error(err);
                return FrameOutcome::Stopped;
            }
        }

        if self.status == HeroStatus::Loading {
            if !ctx.gpu.textures_ready() {
                return FrameOutcome::Waiting;
            }
            ctx.animation.restart();
            self.status = HeroStatus::Running;
            info!("hero engine running");
        }

        ctx.layout = solve_layout(&self.config, &ctx.solver, &ctx.gpu, &update.state);
        let inputs = FrameInputs {
            viewport: update.state,
            layout: ctx.layout,
            background_size: ctx
                .gpu
                .texture_size(TextureSlot::Background)
                .unwrap_or((1, 1)),
            seeds: ctx.seeds,
            pointer: ctx.tracker.position(),
            hover_factor: ctx.tracker.hover_factor(),
        };
        let uniforms = ctx.animation.tick(&inputs);

        match ctx.gpu.render(&uniforms) {
            Ok(()) => FrameOutcome::Rendered,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                ctx.gpu.reconfigure();
                FrameOutcome::Skipped
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                let err = EngineError::Surface("out of memory".into());
                error!(error = %err, "stopping render loop");
                self.status = HeroStatus::Error(err);
                FrameOutcome::Stopped
            }
            Err(err) => {
                warn!(error = %err, "skipping frame");
                FrameOutcome::Skipped
            }
        }
    }

    /// Feeds a pointer position in host client coordinates. Returns the
    /// normalized position, or `None` before `start`.
    pub fn pointer_moved(&mut self, client: [f64; 2], host: HostRect) -> Option<[f32; 2]> {
        let ctx = self.context.as_mut()?;
        Some(ctx.tracker.on_pointer_move(client, host, &ctx.layout))
    }

    /// Feeds the active touch points; only the first one is tracked.
    pub fn touch_moved(&mut self, touches: &[[f64; 2]], host: HostRect) -> Option<[f32; 2]> {
        let ctx = self.context.as_mut()?;
        Some(ctx.tracker.on_touch_move(touches, host, &ctx.layout))
    }

    pub fn is_hovering(&self) -> bool {
        self.context
            .as_ref()
            .is_some_and(|ctx| ctx.tracker.is_hovering())
    }

    pub fn reseed_background(&mut self) -> u32 {
        self.reseed(SeedKey::Background)
    }

    pub fn reseed_logo(&mut self) -> u32 {
        self.reseed(SeedKey::Logo)
    }

    /// Current seeds, drawing and persisting any that are missing.
    pub fn seeds(&mut self) -> SeedPair {
        match self.context.as_ref() {
            Some(ctx) => ctx.seeds,
            None => self.seeds.pair(),
        }
    }

    /// Stops rendering and releases GPU resources. Loads still in flight
    /// finish into a dropped channel and are discarded.
    pub fn teardown(&mut self) {
        let Some(ctx) = self.context.take() else {
            return;
        };
        let RendererContext { gpu, loader, .. } = ctx;
        drop(loader);
        gpu.destroy();
        info!(status = %self.status, "hero engine torn down");
    }

    fn reseed(&mut self, key: SeedKey) -> u32 {
        let value = self.seeds.reseed(key);
        if let Some(ctx) = self.context.as_mut() {
            match key {
                SeedKey::Background => ctx.seeds.background = value,
                SeedKey::Logo => ctx.seeds.logo = value,
            }
        }
        info!(key = key.storage_key(), value, "reseeded");
        value
    }
}

impl Drop for HeroEngine {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Destination for decoded images; the GPU state in production.
trait TextureSink {
    fn install(&mut self, slot: TextureSlot, image: &RgbaImage) -> anyhow::Result<()>;
    fn has_texture(&self, slot: TextureSlot) -> bool;
}

impl TextureSink for GpuState {
    fn install(&mut self, slot: TextureSlot, image: &RgbaImage) -> anyhow::Result<()> {
        self.install_texture(slot, image)
    }

    fn has_texture(&self, slot: TextureSlot) -> bool {
        self.texture_size(slot).is_some()
    }
}

/// Feeds a measurement to the viewport and starts exactly one background
/// reload when the asset breakpoint flips.
fn track_viewport(
    viewport: &mut ViewportManager,
    loader: &mut AssetLoader,
    host: HostMeasurement,
) -> ViewportUpdate {
    let mut crossed = None;
    let update = viewport.update(host, |old, new| crossed = Some((old, new)));
    if let Some((old, new)) = crossed {
        info!(from = ?old, to = ?new, "breakpoint changed; reloading background");
        loader.load_for_breakpoint(new);
    }
    update
}

/// Installs a finished load. Failures before the first `Running` frame are
/// fatal; later ones keep the texture that is already bound.
fn apply_load_event(
    sink: &mut impl TextureSink,
    status: &HeroStatus,
    event: LoadEvent,
) -> Result<(), EngineError> {
    let (slot, location, reason) = match event {
        LoadEvent::Loaded {
            slot,
            source,
            image,
        } => match sink.install(slot, &image) {
            Ok(()) => {
                info!(%slot, %source, width = image.width(), height = image.height(), "texture installed");
                return Ok(());
            }
            Err(err) => (slot, source.to_string(), format!("{err:#}")),
        },
        LoadEvent::Failed {
            slot,
            source,
            reason,
        } => (slot, source.to_string(), reason),
    };

    if *status == HeroStatus::Running || sink.has_texture(slot) {
        warn!(%slot, location = %location, reason = %reason, "reload failed; keeping current texture");
        return Ok(());
    }
    Err(EngineError::AssetLoad {
        slot,
        location,
        reason,
    })
}

fn solve_layout(
    config: &EngineConfig,
    solver: &LogoLayoutSolver,
    gpu: &GpuState,
    viewport: &ViewportState,
) -> LogoLayout {
    let Some(logo_aspect) = gpu.texture_aspect(TextureSlot::Logo) else {
        return LogoLayout::empty();
    };
    let desired = config.layout.logo_height(viewport.layout_breakpoint);
    solver.solve(logo_aspect, viewport.aspect(), desired)
}
