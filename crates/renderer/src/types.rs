use std::fmt;
use std::path::{Path, PathBuf};

use scheduler::{FlashTiming, TintSchedule};

/// The two texture units the hero shader samples from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureSlot {
    Background,
    Logo,
}

impl TextureSlot {
    pub const ALL: [TextureSlot; 2] = [TextureSlot::Background, TextureSlot::Logo];

    pub(crate) fn index(self) -> usize {
        match self {
            TextureSlot::Background => 0,
            TextureSlot::Logo => 1,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TextureSlot::Background => "background",
            TextureSlot::Logo => "logo",
        }
    }
}

impl fmt::Display for TextureSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Viewport width class used to pick layout and asset variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Breakpoint {
    Mobile,
    Desktop,
}

impl Breakpoint {
    /// Widths strictly below `threshold` are mobile.
    pub fn classify(css_width: f32, threshold: f32) -> Self {
        if css_width < threshold {
            Breakpoint::Mobile
        } else {
            Breakpoint::Desktop
        }
    }
}

/// CSS-pixel widths separating the mobile and desktop variants.
///
/// The logo height and the background asset switch independently so a
/// tablet-sized viewport can use the desktop photograph with the taller
/// mobile logo.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BreakpointThresholds {
    pub logo: f32,
    pub asset: f32,
}

impl Default for BreakpointThresholds {
    fn default() -> Self {
        Self {
            logo: 768.0,
            asset: 560.0,
        }
    }
}

/// Where an image is fetched from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AssetSource {
    File(PathBuf),
    Url(String),
}

impl AssetSource {
    /// Interprets `raw` as a URL when it carries an http(s) scheme, otherwise
    /// as a path resolved against `root` when relative.
    pub fn parse(raw: &str, root: Option<&Path>) -> Self {
        let trimmed = raw.trim();
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            return AssetSource::Url(trimmed.to_string());
        }
        let path = PathBuf::from(trimmed);
        match root {
            Some(root) if path.is_relative() => AssetSource::File(root.join(path)),
            _ => AssetSource::File(path),
        }
    }
}

impl fmt::Display for AssetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetSource::File(path) => write!(f, "{}", path.display()),
            AssetSource::Url(url) => f.write_str(url),
        }
    }
}

/// Image locations for both slots; only the background varies by breakpoint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssetPaths {
    pub background_desktop: AssetSource,
    pub background_mobile: AssetSource,
    pub logo: AssetSource,
}

impl AssetPaths {
    pub fn background_for(&self, breakpoint: Breakpoint) -> &AssetSource {
        match breakpoint {
            Breakpoint::Mobile => &self.background_mobile,
            Breakpoint::Desktop => &self.background_desktop,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutTuning {
    pub padding: f32,
    pub logo_height_desktop: f32,
    pub logo_height_mobile: f32,
    pub max_pixel_ratio: f32,
}

impl LayoutTuning {
    pub fn logo_height(&self, breakpoint: Breakpoint) -> f32 {
        match breakpoint {
            Breakpoint::Mobile => self.logo_height_mobile,
            Breakpoint::Desktop => self.logo_height_desktop,
        }
    }
}

impl Default for LayoutTuning {
    fn default() -> Self {
        Self {
            padding: 0.9,
            logo_height_desktop: 0.35,
            logo_height_mobile: 0.45,
            max_pixel_ratio: 2.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlitchTuning {
    pub background_intensity: f32,
    pub logo_intensity: f32,
    /// Seconds after which the background stops animating.
    pub freeze_after: Option<f32>,
    pub noise_opacity: f32,
}

impl Default for GlitchTuning {
    fn default() -> Self {
        Self {
            background_intensity: 0.6,
            logo_intensity: 0.6,
            freeze_after: None,
            noise_opacity: 0.08,
        }
    }
}

/// GPU power preference passed to adapter selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum GpuPowerPreference {
    Low,
    #[default]
    High,
}

/// Immutable configuration handed to the engine at start-up.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    pub assets: AssetPaths,
    pub thresholds: BreakpointThresholds,
    pub layout: LayoutTuning,
    pub glitch: GlitchTuning,
    /// `None` disables flash events entirely.
    pub flash: Option<FlashTiming>,
    pub tint: TintSchedule,
    pub title: String,
    pub surface_size: (u32, u32),
    pub gpu_power: GpuPowerPreference,
    /// Pins shader time for reproducible frames.
    pub fixed_time: Option<f32>,
    /// Seeds the flash schedule and noise overlay; entropy when absent.
    pub random_seed: Option<u64>,
}

impl EngineConfig {
    pub fn new(assets: AssetPaths) -> Self {
        Self {
            assets,
            thresholds: BreakpointThresholds::default(),
            layout: LayoutTuning::default(),
            glitch: GlitchTuning::default(),
            flash: Some(FlashTiming::default()),
            tint: TintSchedule::default(),
            title: "glitchhero".into(),
            surface_size: (1920, 1080),
            gpu_power: GpuPowerPreference::default(),
            fixed_time: None,
            random_seed: None,
        }
    }
}

/// Reason the engine stopped short of rendering.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("GPU context unavailable: {0}")]
    GpuUnavailable(String),
    #[error("shader program failed to build: {0}")]
    Shader(String),
    #[error("failed to load {slot} image from {location}: {reason}")]
    AssetLoad {
        slot: TextureSlot,
        location: String,
        reason: String,
    },
    #[error("rendering surface failed: {0}")]
    Surface(String),
}

/// Lifecycle status readable by the hosting shell.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum HeroStatus {
    #[default]
    Loading,
    Running,
    Error(EngineError),
}

impl HeroStatus {
    pub fn is_error(&self) -> bool {
        matches!(self, HeroStatus::Error(_))
    }
}

impl fmt::Display for HeroStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeroStatus::Loading => f.write_str("loading"),
            HeroStatus::Running => f.write_str("running"),
            HeroStatus::Error(err) => write!(f, "error: {err}"),
        }
    }
}
