use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use heroconfig::{HeroConfig, PowerSetting, Preset};
use renderer::{
    AssetPaths, AssetSource, BreakpointThresholds, EngineConfig, GlitchTuning, GpuPowerPreference,
    LayoutTuning,
};
use scheduler::{FlashTiming, TintSchedule};

use crate::cli::RunArgs;
use crate::paths::AppPaths;

/// Configuration after presets, the config file and CLI flags are merged.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub config: HeroConfig,
    /// File the configuration came from, if any.
    pub source: Option<PathBuf>,
    /// Root for relative asset paths.
    pub asset_root: PathBuf,
}

pub fn resolve_config(args: &RunArgs, paths: &AppPaths) -> Result<ResolvedConfig> {
    let (mut config, source) = match args.config.as_ref() {
        Some(path) => (read_config(path)?, Some(path.clone())),
        None => {
            let default_path = paths.config_file();
            if default_path.is_file() {
                (read_config(&default_path)?, Some(default_path))
            } else {
                (HeroConfig::preset(args.preset.unwrap_or(Preset::Responsive)), None)
            }
        }
    };
    if let (Some(path), Some(preset)) = (source.as_ref(), args.preset) {
        tracing::warn!(
            path = %path.display(),
            ?preset,
            "--preset ignored because a configuration file was loaded"
        );
    }

    apply_overrides(&mut config, args)?;
    config
        .validate()
        .context("configuration rejected after applying command-line overrides")?;

    let asset_root = match (&args.assets, &source) {
        (Some(dir), _) => dir.clone(),
        (None, Some(file)) => file
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
        (None, None) => PathBuf::from("."),
    };

    Ok(ResolvedConfig {
        config,
        source,
        asset_root,
    })
}

fn read_config(path: &Path) -> Result<HeroConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read configuration {}", path.display()))?;
    HeroConfig::from_toml_str(&raw)
        .with_context(|| format!("invalid configuration in {}", path.display()))
}

fn apply_overrides(config: &mut HeroConfig, args: &RunArgs) -> Result<()> {
    if let Some(background) = &args.background {
        config.assets.background = background.clone();
    }
    if let Some(background_mobile) = &args.background_mobile {
        config.assets.background_mobile = background_mobile.clone();
    }
    if let Some(logo) = &args.logo {
        config.assets.logo = logo.clone();
    }
    if let Some(size) = &args.size {
        let (width, height) = parse_surface_size(size)?;
        config.window.width = width;
        config.window.height = height;
    }
    if let Some(power) = args.power {
        config.window.power = power;
    }
    Ok(())
}

/// Maps the file-level schema onto what the renderer consumes.
pub fn engine_config(
    resolved: &ResolvedConfig,
    fixed_time: Option<f32>,
) -> Result<EngineConfig> {
    let config = &resolved.config;
    let root = Some(resolved.asset_root.as_path());
    let assets = AssetPaths {
        background_desktop: AssetSource::parse(&config.assets.background, root),
        background_mobile: AssetSource::parse(&config.assets.background_mobile, root),
        logo: AssetSource::parse(&config.assets.logo, root),
    };

    let flash = if config.flash.enabled {
        Some(FlashTiming::try_from(&config.flash).context("invalid flash timing")?)
    } else {
        None
    };

    let mut engine = EngineConfig::new(assets);
    engine.thresholds = BreakpointThresholds {
        logo: config.layout.logo_breakpoint as f32,
        asset: config.layout.asset_breakpoint as f32,
    };
    engine.layout = LayoutTuning {
        padding: config.layout.padding as f32,
        logo_height_desktop: config.layout.logo_height as f32,
        logo_height_mobile: config.layout.logo_height_mobile as f32,
        max_pixel_ratio: config.layout.max_pixel_ratio as f32,
    };
    engine.glitch = GlitchTuning {
        background_intensity: config.glitch.background_intensity as f32,
        logo_intensity: config.glitch.logo_intensity as f32,
        freeze_after: config.glitch.freeze_after.map(|after| after.as_secs_f32()),
        noise_opacity: config.glitch.noise_opacity as f32,
    };
    engine.flash = flash;
    engine.tint = TintSchedule::from(&config.tint);
    engine.title = config.window.title.clone();
    engine.surface_size = (config.window.width, config.window.height);
    engine.gpu_power = match config.window.power {
        PowerSetting::Low => GpuPowerPreference::Low,
        PowerSetting::High => GpuPowerPreference::High,
    };
    engine.fixed_time = fixed_time;
    // Pinned time is only reproducible if flashes and grain are too.
    engine.random_seed = fixed_time.map(|_| 0);
    Ok(engine)
}

pub fn parse_surface_size(spec: &str) -> Result<(u32, u32)> {
    let trimmed = spec.trim();
    let (width, height) = trimmed
        .split_once(['x', 'X', '×'])
        .ok_or_else(|| anyhow::anyhow!("expected WxH format, e.g. 1920x1080"))?;

    let width: u32 = width
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid width in size specification"))?;
    let height: u32 = height
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid height in size specification"))?;

    if width == 0 || height == 0 {
        anyhow::bail!("surface dimensions must be greater than zero");
    }

    Ok((width, height))
}
