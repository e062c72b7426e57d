use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use heroconfig::{PowerSetting, Preset};

#[derive(Parser, Debug)]
#[command(
    name = "glitchhero",
    author,
    version,
    about = "Full-screen glitch hero banner",
    arg_required_else_help = false
)]
pub struct Cli {
    #[command(flatten)]
    pub run: RunArgs,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Parser, Debug, Default)]
pub struct RunArgs {
    /// Configuration file; defaults to `glitchhero.toml` in the config directory.
    #[arg(long, value_name = "FILE", env = "GLITCHHERO_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Built-in preset used when no configuration file is found.
    #[arg(long, value_name = "PRESET", value_parser = parse_preset, global = true)]
    pub preset: Option<Preset>,

    /// Directory that relative asset paths are resolved against.
    #[arg(long, value_name = "DIR", global = true)]
    pub assets: Option<PathBuf>,

    /// Desktop background image (path or http(s) URL).
    #[arg(long, value_name = "SOURCE", global = true)]
    pub background: Option<String>,

    /// Background image used below the asset breakpoint.
    #[arg(long, value_name = "SOURCE", global = true)]
    pub background_mobile: Option<String>,

    /// Logo image; transparent areas stay transparent.
    #[arg(long, value_name = "SOURCE", global = true)]
    pub logo: Option<String>,

    /// Override the window size (e.g. `1280x720`).
    #[arg(long, value_name = "WIDTHxHEIGHT")]
    pub size: Option<String>,

    /// Pin shader time to a fixed number of seconds for reproducible frames.
    #[arg(long, value_name = "SECONDS", value_parser = parse_fixed_time)]
    pub fixed_time: Option<f32>,

    /// Draw new seeds before starting.
    #[arg(long, value_name = "WHICH", value_enum)]
    pub reseed: Option<ReseedTarget>,

    /// Keep seeds in memory only; the session file is neither read nor written.
    #[arg(long)]
    pub ephemeral: bool,

    /// GPU power preference: `low` or `high`.
    #[arg(long, value_name = "POWER", value_parser = parse_power, global = true)]
    pub power: Option<PowerSetting>,

    /// Skip the boot banner even on the first run of a session.
    #[arg(long)]
    pub no_intro: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReseedTarget {
    Background,
    Logo,
    All,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Inspect the resolved configuration.
    Config(ConfigCommand),
    /// Inspect or clear the persisted session (seeds and banner flag).
    Session(SessionCommand),
}

#[derive(Parser, Debug)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the configuration after presets, files and flags are applied.
    Show {
        /// Emit JSON instead of TOML.
        #[arg(long)]
        json: bool,
    },
}

#[derive(Parser, Debug)]
pub struct SessionCommand {
    #[command(subcommand)]
    pub action: SessionAction,
}

#[derive(Subcommand, Debug)]
pub enum SessionAction {
    /// Print the stored seeds and whether the banner was shown.
    Show,
    /// Delete the session file so the next run draws fresh seeds.
    Reset,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_preset(value: &str) -> Result<Preset, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("preset must not be empty".to_string());
    }
    trimmed.parse().map_err(|err: heroconfig::ConfigError| err.to_string())
}

/// Largest value accepted by `--fixed-time`; beyond this f32 time loses
/// sub-frame precision in the shader.
pub const MAX_FIXED_TIME: f32 = 1_000_000.0;

pub fn parse_fixed_time(value: &str) -> Result<f32, String> {
    let seconds: f32 = value
        .trim()
        .parse()
        .map_err(|_| format!("'{value}' is not a number of seconds"))?;
    if !seconds.is_finite() || !(0.0..=MAX_FIXED_TIME).contains(&seconds) {
        return Err(format!(
            "fixed time must be between 0 and {MAX_FIXED_TIME} seconds, got {value}"
        ));
    }
    Ok(seconds)
}

pub fn parse_power(value: &str) -> Result<PowerSetting, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "low" | "low-power" | "integrated" => Ok(PowerSetting::Low),
        "high" | "high-performance" | "discrete" => Ok(PowerSetting::High),
        other => Err(format!("unknown power preference '{other}'; expected low or high")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_presets_case_insensitively() {
        assert_eq!(parse_preset("Classic"), Ok(Preset::Classic));
        assert_eq!(parse_preset(" responsive "), Ok(Preset::Responsive));
        assert!(parse_preset("").is_err());
        assert!(parse_preset("loud").is_err());
    }

    #[test]
    fn parses_power_aliases() {
        assert_eq!(parse_power("LOW"), Ok(PowerSetting::Low));
        assert_eq!(parse_power("discrete"), Ok(PowerSetting::High));
        assert!(parse_power("medium").is_err());
    }

    #[test]
    fn fixed_time_must_be_finite_and_bounded() {
        assert_eq!(parse_fixed_time("2.5"), Ok(2.5));
        assert_eq!(parse_fixed_time(" 0 "), Ok(0.0));
        for bad in ["inf", "NaN", "-1", "1e20", "soon"] {
            assert!(parse_fixed_time(bad).is_err(), "{bad} should be rejected");
        }
        assert!(Cli::try_parse_from(["glitchhero", "--fixed-time", "inf"]).is_err());
        let cli = Cli::try_parse_from(["glitchhero", "--fixed-time", "12"]).unwrap();
        assert_eq!(cli.run.fixed_time, Some(12.0));
    }

    #[test]
    fn subcommands_accept_shared_flags() {
        let cli = Cli::try_parse_from([
            "glitchhero",
            "config",
            "show",
            "--json",
            "--preset",
            "classic",
        ])
        .unwrap();
        assert_eq!(cli.run.preset, Some(Preset::Classic));
        match cli.command {
            Some(Command::Config(ConfigCommand {
                action: ConfigAction::Show { json },
            })) => assert!(json),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn reseed_accepts_all() {
        let cli = Cli::try_parse_from(["glitchhero", "--reseed", "all", "--no-intro"]).unwrap();
        assert_eq!(cli.run.reseed, Some(ReseedTarget::All));
        assert!(cli.run.no_intro);
        assert!(cli.command.is_none());
    }
}
