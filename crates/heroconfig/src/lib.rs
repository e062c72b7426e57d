use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// Longest duration accepted for any timing field.
pub const MAX_DURATION: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Built-in starting points for a hero configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    /// Crop-to-cover background with separate logo and asset breakpoints.
    Responsive,
    /// Calmer distortion that freezes the background after two seconds.
    Classic,
}

impl FromStr for Preset {
    type Err = ConfigError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "responsive" | "default" => Ok(Self::Responsive),
            "classic" => Ok(Self::Classic),
            other => Err(ConfigError::Invalid(format!(
                "unknown preset '{other}'; expected 'responsive' or 'classic'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerSetting {
    Low,
    High,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct HeroConfig {
    pub version: u32,
    pub assets: AssetSettings,
    pub layout: LayoutSettings,
    pub glitch: GlitchSettings,
    pub flash: FlashSettings,
    pub tint: TintSettings,
    pub window: WindowSettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AssetSettings {
    pub background: String,
    pub background_mobile: String,
    pub logo: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LayoutSettings {
    /// Fraction of either screen axis the logo may occupy.
    pub padding: f64,
    pub logo_height: f64,
    pub logo_height_mobile: f64,
    /// CSS width below which the mobile logo height applies.
    pub logo_breakpoint: f64,
    /// CSS width below which the mobile background is loaded.
    pub asset_breakpoint: f64,
    pub max_pixel_ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GlitchSettings {
    pub background_intensity: f64,
    pub logo_intensity: f64,
    #[serde(
        deserialize_with = "deserialize_duration_opt",
        serialize_with = "serialize_duration_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub freeze_after: Option<Duration>,
    pub noise_opacity: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct FlashSettings {
    pub enabled: bool,
    #[serde(
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub warmup_min: Duration,
    #[serde(
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub warmup_max: Duration,
    #[serde(
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub interval_min: Duration,
    #[serde(
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub interval_max: Duration,
    pub decay: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TintSettings {
    pub day: [f64; 3],
    pub night: [f64; 3],
    /// First local hour (inclusive) that uses the day tint.
    pub day_start_hour: u32,
    /// Last local hour (inclusive) that uses the day tint.
    pub day_end_hour: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct WindowSettings {
    pub width: u32,
    pub height: u32,
    pub title: String,
    pub power: PowerSetting,
}

impl Default for HeroConfig {
    fn default() -> Self {
        Self::preset(Preset::Responsive)
    }
}

impl Default for AssetSettings {
    fn default() -> Self {
        Self {
            background: "hero.jpg".into(),
            background_mobile: "hero-mobile.jpg".into(),
            logo: "logo.png".into(),
        }
    }
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            padding: 0.9,
            logo_height: 0.35,
            logo_height_mobile: 0.45,
            logo_breakpoint: 768.0,
            asset_breakpoint: 560.0,
            max_pixel_ratio: 2.0,
        }
    }
}

impl Default for GlitchSettings {
    fn default() -> Self {
        Self {
            background_intensity: 0.6,
            logo_intensity: 0.6,
            freeze_after: None,
            noise_opacity: 0.08,
        }
    }
}

impl Default for FlashSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            warmup_min: Duration::from_millis(800),
            warmup_max: Duration::from_millis(6_800),
            interval_min: Duration::from_millis(300),
            interval_max: Duration::from_secs(10),
            decay: 0.90,
        }
    }
}

impl Default for TintSettings {
    fn default() -> Self {
        Self {
            day: [1.06, 1.0, 0.92],
            night: [0.9, 0.98, 1.12],
            day_start_hour: 7,
            day_end_hour: 18,
        }
    }
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            title: "glitchhero".into(),
            power: PowerSetting::High,
        }
    }
}

impl HeroConfig {
    pub fn preset(preset: Preset) -> Self {
        let base = Self {
            version: 1,
            assets: AssetSettings::default(),
            layout: LayoutSettings::default(),
            glitch: GlitchSettings::default(),
            flash: FlashSettings::default(),
            tint: TintSettings::default(),
            window: WindowSettings::default(),
        };
        match preset {
            Preset::Responsive => base,
            Preset::Classic => Self {
                assets: AssetSettings {
                    background_mobile: base.assets.background.clone(),
                    ..base.assets
                },
                layout: LayoutSettings {
                    asset_breakpoint: 768.0,
                    ..base.layout
                },
                glitch: GlitchSettings {
                    background_intensity: 0.36,
                    logo_intensity: 0.55,
                    freeze_after: Some(Duration::from_secs(2)),
                    ..base.glitch
                },
                ..base
            },
        }
    }

    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: HeroConfig = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != 1 {
            return Err(ConfigError::Invalid(format!(
                "unsupported config version {}; expected 1",
                self.version
            )));
        }

        for (name, value) in [
            ("assets.background", &self.assets.background),
            ("assets.background_mobile", &self.assets.background_mobile),
            ("assets.logo", &self.assets.logo),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("{name} may not be empty")));
            }
        }

        let layout = &self.layout;
        if !(layout.padding > 0.0 && layout.padding <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "layout.padding must be within (0, 1], got {}",
                layout.padding
            )));
        }
        for (name, value) in [
            ("layout.logo_height", layout.logo_height),
            ("layout.logo_height_mobile", layout.logo_height_mobile),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be within (0, 1], got {value}"
                )));
            }
        }
        for (name, value) in [
            ("layout.logo_breakpoint", layout.logo_breakpoint),
            ("layout.asset_breakpoint", layout.asset_breakpoint),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be a positive width, got {value}"
                )));
            }
        }
        if !(layout.max_pixel_ratio.is_finite() && layout.max_pixel_ratio >= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "layout.max_pixel_ratio must be >= 1, got {}",
                layout.max_pixel_ratio
            )));
        }

        let glitch = &self.glitch;
        for (name, value) in [
            ("glitch.background_intensity", glitch.background_intensity),
            ("glitch.logo_intensity", glitch.logo_intensity),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::Invalid(format!("{name} must be >= 0")));
            }
        }
        if !(0.0..=1.0).contains(&glitch.noise_opacity) {
            return Err(ConfigError::Invalid(
                "glitch.noise_opacity must be within [0, 1]".into(),
            ));
        }

        if let Some(freeze_after) = self.glitch.freeze_after {
            if freeze_after > MAX_DURATION {
                return Err(ConfigError::Invalid(format!(
                    "glitch.freeze_after must not exceed {}",
                    humantime::format_duration(MAX_DURATION)
                )));
            }
        }

        let flash = &self.flash;
        for (name, value) in [
            ("flash.warmup_min", flash.warmup_min),
            ("flash.warmup_max", flash.warmup_max),
            ("flash.interval_min", flash.interval_min),
            ("flash.interval_max", flash.interval_max),
        ] {
            if value > MAX_DURATION {
                return Err(ConfigError::Invalid(format!(
                    "{name} must not exceed {}",
                    humantime::format_duration(MAX_DURATION)
                )));
            }
        }
        if flash.warmup_min > flash.warmup_max {
            return Err(ConfigError::Invalid(
                "flash.warmup_min must not exceed flash.warmup_max".into(),
            ));
        }
        if flash.interval_min > flash.interval_max {
            return Err(ConfigError::Invalid(
                "flash.interval_min must not exceed flash.interval_max".into(),
            ));
        }
        if flash.interval_max.is_zero() {
            return Err(ConfigError::Invalid(
                "flash.interval_max must be greater than zero".into(),
            ));
        }
        if !(flash.decay > 0.0 && flash.decay < 1.0) {
            return Err(ConfigError::Invalid(format!(
                "flash.decay must be within (0, 1), got {}",
                flash.decay
            )));
        }

        let tint = &self.tint;
        if tint.day_start_hour > 23 || tint.day_end_hour > 23 {
            return Err(ConfigError::Invalid(
                "tint hours must be within 0..=23".into(),
            ));
        }
        if tint.day_start_hour > tint.day_end_hour {
            return Err(ConfigError::Invalid(
                "tint.day_start_hour must not be after tint.day_end_hour".into(),
            ));
        }
        if tint
            .day
            .iter()
            .chain(tint.night.iter())
            .any(|channel| !(channel.is_finite() && *channel >= 0.0))
        {
            return Err(ConfigError::Invalid(
                "tint colours must be finite and non-negative".into(),
            ));
        }

        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Invalid(
                "window size must be non-zero".into(),
            ));
        }

        Ok(())
    }
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_duration_opt(deserializer)?
        .ok_or_else(|| de::Error::custom("a duration value is required"))
}

fn deserialize_duration_opt<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    struct Visitor;
    impl<'de> de::Visitor<'de> for Visitor {
        type Value = Option<Duration>;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a duration as number of seconds or human-readable string")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            let trimmed = v.trim();
            if trimmed.eq_ignore_ascii_case("off") || trimmed.eq_ignore_ascii_case("none") {
                return Ok(None);
            }
            humantime::parse_duration(trimmed)
                .map(Some)
                .map_err(|err| E::custom(format!("invalid duration '{v}': {err}")))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(Duration::from_secs(v)))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v < 0 {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Some(Duration::from_secs(v as u64)))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Duration::try_from_secs_f64(v)
                .map(Some)
                .map_err(|err| E::custom(format!("invalid duration {v}: {err}")))
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }
    }

    deserializer.deserialize_any(Visitor)
}

fn serialize_duration<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&humantime::format_duration(*value).to_string())
}

fn serialize_duration_opt<S>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(duration) => serialize_duration(duration, serializer),
        None => serializer.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_responsive_defaults() {
        let config = HeroConfig::from_toml_str("version = 1").unwrap();
        assert_eq!(config, HeroConfig::default());
        assert_eq!(config.layout.padding, 0.9);
        assert_eq!(config.layout.asset_breakpoint, 560.0);
        assert!(config.glitch.freeze_after.is_none());
    }

    #[test]
    fn parses_partial_sections_and_durations() {
        let config = HeroConfig::from_toml_str(
            r#"
version = 1

[assets]
background = "https://cdn.example.com/hero.jpg"

[glitch]
background_intensity = 0.4
freeze_after = "2s 500ms"

[flash]
warmup_min = 1
warmup_max = "3s"
interval_min = 0.25
"#,
        )
        .unwrap();

        assert_eq!(config.assets.background, "https://cdn.example.com/hero.jpg");
        assert_eq!(config.assets.logo, "logo.png");
        assert_eq!(config.glitch.background_intensity, 0.4);
        assert_eq!(config.glitch.freeze_after, Some(Duration::from_millis(2_500)));
        assert_eq!(config.flash.warmup_min, Duration::from_secs(1));
        assert_eq!(config.flash.warmup_max, Duration::from_secs(3));
        assert_eq!(config.flash.interval_min, Duration::from_millis(250));
        assert_eq!(config.flash.interval_max, Duration::from_secs(10));
    }

    #[test]
    fn freeze_can_be_disabled_by_keyword() {
        let config = HeroConfig::from_toml_str(
            r#"
version = 1
[glitch]
freeze_after = "off"
"#,
        )
        .unwrap();
        assert!(config.glitch.freeze_after.is_none());
    }

    #[test]
    fn classic_preset_differs_in_the_expected_places() {
        let classic = HeroConfig::preset(Preset::Classic);
        classic.validate().unwrap();
        assert_eq!(classic.glitch.background_intensity, 0.36);
        assert_eq!(classic.glitch.logo_intensity, 0.55);
        assert_eq!(classic.glitch.freeze_after, Some(Duration::from_secs(2)));
        assert_eq!(classic.layout.asset_breakpoint, classic.layout.logo_breakpoint);
        assert_eq!(classic.assets.background_mobile, classic.assets.background);
        assert_eq!(classic.layout.padding, 0.9);
    }

    #[test]
    fn preset_names_parse() {
        assert_eq!("classic".parse::<Preset>().unwrap(), Preset::Classic);
        assert_eq!(" Responsive ".parse::<Preset>().unwrap(), Preset::Responsive);
        assert!("wobbly".parse::<Preset>().is_err());
    }

    #[test]
    fn rejects_padding_outside_unit_range() {
        let err = HeroConfig::from_toml_str(
            r#"
version = 1
[layout]
padding = 1.2
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(message) if message.contains("padding")));
    }

    #[test]
    fn rejects_inverted_flash_window() {
        let err = HeroConfig::from_toml_str(
            r#"
version = 1
[flash]
interval_min = "20s"
interval_max = "10s"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(message) if message.contains("interval_min")));
    }

    #[test]
    fn rejects_decay_that_never_settles() {
        let mut config = HeroConfig::default();
        config.flash.decay = 1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_unknown_version() {
        let err = HeroConfig::from_toml_str("version = 2").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_negative_duration() {
        let err = HeroConfig::from_toml_str(
            r#"
version = 1
[flash]
warmup_min = -3
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn oversized_durations_are_errors_not_panics() {
        let err = HeroConfig::from_toml_str("version = 1\n[flash]\ninterval_max = 1e30\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));

        let err = HeroConfig::from_toml_str(
            r#"
version = 1
[flash]
interval_max = 100000000
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(message) if message.contains("interval_max")));

        let err = HeroConfig::from_toml_str(
            r#"
version = 1
[glitch]
freeze_after = "400days"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(message) if message.contains("freeze_after")));
    }

    #[test]
    fn serialised_config_parses_back() {
        let classic = HeroConfig::preset(Preset::Classic);
        let text = classic.to_toml_string().unwrap();
        assert!(text.contains("freeze_after = \"2s\""));
        let parsed = HeroConfig::from_toml_str(&text).unwrap();
        assert_eq!(parsed, classic);
    }
}
