use std::env;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use directories_next::ProjectDirs;

pub const ENV_CONFIG_DIR: &str = "GLITCHHERO_CONFIG_DIR";
pub const ENV_CACHE_DIR: &str = "GLITCHHERO_CACHE_DIR";

const QUALIFIER: &str = "org";
const ORGANISATION: &str = "Glitchhero";
const APPLICATION: &str = "Glitchhero";

#[derive(Debug, Clone)]
pub struct AppPaths {
    config_dir: PathBuf,
    cache_dir: PathBuf,
}

impl AppPaths {
    pub fn discover() -> Result<Self> {
        let config_override = env_override(ENV_CONFIG_DIR);
        let cache_override = env_override(ENV_CACHE_DIR);
        if let (Some(config_dir), Some(cache_dir)) = (&config_override, &cache_override) {
            return Ok(Self {
                config_dir: config_dir.clone(),
                cache_dir: cache_dir.clone(),
            });
        }

        let project_dirs = ProjectDirs::from(QUALIFIER, ORGANISATION, APPLICATION)
            .ok_or_else(|| anyhow!("failed to determine user directories"))?;

        let config_dir = resolve_dir(config_override, project_dirs.config_dir())
            .context("failed to resolve glitchhero config directory")?;
        let cache_dir = resolve_dir(cache_override, project_dirs.cache_dir())
            .context("failed to resolve glitchhero cache directory")?;

        Ok(Self {
            config_dir,
            cache_dir,
        })
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("glitchhero.toml")
    }

    pub fn session_file(&self) -> PathBuf {
        self.cache_dir.join("session.toml")
    }
}

fn resolve_dir(value: Option<PathBuf>, default: &Path) -> Result<PathBuf> {
    match value {
        Some(value) if value.is_relative() => Ok(env::current_dir()
            .context("failed to read current directory")?
            .join(value)),
        Some(value) => Ok(value),
        None => Ok(default.to_path_buf()),
    }
}

fn env_override(name: &str) -> Option<PathBuf> {
    match env::var_os(name) {
        Some(value) if !value.is_empty() => Some(PathBuf::from(value)),
        _ => None,
    }
}
