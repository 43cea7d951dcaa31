use std::path::PathBuf;

use serde::Deserialize;

use crate::domain::constants::{DEFAULT_WINDOW_DAYS, FULL_WINDOW_DAYS};

/// Fatal pre-run misconfiguration. Surfaced before any registry access.
#[derive(thiserror::Error, Debug)]
#[error("{0}")]
pub struct ConfigError(pub String);

#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub general: ConfigGeneral,
}

#[derive(Debug, Default, Deserialize)]
pub struct ConfigGeneral {
    #[serde(default)]
    pub default_days: Option<u32>,
    #[serde(default)]
    pub macro_tool: Option<String>,
}

fn config_path() -> Option<PathBuf> {
    let home = std::env::var("HOME").ok()?;
    Some(PathBuf::from(home).join(".config/mrusift/config.toml"))
}

pub fn load_config() -> anyhow::Result<ConfigFile> {
    let Some(path) = config_path() else {
        return Ok(ConfigFile::default());
    };
    if !path.exists() {
        return Ok(ConfigFile::default());
    }
    let raw = std::fs::read_to_string(&path)
        .map_err(|e| ConfigError(format!("cannot read {}: {e}", path.display())))?;
    toml::from_str(&raw).map_err(|e| ConfigError(format!("invalid {}: {e}", path.display())).into())
}

/// Explicit `--days` wins; `--full` widens to the unfiltered default;
/// otherwise the config file, then the built-in 7-day window.
pub fn effective_window_days(days: Option<u32>, full: bool, config: &ConfigGeneral) -> u32 {
    if let Some(d) = days {
        return d;
    }
    if full {
        return FULL_WINDOW_DAYS;
    }
    config.default_days.unwrap_or(DEFAULT_WINDOW_DAYS)
}
