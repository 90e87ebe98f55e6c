//! calmirror configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use calmirror_caldav::CalDavEndpoint;
use serde::Deserialize;

/// Configuration at ~/.config/calmirror/config.toml (or --config PATH).
///
/// Two CalDAV endpoints: events flow from `source` into `target`, never
/// the other way.
#[derive(Deserialize, Clone)]
pub struct Config {
    pub source: CalDavEndpoint,
    pub target: CalDavEndpoint,
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("calmirror");
        Ok(config_dir.join("config.toml"))
    }

    pub fn load(path: Option<&Path>) -> Result<Config> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_path()?,
        };

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config at {}", path.display()))?;
        let config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config at {}", path.display()))?;
        Ok(config)
    }
}
