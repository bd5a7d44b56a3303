//! CLI configuration.

use anyhow::Result;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::output::OutputFormat;

const HANDLER_CONFIG_FILE: &str = "handler.toml";
const STATE_FILE: &str = "networks.json";

/// CLI configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Default output format.
    pub output_format: Option<OutputFormat>,

    /// Handler config file. Defaults to `handler.toml` next to this file.
    pub handler_config: Option<PathBuf>,

    /// Saved network state. Defaults to `networks.json` in the data dir.
    pub state_file: Option<PathBuf>,
}

impl Config {
    fn dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("org", "eaptrust", "eaptrust")
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))
    }

    /// Get the config file path.
    pub fn path() -> Result<PathBuf> {
        Ok(Self::dirs()?.config_dir().join("config.toml"))
    }

    /// Load configuration from the default location.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    /// Load configuration from a file, or defaults if it doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;

        Ok(config)
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    /// Save configuration to a file.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    /// Where the handler config lives.
    pub fn handler_config_path(&self) -> Result<PathBuf> {
        match &self.handler_config {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::dirs()?.config_dir().join(HANDLER_CONFIG_FILE)),
        }
    }

    /// Where the network state lives.
    pub fn state_path(&self) -> Result<PathBuf> {
        match &self.state_file {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::dirs()?.data_dir().join(STATE_FILE)),
        }
    }
}
