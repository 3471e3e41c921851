//! User configuration
//!
//! Read from `foxden.toml` in the platform config directory. Every field is
//! optional; a missing file means defaults.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use foxden_core::{StoreOptions, Theme};
use serde::Deserialize;

pub const CONFIG_FILE: &str = "foxden.toml";

/// Error type for configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Could not determine config directory")]
    NoConfigDir,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Overrides the platform data directory
    pub data_dir: Option<PathBuf>,
    /// Used when `RUST_LOG` is unset
    pub log_filter: String,
    /// Applied only when nothing is persisted yet
    pub default_theme: Theme,
    pub desktop_notifications: bool,
    /// Capture source handed to the screen share device
    pub screen_source: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            log_filter: "info".to_string(),
            default_theme: Theme::Dark,
            desktop_notifications: true,
            screen_source: foxden_core::voice::DEFAULT_SCREEN_SOURCE.to_string(),
        }
    }
}

impl AppConfig {
    /// Load from the platform config directory
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    /// Load from an explicit path; a missing file yields defaults
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let dirs = project_dirs().ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join(CONFIG_FILE))
    }

    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            default_theme: self.default_theme,
            ..StoreOptions::new()
        }
    }
}

pub fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("dev", "foxden", "foxden")
}
