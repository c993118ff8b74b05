//! TOML-based device-local configuration.
//!
//! Holds everything that must NOT replicate across devices: the signed-in
//! user id, the sync mode, where the remote document lives, the debounce
//! window, and sprint boundaries for stats.
//!
//! Configuration is stored at `~/.config/timetrail/config.toml`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::settings::SyncMode;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

/// Sprint boundaries for the dashboard stats (weekday numbers, 0 = Sunday).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SprintSettings {
    #[serde(default = "default_sprint_start")]
    pub start_day: u8,
    #[serde(default = "default_sprint_end")]
    pub end_day: u8,
}

impl Default for SprintSettings {
    fn default() -> Self {
        Self {
            start_day: default_sprint_start(),
            end_day: default_sprint_end(),
        }
    }
}

/// Device-local application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    /// Stable identifier supplied by the auth boundary. `None` = signed out.
    #[serde(default)]
    pub user_id: Option<String>,

    #[serde(default)]
    pub sync_mode: SyncMode,

    /// Directory holding the remote backup documents (e.g. a cloud-synced
    /// folder). `None` disables sync operations.
    #[serde(default)]
    pub remote_dir: Option<PathBuf>,

    /// Trailing-edge debounce window for the automatic push, in seconds.
    #[serde(default = "default_debounce_secs")]
    pub debounce_secs: u64,

    #[serde(default)]
    pub sprint: SprintSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            user_id: None,
            sync_mode: SyncMode::default(),
            remote_dir: None,
            debounce_secs: default_debounce_secs(),
            sprint: SprintSettings::default(),
        }
    }
}

impl AppConfig {
    /// Load from the default location; a missing file yields defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path()?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &PathBuf) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        toml::from_str(&raw).map_err(|e| ConfigError::LoadFailed {
            path: path.clone(),
            message: e.to_string(),
        })
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::default_path()?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &PathBuf) -> Result<(), ConfigError> {
        let raw = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(path, raw).map_err(|e| ConfigError::SaveFailed {
            path: path.clone(),
            message: e.to_string(),
        })
    }

    fn default_path() -> Result<PathBuf, ConfigError> {
        let dir = super::data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("~/.config/timetrail"),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }
}

fn default_debounce_secs() -> u64 {
    2
}

fn default_sprint_start() -> u8 {
    1 // Monday
}

fn default_sprint_end() -> u8 {
    5 // Friday
}
