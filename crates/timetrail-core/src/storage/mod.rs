mod config;
mod local;

pub use config::{AppConfig, ConfigError};
pub use local::{JsonFileStore, LocalStore, MemoryStore, StorageError};

use std::path::PathBuf;

/// Returns `~/.config/timetrail[-dev]/` based on TIMETRAIL_ENV.
///
/// Set TIMETRAIL_ENV=dev to use a development data directory.
pub fn data_dir() -> Result<PathBuf, StorageError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("TIMETRAIL_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("timetrail-dev")
    } else {
        base_dir.join("timetrail")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
