mod config;
mod settings;

pub use config::{Config, LoggingConfig, ServiceConfig, UserConfig};
pub use settings::{MemorySettingsStore, SettingsStore, StoredSettings, TomlSettingsStore};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns the data directory, creating it if needed.
///
/// `WAVETIMER_DATA_DIR` wins when set. Otherwise `~/.config/wavetimer`, or
/// `~/.config/wavetimer-dev` when `WAVETIMER_ENV=dev`.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("WAVETIMER_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("WAVETIMER_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("wavetimer-dev")
            } else {
                base_dir.join("wavetimer")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(|source| ConfigError::DataDir {
        path: dir.clone(),
        source,
    })?;
    Ok(dir)
}
