//! Configuration management: defaults, validation, loading from file + environment.

pub mod app_config;
pub mod defaults;
pub mod manager;
pub mod validation;

pub use app_config::{AppConfig, MarkConfig};
pub use manager::SettingsManager;

use std::path::PathBuf;

/// Environment variable naming the settings file.
pub const CONFIG_PATH_ENV: &str = "FANOUT_PRESS_CONFIG";

/// Settings file used when [`CONFIG_PATH_ENV`] is unset.
pub const DEFAULT_CONFIG_FILE: &str = "fanout-press.env";

/// Determine the settings file path.
/// Priority: FANOUT_PRESS_CONFIG env var > ./fanout-press.env
pub fn config_path() -> PathBuf {
    match std::env::var(CONFIG_PATH_ENV) {
        Ok(path) if !path.is_empty() => PathBuf::from(path),
        _ => PathBuf::from(DEFAULT_CONFIG_FILE),
    }
}
