//! Path utilities for mixify files
//!
//! Provides standard locations for the config file and the snapshot
//! store, shared by the library and the inspection tools.

use std::path::PathBuf;

/// Get the default mixify data directory
///
/// Returns: `~/.local/share/mixify` on Linux (platform equivalent elsewhere)
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mixify")
}

/// Get the default snapshot store directory
///
/// Returns: `{data dir}/mixify/snapshots`
pub fn default_snapshot_dir() -> PathBuf {
    default_data_dir().join("snapshots")
}

/// Get the default config file path
///
/// Returns: `~/.config/mixify/config.yaml`
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
        .join("mixify")
        .join("config.yaml")
}
