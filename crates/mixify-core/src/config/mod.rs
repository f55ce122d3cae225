//! Mixify configuration
//!
//! Configuration is stored as YAML in the user's config directory.
//! Default location: ~/.config/mixify/config.yaml

pub mod paths;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MixifyConfig {
    /// Where numbered snapshot directories live
    /// Default: `{data dir}/mixify/snapshots`
    pub snapshot_dir: PathBuf,
    /// Cap on how many layers the report tool prints (None = all)
    pub dashboard_depth_limit: Option<usize>,
}

impl Default for MixifyConfig {
    fn default() -> Self {
        Self {
            snapshot_dir: paths::default_snapshot_dir(),
            dashboard_depth_limit: None,
        }
    }
}

/// Load configuration from a YAML file
///
/// If the file doesn't exist, returns default config.
/// If the file exists but is invalid, logs a warning and returns default config.
pub fn load_config(path: &Path) -> MixifyConfig {
    log::info!("load_config: Loading from {:?}", path);

    if !path.exists() {
        log::info!("load_config: Config file doesn't exist, using defaults");
        return MixifyConfig::default();
    }

    match std::fs::read_to_string(path) {
        Ok(contents) => match serde_yaml::from_str::<MixifyConfig>(&contents) {
            Ok(config) => {
                log::info!(
                    "load_config: Loaded config - snapshot dir: {:?}",
                    config.snapshot_dir
                );
                config
            }
            Err(e) => {
                log::warn!("load_config: Failed to parse config: {}, using defaults", e);
                MixifyConfig::default()
            }
        },
        Err(e) => {
            log::warn!(
                "load_config: Failed to read config file: {}, using defaults",
                e
            );
            MixifyConfig::default()
        }
    }
}

/// Save configuration to a YAML file
///
/// Creates parent directories if they don't exist.
pub fn save_config(config: &MixifyConfig, path: &Path) -> Result<()> {
    log::info!("save_config: Saving to {:?}", path);

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
    }

    let yaml = serde_yaml::to_string(config).context("Failed to serialize config to YAML")?;

    std::fs::write(path, yaml)
        .with_context(|| format!("Failed to write config file: {:?}", path))?;

    log::info!("save_config: Config saved successfully");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MixifyConfig::default();
        assert!(config.snapshot_dir.ends_with("mixify/snapshots"));
        assert_eq!(config.dashboard_depth_limit, None);
    }

    #[test]
    fn test_load_nonexistent_returns_default() {
        let config = load_config(Path::new("/nonexistent/path/config.yaml"));
        assert!(config.snapshot_dir.ends_with("mixify/snapshots"));
    }

    #[test]
    fn test_yaml_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");

        let config = MixifyConfig {
            snapshot_dir: PathBuf::from("/tmp/mixify-test/snapshots"),
            dashboard_depth_limit: Some(3),
        };

        save_config(&config, &path).unwrap();
        let loaded = load_config(&path);

        assert_eq!(loaded.snapshot_dir, config.snapshot_dir);
        assert_eq!(loaded.dashboard_depth_limit, Some(3));
    }

    #[test]
    fn test_invalid_yaml_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "snapshot_dir: [not, a, path").unwrap();

        let config = load_config(&path);
        assert!(config.snapshot_dir.ends_with("mixify/snapshots"));
    }
}
