//! Snapshot persistence for configuration sets
//!
//! A snapshot is a saved configuration set with an id, a name and a
//! creation timestamp, stored under numbered directories:
//!
//! ```text
//! snapshots/
//!   1/1_before-cleanup.yaml
//!   2/2_spring-mix.yaml
//! ```
//!
//! YAML is the native format; `.json` files carry the web client's wire
//! shape, so exports from the dashboard load directly.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::stack::{ConfigurationSet, PlaylistConfiguration, StackError, StackGraph, StackResult};

/// Errors from snapshot storage
#[derive(Error, Debug)]
pub enum SnapshotError {
    /// Filesystem failure while reading or writing a snapshot
    #[error("Snapshot IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot file is not valid YAML
    #[error("Failed to parse snapshot YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Snapshot file is not valid JSON
    #[error("Failed to parse snapshot JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// No snapshot directory with this id
    #[error("Snapshot {id} not found")]
    NotFound { id: u32 },

    /// Snapshot directory exists but holds no snapshot file
    #[error("No snapshot file in {}", .dir.display())]
    MissingFile { dir: PathBuf },

    /// Snapshot file extension is neither YAML nor JSON
    #[error("Unsupported snapshot format: {}", .path.display())]
    UnsupportedFormat { path: PathBuf },

    /// The snapshot's configuration set failed validation
    #[error(transparent)]
    InvalidStack(#[from] StackError),
}

/// Result type for snapshot operations
pub type SnapshotResult<T> = Result<T, SnapshotError>;

/// A persisted configuration set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackSnapshot {
    pub id: u32,
    pub name: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Local>,
    pub playlists: Vec<PlaylistConfiguration>,
}

impl StackSnapshot {
    /// Capture a set as a snapshot stamped with the current local time
    pub fn from_set(id: u32, name: impl Into<String>, set: &ConfigurationSet) -> Self {
        Self {
            id,
            name: name.into(),
            created_at: Local::now(),
            playlists: set.iter().cloned().collect(),
        }
    }

    /// Rebuild the configuration set; fails on duplicate ids
    pub fn into_set(self) -> StackResult<ConfigurationSet> {
        ConfigurationSet::from_configs(self.playlists)
    }
}

/// Store over a snapshots directory with numbered subdirectories
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    root: PathBuf,
}

impl SnapshotStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Snapshot ids present in the store, ascending.
    /// A missing root directory is an empty store, not an error.
    pub fn list(&self) -> SnapshotResult<Vec<u32>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let mut ids: Vec<u32> = fs::read_dir(&self.root)?
            .filter_map(|entry| {
                entry
                    .ok()?
                    .file_name()
                    .into_string()
                    .ok()?
                    .parse::<u32>()
                    .ok()
            })
            .collect();
        ids.sort_unstable();
        Ok(ids)
    }

    pub fn latest_id(&self) -> SnapshotResult<Option<u32>> {
        Ok(self.list()?.into_iter().max())
    }

    /// Validate a set and persist it as the next numbered snapshot.
    /// Returns the new snapshot id (1 for an empty store).
    pub fn create(&self, name: &str, set: &ConfigurationSet) -> SnapshotResult<u32> {
        StackGraph::build(set)?;

        let id = self.latest_id()?.map_or(1, |latest| latest + 1);
        let dir = self.root.join(id.to_string());
        fs::create_dir_all(&dir)?;

        let snapshot = StackSnapshot::from_set(id, name, set);
        let file = dir.join(format!("{}_{}.yaml", id, sanitize_name(name)));
        let yaml = serde_yaml::to_string(&snapshot)?;
        fs::write(&file, yaml)?;

        log::info!("create: Saved snapshot {} to {:?}", id, file);
        Ok(id)
    }

    /// Load a snapshot by id. Picks the first recognized file in the
    /// snapshot's directory (there is normally exactly one).
    pub fn load(&self, id: u32) -> SnapshotResult<StackSnapshot> {
        let dir = self.root.join(id.to_string());
        if !dir.is_dir() {
            return Err(SnapshotError::NotFound { id });
        }

        let mut files: Vec<PathBuf> = fs::read_dir(&dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                matches!(
                    path.extension().and_then(|e| e.to_str()),
                    Some("yaml") | Some("yml") | Some("json")
                )
            })
            .collect();
        files.sort();

        let path = files
            .into_iter()
            .next()
            .ok_or(SnapshotError::MissingFile { dir })?;
        load_snapshot_path(&path)
    }
}

/// Load a snapshot file directly, YAML or JSON by extension
pub fn load_snapshot_path(path: &Path) -> SnapshotResult<StackSnapshot> {
    log::info!("load_snapshot_path: Loading from {:?}", path);
    let contents = fs::read_to_string(path)?;
    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => Ok(serde_yaml::from_str(&contents)?),
        Some("json") => Ok(serde_json::from_str(&contents)?),
        _ => Err(SnapshotError::UnsupportedFormat {
            path: path.to_path_buf(),
        }),
    }
}

/// File-name-safe form of a snapshot name
fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect()
}
