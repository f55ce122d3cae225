//! Playlist configuration stacks
//!
//! This module provides the mixstack data model and graph algorithms:
//! - String-id configurations linked by parent/child associations
//! - An insertion-ordered, id-indexed configuration set
//! - Graph validation (dangling references, cycle detection)
//! - The depth-layering engine behind the dashboard view
//! - Per-stack build trees and dependency paths

pub mod graph;
pub mod layering;
pub mod tree;

pub use graph::StackGraph;
pub use layering::{layer_graph, layer_stacks, Layer};
pub use tree::{build_forest, StackNode};

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unique identifier for a playlist configuration.
/// Plain strings (a database id, or store-generated "p1", "p2", ...) so
/// configurations survive serialization without object references.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigId(pub String);

impl ConfigId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ConfigId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of an association. Imported data reuses placeholder ids,
/// so uniqueness is not guaranteed and this is never used as a lookup key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssociationId(pub String);

impl AssociationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AssociationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A directed parent -> child link between two configurations.
///
/// Associations carry endpoint ids, not references; the owning set resolves
/// them. Either endpoint may be absent (the client produced half-filled
/// associations while an edge was being edited), in which case the
/// association never qualifies as a traversable edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistAssociation {
    pub id: AssociationId,
    /// Parent (mixstack) side of the edge
    #[serde(default, rename = "parentPlaylistId")]
    pub parent_id: Option<ConfigId>,
    /// Child side of the edge
    #[serde(default, rename = "childPlaylistId")]
    pub child_id: Option<ConfigId>,
}

impl PlaylistAssociation {
    pub fn new(
        id: AssociationId,
        parent_id: Option<ConfigId>,
        child_id: Option<ConfigId>,
    ) -> Self {
        Self {
            id,
            parent_id,
            child_id,
        }
    }

    /// The child this association leads to when `owner` plays the parent
    /// role. Self-edges never qualify: a configuration cannot stack onto
    /// itself, so traversal skips them.
    pub fn child_from(&self, owner: &ConfigId) -> Option<&ConfigId> {
        match (&self.parent_id, &self.child_id) {
            (Some(parent), Some(child)) if parent == owner && child != owner => Some(child),
            _ => None,
        }
    }

    /// Endpoint ids that are present, for validation scans
    pub fn endpoints(&self) -> impl Iterator<Item = &ConfigId> {
        self.parent_id.iter().chain(self.child_id.iter())
    }
}

/// A playlist configuration: one node of the mixstack forest.
///
/// Field names serialize in the camelCase wire form the web client uses
/// (`isMixstack`, `spotifyPlaylistId`, `playlistOrder`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistConfiguration {
    pub id: ConfigId,
    /// Display name
    pub name: String,
    /// True once the configuration parents at least one child; mixstack
    /// playlists are generated from their descendants rather than curated
    #[serde(default)]
    pub is_mixstack: bool,
    /// Backing Spotify playlist, if one exists yet
    #[serde(default)]
    pub spotify_playlist_id: Option<String>,
    /// Intended child order when merging tracks into the mixstack;
    /// may be empty or list only some of the children
    #[serde(default)]
    pub playlist_order: Vec<ConfigId>,
    /// Associations this configuration participates in, in either role
    #[serde(default)]
    pub associations: Vec<PlaylistAssociation>,
}

impl PlaylistConfiguration {
    /// Create a plain (non-mixstack) configuration with no associations
    pub fn new(id: ConfigId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            is_mixstack: false,
            spotify_playlist_id: None,
            playlist_order: Vec::new(),
            associations: Vec::new(),
        }
    }

    /// Check if this configuration has no associations at all
    pub fn is_isolated(&self) -> bool {
        self.associations.is_empty()
    }
}

/// Insertion-ordered, id-indexed collection of playlist configurations.
///
/// Iteration order is insertion order, which in turn fixes the order of
/// top-level configurations in the layered dashboard output.
#[derive(Debug, Clone, Default)]
pub struct ConfigurationSet {
    configs: Vec<PlaylistConfiguration>,
    index: HashMap<ConfigId, usize>,
}

impl ConfigurationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from configurations, rejecting duplicate ids
    pub fn from_configs(
        configs: impl IntoIterator<Item = PlaylistConfiguration>,
    ) -> StackResult<Self> {
        let mut set = Self::new();
        for config in configs {
            set.insert(config)?;
        }
        Ok(set)
    }

    /// Append a configuration. Fails if the id is already present; the
    /// index is authoritative and a silent last-wins would corrupt layering.
    pub fn insert(&mut self, config: PlaylistConfiguration) -> StackResult<()> {
        if self.index.contains_key(&config.id) {
            return Err(StackError::DuplicateConfiguration {
                id: config.id.clone(),
            });
        }
        self.index.insert(config.id.clone(), self.configs.len());
        self.configs.push(config);
        Ok(())
    }

    /// Replace the configuration with the same id, or append it
    pub fn upsert(&mut self, config: PlaylistConfiguration) {
        match self.index.get(&config.id) {
            Some(&pos) => self.configs[pos] = config,
            None => {
                self.index.insert(config.id.clone(), self.configs.len());
                self.configs.push(config);
            }
        }
    }

    /// Remove a configuration by id, reindexing the remainder
    pub fn remove(&mut self, id: &ConfigId) -> Option<PlaylistConfiguration> {
        let pos = self.index.remove(id)?;
        let removed = self.configs.remove(pos);
        for (i, config) in self.configs.iter().enumerate().skip(pos) {
            self.index.insert(config.id.clone(), i);
        }
        Some(removed)
    }

    pub fn get(&self, id: &ConfigId) -> Option<&PlaylistConfiguration> {
        self.index.get(id).map(|&pos| &self.configs[pos])
    }

    /// Mutable access to a configuration. The `id` field must stay
    /// untouched through this reference; the index is keyed on it.
    pub fn get_mut(&mut self, id: &ConfigId) -> Option<&mut PlaylistConfiguration> {
        let pos = *self.index.get(id)?;
        Some(&mut self.configs[pos])
    }

    pub fn contains(&self, id: &ConfigId) -> bool {
        self.index.contains_key(id)
    }

    /// Iterate configurations in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &PlaylistConfiguration> {
        self.configs.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &ConfigId> {
        self.configs.iter().map(|c| &c.id)
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }
}

/// Errors raised while building, validating or traversing a stack graph
#[derive(Error, Debug)]
pub enum StackError {
    /// A configuration with this id is already in the set
    #[error("Configuration already exists: {id}")]
    DuplicateConfiguration { id: ConfigId },

    /// An operation referenced a configuration id that is not in the set
    #[error("Unknown configuration: {id}")]
    UnknownConfiguration { id: ConfigId },

    /// An association endpoint names a configuration that does not exist
    #[error("dangling association {association}: no configuration with id {missing}")]
    DanglingAssociation {
        association: AssociationId,
        missing: ConfigId,
    },

    /// The association graph contains a multi-node cycle
    #[error("cyclic configuration graph: {id} reached again via {path}")]
    CyclicStack { id: ConfigId, path: String },

    /// Refused to create an association from a configuration to itself
    #[error("Configuration {id} cannot be its own child")]
    SelfAssociation { id: ConfigId },

    /// A leaf playlist has no backing Spotify playlist to pull tracks from
    #[error("Playlist {id} has no Spotify playlist id to query tracks from")]
    MissingSpotifyId { id: ConfigId },
}

/// Result type for stack operations
pub type StackResult<T> = Result<T, StackError>;
