//! Bottom-up sync planning for mixstacks
//!
//! Turns a configuration set into the ordered list of steps that would
//! materialize every mixstack playlist: children are planned before their
//! parents, a configuration shared by several stacks is planned exactly
//! once, and every step carries its position. The plan is a pure value;
//! executing it against Spotify is the host's job.
//!
//! The track-merge helpers at the bottom mirror how a mixstack's track
//! list is assembled at apply time: concatenate child groups in order,
//! first occurrence wins, skip what the playlist already has, and chunk
//! writes to the add-tracks API limit.

use std::collections::HashSet;
use std::fmt;

use crate::stack::{
    build_forest, ConfigId, ConfigurationSet, PlaylistConfiguration, StackError, StackGraph,
    StackNode, StackResult,
};

/// The Spotify add-tracks endpoint takes at most 100 ids per request
pub const TRACK_BATCH_SIZE: usize = 100;

/// Spotify track identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrackId(pub String);

impl TrackId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One step of a sync plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStep {
    /// Fetch the current tracks of a plain playlist
    QueryTracks { config: ConfigId },
    /// Create the backing Spotify playlist for a mixstack that has none
    CreatePlaylist {
        config: ConfigId,
        name: String,
        description: String,
    },
    /// Merge the sources' tracks into the mixstack, in source order
    CollectTracks {
        into: ConfigId,
        sources: Vec<ConfigId>,
    },
}

impl fmt::Display for SyncStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncStep::QueryTracks { config } => write!(f, "query tracks of {}", config),
            SyncStep::CreatePlaylist { config, name, .. } => {
                write!(f, "create playlist \"{}\" for {}", name, config)
            }
            SyncStep::CollectTracks { into, sources } => {
                let list: Vec<&str> = sources.iter().map(|s| s.as_str()).collect();
                write!(f, "collect tracks into {} from [{}]", into, list.join(", "))
            }
        }
    }
}

/// A step with its position in the plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncAction {
    pub idx: usize,
    pub step: SyncStep,
}

impl fmt::Display for SyncAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>3}. {}", self.idx, self.step)
    }
}

/// Ordered steps that would bring every mixstack up to date
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncPlan {
    pub actions: Vec<SyncAction>,
}

impl SyncPlan {
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SyncAction> {
        self.actions.iter()
    }
}

impl fmt::Display for SyncPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for action in &self.actions {
            writeln!(f, "{}", action)?;
        }
        Ok(())
    }
}

/// Validate a configuration set and plan its sync.
///
/// Children come before parents; a leaf must have a backing Spotify
/// playlist to query tracks from, a mixstack without one gets a
/// `CreatePlaylist` step before its `CollectTracks`.
pub fn plan_sync(set: &ConfigurationSet) -> StackResult<SyncPlan> {
    let graph = StackGraph::build(set)?;
    let forest = build_forest(&graph);

    let mut planner = Planner {
        graph: &graph,
        planned: HashSet::new(),
        actions: Vec::new(),
    };
    for tree in &forest {
        planner.plan_node(tree)?;
    }

    log::debug!(
        "plan_sync: {} actions over {} configurations",
        planner.actions.len(),
        set.len()
    );
    Ok(SyncPlan {
        actions: planner.actions,
    })
}

struct Planner<'g, 'a> {
    graph: &'g StackGraph<'a>,
    planned: HashSet<ConfigId>,
    actions: Vec<SyncAction>,
}

impl Planner<'_, '_> {
    fn plan_node(&mut self, node: &StackNode) -> StackResult<()> {
        if self.planned.contains(&node.id) {
            return Ok(());
        }
        self.planned.insert(node.id.clone());

        for child in &node.children {
            self.plan_node(child)?;
        }

        let config = self.graph.config(&node.id)?;
        if node.is_leaf() {
            if config.spotify_playlist_id.is_none() {
                return Err(StackError::MissingSpotifyId {
                    id: node.id.clone(),
                });
            }
            self.push(SyncStep::QueryTracks {
                config: node.id.clone(),
            });
        } else {
            if config.spotify_playlist_id.is_none() {
                let description = self.mixstack_description(node)?;
                self.push(SyncStep::CreatePlaylist {
                    config: node.id.clone(),
                    name: config.name.clone(),
                    description,
                });
            }
            self.push(SyncStep::CollectTracks {
                into: node.id.clone(),
                sources: ordered_sources(config, node),
            });
        }
        Ok(())
    }

    fn push(&mut self, step: SyncStep) {
        let idx = self.actions.len();
        self.actions.push(SyncAction { idx, step });
    }

    /// Playlist description listing the direct children, in tree order
    fn mixstack_description(&self, node: &StackNode) -> StackResult<String> {
        let mut description =
            String::from("Generated mixstack using mixify. This playlist consists of:");
        let last = node.children.len().saturating_sub(1);
        for (i, child) in node.children.iter().enumerate() {
            let name = &self.graph.config(&child.id)?.name;
            if i == last {
                description.push_str(&format!(" {}.", name));
            } else {
                description.push_str(&format!(" {} x", name));
            }
        }
        Ok(description)
    }
}

/// Source order for a mixstack's track merge: `playlist_order` entries
/// that are actual children first, then the remaining children in
/// association order. Stale order entries are ignored.
fn ordered_sources(config: &PlaylistConfiguration, node: &StackNode) -> Vec<ConfigId> {
    let children: Vec<&ConfigId> = node.children.iter().map(|c| &c.id).collect();

    let mut sources: Vec<ConfigId> = Vec::new();
    for id in &config.playlist_order {
        if children.contains(&id) && !sources.contains(id) {
            sources.push(id.clone());
        }
    }
    for id in children {
        if !sources.contains(id) {
            sources.push(id.clone());
        }
    }
    sources
}

/// Concatenate track groups in group order, first occurrence wins
pub fn merge_track_ids(groups: &[Vec<TrackId>]) -> Vec<TrackId> {
    let mut merged: Vec<TrackId> = Vec::new();
    for group in groups {
        for track in group {
            if !merged.contains(track) {
                merged.push(track.clone());
            }
        }
    }
    merged
}

/// Candidates that the target playlist does not already contain
pub fn missing_track_ids(candidates: &[TrackId], existing: &[TrackId]) -> Vec<TrackId> {
    candidates
        .iter()
        .filter(|t| !existing.contains(t))
        .cloned()
        .collect()
}

/// Chunk ids to the add-tracks request limit
pub fn batch_track_ids(tracks: &[TrackId]) -> impl Iterator<Item = &[TrackId]> {
    tracks.chunks(TRACK_BATCH_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stack::{AssociationId, PlaylistAssociation};

    fn id(s: &str) -> ConfigId {
        ConfigId::new(s)
    }

    fn track(s: &str) -> TrackId {
        TrackId::new(s)
    }

    /// Leaves get a Spotify playlist id, mixstacks start without one
    fn set_of(leaves: &[&str], stacks: &[&str], edges: &[(&str, &str, &str)]) -> ConfigurationSet {
        let mut set = ConfigurationSet::new();
        for leaf in leaves {
            let mut c = PlaylistConfiguration::new(id(leaf), format!("Playlist {}", leaf));
            c.spotify_playlist_id = Some(format!("spotify-{}", leaf));
            set.insert(c).unwrap();
        }
        for stack in stacks {
            let mut c = PlaylistConfiguration::new(id(stack), format!("Stack {}", stack));
            c.is_mixstack = true;
            set.insert(c).unwrap();
        }
        for (a, parent, child) in edges {
            let assoc =
                PlaylistAssociation::new(AssociationId::new(*a), Some(id(parent)), Some(id(child)));
            set.get_mut(&id(parent)).unwrap().associations.push(assoc);
        }
        set
    }

    fn step_ids(plan: &SyncPlan) -> Vec<(&'static str, &str)> {
        plan.actions
            .iter()
            .map(|a| match &a.step {
                SyncStep::QueryTracks { config } => ("query", config.as_str()),
                SyncStep::CreatePlaylist { config, .. } => ("create", config.as_str()),
                SyncStep::CollectTracks { into, .. } => ("collect", into.as_str()),
            })
            .collect()
    }

    #[test]
    fn test_children_planned_before_parents() {
        let set = set_of(&["x", "y"], &["m"], &[("a1", "m", "x"), ("a2", "m", "y")]);
        let plan = plan_sync(&set).unwrap();

        assert_eq!(
            step_ids(&plan),
            [
                ("query", "x"),
                ("query", "y"),
                ("create", "m"),
                ("collect", "m"),
            ]
        );
    }

    #[test]
    fn test_idx_is_ascending() {
        let set = set_of(&["x", "y"], &["m"], &[("a1", "m", "x"), ("a2", "m", "y")]);
        let plan = plan_sync(&set).unwrap();
        let idxs: Vec<usize> = plan.iter().map(|a| a.idx).collect();
        assert_eq!(idxs, [0, 1, 2, 3]);
    }

    #[test]
    fn test_shared_child_planned_once() {
        // diamond: r -> a -> d, r -> b -> d
        let set = set_of(
            &["d"],
            &["r", "a", "b"],
            &[
                ("e1", "r", "a"),
                ("e2", "r", "b"),
                ("e3", "a", "d"),
                ("e4", "b", "d"),
            ],
        );
        let plan = plan_sync(&set).unwrap();

        let queries = step_ids(&plan)
            .iter()
            .filter(|(kind, who)| *kind == "query" && *who == "d")
            .count();
        assert_eq!(queries, 1);
    }

    #[test]
    fn test_backed_mixstack_gets_no_create_step() {
        let mut set = set_of(&["x"], &["m"], &[("a1", "m", "x")]);
        set.get_mut(&id("m")).unwrap().spotify_playlist_id = Some("spotify-m".to_string());

        let plan = plan_sync(&set).unwrap();
        assert_eq!(step_ids(&plan), [("query", "x"), ("collect", "m")]);
    }

    #[test]
    fn test_leaf_without_spotify_id_fails() {
        let mut set = set_of(&["x"], &["m"], &[("a1", "m", "x")]);
        set.get_mut(&id("x")).unwrap().spotify_playlist_id = None;

        let err = plan_sync(&set).unwrap_err();
        assert!(matches!(err, StackError::MissingSpotifyId { .. }));
    }

    #[test]
    fn test_description_lists_children_with_separators() {
        let set = set_of(
            &["x", "y", "z"],
            &["m"],
            &[("a1", "m", "x"), ("a2", "m", "y"), ("a3", "m", "z")],
        );
        let plan = plan_sync(&set).unwrap();

        let description = plan
            .iter()
            .find_map(|a| match &a.step {
                SyncStep::CreatePlaylist { description, .. } => Some(description.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(
            description,
            "Generated mixstack using mixify. This playlist consists of: \
             Playlist x x Playlist y x Playlist z."
        );
    }

    #[test]
    fn test_description_single_child_ends_with_period() {
        let set = set_of(&["x"], &["m"], &[("a1", "m", "x")]);
        let plan = plan_sync(&set).unwrap();

        let description = plan
            .iter()
            .find_map(|a| match &a.step {
                SyncStep::CreatePlaylist { description, .. } => Some(description.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(
            description,
            "Generated mixstack using mixify. This playlist consists of: Playlist x."
        );
    }

    #[test]
    fn test_playlist_order_drives_sources() {
        let set = {
            let mut set = set_of(
                &["x", "y", "z"],
                &["m"],
                &[("a1", "m", "x"), ("a2", "m", "y"), ("a3", "m", "z")],
            );
            // y first by explicit order, stale entry ignored, rest follow
            let m = set.get_mut(&id("m")).unwrap();
            m.playlist_order = vec![id("y"), id("gone")];
            set
        };
        let plan = plan_sync(&set).unwrap();

        let sources = plan
            .iter()
            .find_map(|a| match &a.step {
                SyncStep::CollectTracks { sources, .. } => Some(sources.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(sources, vec![id("y"), id("x"), id("z")]);
    }

    #[test]
    fn test_merge_dedups_by_first_occurrence() {
        let groups = vec![
            vec![track("t1"), track("t2")],
            vec![track("t2"), track("t3")],
            vec![track("t1")],
        ];
        let merged = merge_track_ids(&groups);
        assert_eq!(merged, vec![track("t1"), track("t2"), track("t3")]);
    }

    #[test]
    fn test_missing_filters_existing() {
        let candidates = vec![track("t1"), track("t2"), track("t3")];
        let existing = vec![track("t2")];
        assert_eq!(
            missing_track_ids(&candidates, &existing),
            vec![track("t1"), track("t3")]
        );
    }

    #[test]
    fn test_batching_respects_api_limit() {
        let tracks: Vec<TrackId> = (0..250).map(|i| track(&format!("t{}", i))).collect();
        let sizes: Vec<usize> = batch_track_ids(&tracks).map(|b| b.len()).collect();
        assert_eq!(sizes, [100, 100, 50]);
    }

    #[test]
    fn test_batching_empty_is_empty() {
        assert_eq!(batch_track_ids(&[]).count(), 0);
    }

    #[test]
    fn test_plan_display_one_line_per_action() {
        let set = set_of(&["x"], &["m"], &[("a1", "m", "x")]);
        let plan = plan_sync(&set).unwrap();

        let text = plan.to_string();
        assert_eq!(text.lines().count(), plan.len());
        assert!(text.contains("query tracks of x"));
        assert!(text.contains("create playlist \"Stack m\" for m"));
    }
}
