//! Materialized build trees for mixstacks
//!
//! Where the layer view flattens the forest into depth rows, the build
//! tree keeps each top-level stack whole: one tree per top-level
//! configuration, shared children repeated in every subtree that uses
//! them. The sync planner and the report tools walk these.

use super::{ConfigId, StackGraph};

/// One node of a mixstack build tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackNode {
    pub id: ConfigId,
    /// Subtrees in association-list order; empty for plain playlists
    pub children: Vec<StackNode>,
}

/// Build one tree per top-level configuration, in top-level order.
///
/// Only called with a validated graph, so construction cannot loop;
/// duplicate entries in a parent's association list yield duplicate
/// subtrees, matching the layer view.
pub fn build_forest(graph: &StackGraph<'_>) -> Vec<StackNode> {
    graph
        .top_level()
        .iter()
        .map(|top| build_node(graph, top))
        .collect()
}

fn build_node(graph: &StackGraph<'_>, id: &ConfigId) -> StackNode {
    StackNode {
        id: id.clone(),
        children: graph
            .children_of(id)
            .iter()
            .map(|child| build_node(graph, child))
            .collect(),
    }
}

impl StackNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Total node count, duplicates included
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(StackNode::count).sum::<usize>()
    }

    /// Every root-to-leaf id path through this tree, in depth-first order.
    /// A childless tree yields its own id as the single path.
    pub fn dependency_paths(&self) -> Vec<Vec<ConfigId>> {
        let mut paths = Vec::new();
        let mut current = Vec::new();
        self.collect_paths(&mut current, &mut paths);
        paths
    }

    fn collect_paths(&self, current: &mut Vec<ConfigId>, paths: &mut Vec<Vec<ConfigId>>) {
        current.push(self.id.clone());
        if self.children.is_empty() {
            paths.push(current.clone());
        } else {
            for child in &self.children {
                child.collect_paths(current, paths);
            }
        }
        current.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stack::{
        AssociationId, ConfigurationSet, PlaylistAssociation, PlaylistConfiguration,
    };

    fn id(s: &str) -> ConfigId {
        ConfigId::new(s)
    }

    fn set_of(nodes: &[&str], edges: &[(&str, &str, &str)]) -> ConfigurationSet {
        let mut set = ConfigurationSet::new();
        for node in nodes {
            set.insert(PlaylistConfiguration::new(id(node), *node)).unwrap();
        }
        for (a, parent, child) in edges {
            let assoc =
                PlaylistAssociation::new(AssociationId::new(*a), Some(id(parent)), Some(id(child)));
            set.get_mut(&id(parent)).unwrap().associations.push(assoc);
        }
        set
    }

    fn path_strs(paths: &[Vec<ConfigId>]) -> Vec<Vec<&str>> {
        paths
            .iter()
            .map(|p| p.iter().map(|c| c.as_str()).collect())
            .collect()
    }

    #[test]
    fn test_forest_follows_top_level_order() {
        let set = set_of(
            &["r1", "r2", "c1"],
            &[("a1", "r1", "c1"), ("a2", "r2", "c1")],
        );
        let graph = StackGraph::build(&set).unwrap();
        let forest = build_forest(&graph);

        let roots: Vec<&str> = forest.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(roots, ["r1", "r2"]);
    }

    #[test]
    fn test_shared_child_repeated_per_tree() {
        let set = set_of(
            &["r1", "r2", "p1"],
            &[("a1", "r1", "p1"), ("a2", "r2", "p1")],
        );
        let graph = StackGraph::build(&set).unwrap();
        let forest = build_forest(&graph);

        assert_eq!(forest[0].children[0].id, id("p1"));
        assert_eq!(forest[1].children[0].id, id("p1"));
        assert_eq!(forest[0].count() + forest[1].count(), 4);
    }

    #[test]
    fn test_single_node_has_single_path() {
        let set = set_of(&["solo"], &[]);
        let graph = StackGraph::build(&set).unwrap();
        let forest = build_forest(&graph);

        assert_eq!(path_strs(&forest[0].dependency_paths()), [["solo"]]);
    }

    #[test]
    fn test_dependency_paths_cover_every_leaf() {
        // r -> m -> (x, y); r -> z
        let set = set_of(
            &["r", "m", "x", "y", "z"],
            &[
                ("a1", "r", "m"),
                ("a2", "m", "x"),
                ("a3", "m", "y"),
                ("a4", "r", "z"),
            ],
        );
        let graph = StackGraph::build(&set).unwrap();
        let forest = build_forest(&graph);

        assert_eq!(
            path_strs(&forest[0].dependency_paths()),
            [
                vec!["r", "m", "x"],
                vec!["r", "m", "y"],
                vec!["r", "z"],
            ]
        );
    }

    #[test]
    fn test_count_includes_duplicates() {
        // diamond: r -> a -> d, r -> b -> d
        let set = set_of(
            &["r", "a", "b", "d"],
            &[
                ("a1", "r", "a"),
                ("a2", "r", "b"),
                ("a3", "a", "d"),
                ("a4", "b", "d"),
            ],
        );
        let graph = StackGraph::build(&set).unwrap();
        let forest = build_forest(&graph);

        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].count(), 5);
        assert_eq!(
            path_strs(&forest[0].dependency_paths()),
            [vec!["r", "a", "d"], vec!["r", "b", "d"]]
        );
    }
}
