//! Validated association graph over a configuration set
//!
//! `StackGraph::build` validates eagerly, before any traversal:
//! - every association endpoint must resolve to a configuration in the set
//! - the edge set must be acyclic, ignoring self-edges
//!
//! Validation covers the whole graph, including subgraphs not reachable
//! from any top-level configuration; a detached cycle is still an error,
//! not silently-empty output. The validated graph precomputes adjacency
//! and the top-level ids so layering, tree building and planning never
//! re-derive them.

use std::collections::{HashMap, HashSet};

use super::{ConfigId, ConfigurationSet, PlaylistConfiguration, StackError, StackResult};

/// Node state for the cycle scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    OnPath,
    Done,
}

/// A validated view over a configuration set.
///
/// Children are kept in the order of the owning configuration's own
/// association list; a duplicated association entry yields a duplicated
/// child on purpose (the layer view shows one entry per reaching path).
#[derive(Debug)]
pub struct StackGraph<'a> {
    set: &'a ConfigurationSet,
    children: HashMap<ConfigId, Vec<ConfigId>>,
    top_level: Vec<ConfigId>,
}

impl<'a> StackGraph<'a> {
    /// Validate a configuration set and build the graph view
    pub fn build(set: &'a ConfigurationSet) -> StackResult<StackGraph<'a>> {
        // Dangling scan: every named endpoint must exist, including
        // endpoints of half-filled or mirrored association copies
        for config in set.iter() {
            for association in &config.associations {
                for endpoint in association.endpoints() {
                    if !set.contains(endpoint) {
                        return Err(StackError::DanglingAssociation {
                            association: association.id.clone(),
                            missing: endpoint.clone(),
                        });
                    }
                }
            }
        }

        // Adjacency from each owner's own list; the child-side mirror of a
        // resolved association never produces a second edge
        let mut children: HashMap<ConfigId, Vec<ConfigId>> = HashMap::new();
        for config in set.iter() {
            let kids: Vec<ConfigId> = config
                .associations
                .iter()
                .filter_map(|a| a.child_from(&config.id))
                .cloned()
                .collect();
            children.insert(config.id.clone(), kids);
        }

        // Child-role scan is global: an edge recorded only in the child's
        // list still disqualifies that child from the top level
        let mut child_role: HashSet<&ConfigId> = HashSet::new();
        for config in set.iter() {
            for association in &config.associations {
                if let (Some(parent), Some(child)) =
                    (&association.parent_id, &association.child_id)
                {
                    if parent != child {
                        child_role.insert(child);
                    }
                }
            }
        }
        let top_level: Vec<ConfigId> = set
            .iter()
            .filter(|c| !child_role.contains(&c.id))
            .map(|c| c.id.clone())
            .collect();

        let graph = StackGraph {
            set,
            children,
            top_level,
        };
        graph.check_cycles()?;
        Ok(graph)
    }

    /// The configuration set this graph was built from
    pub fn set(&self) -> &'a ConfigurationSet {
        self.set
    }

    /// Child ids of a configuration, in association-list order.
    /// Unknown ids have no children.
    pub fn children_of(&self, id: &ConfigId) -> &[ConfigId] {
        self.children.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Ids that play the child role in no association, in set order.
    /// An isolated configuration (no associations) is top-level.
    pub fn top_level(&self) -> &[ConfigId] {
        &self.top_level
    }

    pub fn is_top_level(&self, id: &ConfigId) -> bool {
        self.top_level.iter().any(|t| t == id)
    }

    /// All traversable (parent, child) edges, in set order then
    /// association-list order. Mirrored copies are not repeated here, but
    /// a genuinely duplicated entry in a parent's list is.
    pub fn edges(&self) -> impl Iterator<Item = (&ConfigId, &ConfigId)> {
        self.set.iter().flat_map(|config| {
            config
                .associations
                .iter()
                .filter_map(move |a| a.child_from(&config.id).map(|child| (&config.id, child)))
        })
    }

    /// Look up a configuration, erroring on an unknown id
    pub fn config(&self, id: &ConfigId) -> StackResult<&'a PlaylistConfiguration> {
        self.set
            .get(id)
            .ok_or_else(|| StackError::UnknownConfiguration { id: id.clone() })
    }

    /// Parent ids of a configuration, global scan in set order
    pub fn parents_of(&self, id: &ConfigId) -> Vec<ConfigId> {
        let mut parents = Vec::new();
        for config in self.set.iter() {
            for association in &config.associations {
                if let (Some(parent), Some(child)) =
                    (&association.parent_id, &association.child_id)
                {
                    if child == id && parent != child && !parents.contains(parent) {
                        parents.push(parent.clone());
                    }
                }
            }
        }
        parents
    }

    /// DFS coloring over the whole graph; self-edges are already absent
    /// from the adjacency, so only multi-node cycles can trip this
    fn check_cycles(&self) -> StackResult<()> {
        let mut state: HashMap<&ConfigId, Mark> = HashMap::new();
        let mut path: Vec<ConfigId> = Vec::new();
        for id in self.set.ids() {
            if state.get(id).copied().unwrap_or(Mark::Unvisited) == Mark::Unvisited {
                self.visit(id, &mut state, &mut path)?;
            }
        }
        Ok(())
    }

    fn visit<'s>(
        &'s self,
        id: &'s ConfigId,
        state: &mut HashMap<&'s ConfigId, Mark>,
        path: &mut Vec<ConfigId>,
    ) -> StackResult<()> {
        state.insert(id, Mark::OnPath);
        path.push(id.clone());

        for child in self.children_of(id) {
            match state.get(child).copied().unwrap_or(Mark::Unvisited) {
                Mark::OnPath => {
                    let start = path.iter().position(|p| p == child).unwrap_or(0);
                    let route: Vec<&str> =
                        path[start..].iter().map(|p| p.as_str()).collect();
                    return Err(StackError::CyclicStack {
                        id: child.clone(),
                        path: format!("{} -> {}", route.join(" -> "), child),
                    });
                }
                Mark::Done => {}
                Mark::Unvisited => self.visit(child, state, path)?,
            }
        }

        path.pop();
        state.insert(id, Mark::Done);
        Ok(())
    }
}
