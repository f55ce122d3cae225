//! Depth-layering engine for the mixstack dashboard
//!
//! Turns the configuration forest into rows: layer 0 holds the top-level
//! configurations, layer 1 their direct children, and so on:
//!
//! ```text
//!   depth 0:   [Best lofi eu]        [Copy of Second best]
//!                 /       \                   |
//!   depth 1:  [Top 30]  [Generic]      [Second best eu]
//! ```
//!
//! A configuration reachable over several association paths appears once
//! per path; the dashboard shows every place a playlist is stacked, so
//! nothing is deduplicated here.

use super::{ConfigId, ConfigurationSet, StackGraph, StackResult};

/// One depth row of the layered view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layer {
    /// 0 = top level, increasing towards the leaves
    pub depth: usize,
    /// Configuration ids at this depth, in visit order, duplicates kept
    pub playlists: Vec<ConfigId>,
}

/// Validate a configuration set and layer it in one call.
///
/// Fails on dangling associations and on cyclic graphs; an empty set
/// yields an empty layer sequence.
pub fn layer_stacks(set: &ConfigurationSet) -> StackResult<Vec<Layer>> {
    let graph = StackGraph::build(set)?;
    Ok(layer_graph(&graph))
}

/// Layer an already-validated graph.
///
/// Depth-first from a virtual root whose children are the top-level
/// configurations; the root's own layer is dropped, so the caller sees
/// depth 0 = top level. Depths are contiguous by construction: a bucket
/// is appended exactly when the traversal first reaches its depth.
pub fn layer_graph(graph: &StackGraph<'_>) -> Vec<Layer> {
    let mut buckets: Vec<Vec<ConfigId>> = Vec::new();
    for top in graph.top_level() {
        descend(graph, top, 0, &mut buckets);
    }
    buckets
        .into_iter()
        .enumerate()
        .map(|(depth, playlists)| Layer { depth, playlists })
        .collect()
}

fn descend(
    graph: &StackGraph<'_>,
    id: &ConfigId,
    depth: usize,
    buckets: &mut Vec<Vec<ConfigId>>,
) {
    if buckets.len() == depth {
        buckets.push(Vec::new());
    }
    buckets[depth].push(id.clone());
    for child in graph.children_of(id) {
        descend(graph, child, depth + 1, buckets);
    }
}
