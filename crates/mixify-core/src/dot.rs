//! Graphviz export of the configuration forest
//!
//! Renders the association graph as DOT text: one node per configuration,
//! one edge per association, drawn child -> parent so an arrow reads
//! "feeds into". Backed playlists carry a URL attribute pointing at
//! Spotify, so a rendered SVG links straight to the playlist.

use std::collections::HashSet;

use crate::stack::{ConfigId, ConfigurationSet, StackGraph, StackResult};

/// Escape for a double-quoted DOT string
fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Validate a set and render it as DOT.
///
/// Nodes come in set order, edges in owner-list order; a mirrored or
/// duplicated association renders as a single arrow.
pub fn to_dot(set: &ConfigurationSet) -> StackResult<String> {
    let graph = StackGraph::build(set)?;

    let mut out = String::from("digraph mixify {\n");
    for config in set.iter() {
        let mut attrs = vec![format!("label=\"{}\"", escape(&config.name))];
        if let Some(spotify_id) = &config.spotify_playlist_id {
            attrs.push(format!(
                "URL=\"https://open.spotify.com/playlist/{}\"",
                escape(spotify_id)
            ));
        }
        out.push_str(&format!(
            "    \"{}\" [{}];\n",
            escape(config.id.as_str()),
            attrs.join(", ")
        ));
    }

    let mut seen: HashSet<(&ConfigId, &ConfigId)> = HashSet::new();
    let mut wrote_gap = false;
    for (parent, child) in graph.edges() {
        if seen.insert((parent, child)) {
            if !wrote_gap {
                out.push('\n');
                wrote_gap = true;
            }
            out.push_str(&format!(
                "    \"{}\" -> \"{}\";\n",
                escape(child.as_str()),
                escape(parent.as_str())
            ));
        }
    }

    out.push_str("}\n");
    Ok(out)
}
