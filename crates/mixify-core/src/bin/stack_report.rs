//! Stack report - inspect a snapshot's configuration graph
//!
//! Loads a snapshot (a file given on the command line, or the latest
//! snapshot from the configured store), validates it, and prints a
//! summary, the layer table and the per-stack dependency paths.
//!
//! ## Usage
//!
//! ```text
//! stack-report                      # latest snapshot from the config'd store
//! stack-report export.json          # a specific snapshot file (yaml/json)
//! stack-report --dot graph.gv       # additionally write the Graphviz export
//! ```

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use mixify_core::config;
use mixify_core::dot::to_dot;
use mixify_core::snapshot::{load_snapshot_path, SnapshotStore, StackSnapshot};
use mixify_core::stack::{build_forest, layer_graph, ConfigId, ConfigurationSet, StackGraph};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let mut file: Option<PathBuf> = None;
    let mut dot_path: Option<PathBuf> = None;
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--dot" => {
                let path = args.next().context("--dot needs a file path")?;
                dot_path = Some(PathBuf::from(path));
            }
            "--help" | "-h" => {
                print_usage();
                return Ok(());
            }
            other => file = Some(PathBuf::from(other)),
        }
    }

    let app_config = config::load_config(&config::paths::default_config_path());
    let snapshot = load_snapshot(file, &app_config)?;

    println!(
        "Snapshot {} \"{}\" created {}",
        snapshot.id,
        snapshot.name,
        snapshot.created_at.format("%Y-%m-%d %H:%M:%S")
    );

    let set = snapshot.into_set()?;
    let graph = StackGraph::build(&set)?;

    let mixstacks = set.iter().filter(|c| !graph.children_of(&c.id).is_empty()).count();
    let backed = set.iter().filter(|c| c.spotify_playlist_id.is_some()).count();
    println!(
        "{} playlists, {} mixstacks, {} backed by Spotify",
        set.len(),
        mixstacks,
        backed
    );

    println!("\nTop level:");
    for top in graph.top_level() {
        println!("  {}", describe(&set, top));
    }

    println!("\nLayers:");
    let layers = layer_graph(&graph);
    let shown = app_config.dashboard_depth_limit.unwrap_or(layers.len());
    for layer in layers.iter().take(shown) {
        let row: Vec<String> = layer
            .playlists
            .iter()
            .map(|p| describe(&set, p))
            .collect();
        println!("  depth {}: {}", layer.depth, row.join(" | "));
    }
    if shown < layers.len() {
        println!("  ... {} more layers (dashboard_depth_limit)", layers.len() - shown);
    }

    println!("\nDependency paths:");
    for tree in build_forest(&graph) {
        for path in tree.dependency_paths() {
            let steps: Vec<String> = path.iter().map(|p| describe(&set, p)).collect();
            println!("  {}", steps.join(" -> "));
        }
    }

    if let Some(path) = dot_path {
        let rendered = to_dot(&set)?;
        std::fs::write(&path, rendered)
            .with_context(|| format!("Failed to write DOT file: {:?}", path))?;
        println!("\nWrote DOT export to {:?}", path);
    }

    Ok(())
}

fn load_snapshot(file: Option<PathBuf>, app_config: &config::MixifyConfig) -> Result<StackSnapshot> {
    match file {
        Some(path) => {
            load_snapshot_path(&path).with_context(|| format!("Failed to load {:?}", path))
        }
        None => {
            let store = SnapshotStore::new(&app_config.snapshot_dir);
            match store.latest_id()? {
                Some(id) => Ok(store.load(id)?),
                None => bail!(
                    "No snapshots in {:?}; pass a snapshot file instead",
                    app_config.snapshot_dir
                ),
            }
        }
    }
}

fn describe(set: &ConfigurationSet, id: &ConfigId) -> String {
    set.get(id)
        .map(|c| format!("{} ({})", c.name, c.id))
        .unwrap_or_else(|| id.to_string())
}

fn print_usage() {
    println!("stack-report - inspect a mixify snapshot");
    println!();
    println!("Usage:");
    println!("  stack-report [FILE] [--dot PATH]");
    println!();
    println!("Without FILE, loads the latest snapshot from the configured store.");
}
