//! Sync plan - print the steps that would bring every mixstack up to date
//!
//! Plans against a snapshot without touching Spotify: children first,
//! shared playlists once, create-then-collect per mixstack.
//!
//! ## Usage
//!
//! ```text
//! sync-plan                     # latest snapshot from the config'd store
//! sync-plan export.json         # a specific snapshot file (yaml/json)
//! ```

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use mixify_core::config;
use mixify_core::plan::plan_sync;
use mixify_core::snapshot::{load_snapshot_path, SnapshotStore, StackSnapshot};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let mut file: Option<PathBuf> = None;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--help" | "-h" => {
                println!("sync-plan - print the sync steps for a mixify snapshot");
                println!();
                println!("Usage:");
                println!("  sync-plan [FILE]");
                return Ok(());
            }
            other => file = Some(PathBuf::from(other)),
        }
    }

    let app_config = config::load_config(&config::paths::default_config_path());
    let snapshot = load_snapshot(file, &app_config)?;

    println!("Sync plan for snapshot {} \"{}\":", snapshot.id, snapshot.name);

    let set = snapshot.into_set()?;
    let plan = plan_sync(&set)?;
    if plan.is_empty() {
        println!("Nothing to do.");
    } else {
        print!("{}", plan);
        println!("{} actions.", plan.len());
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
