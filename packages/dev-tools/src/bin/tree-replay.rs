//! Drag Scenario Replay Binary
//!
//! Replays a recorded sequence of drag events against a tree snapshot and
//! prints the resulting tree, the drop resolutions, the persistence calls and
//! the broadcast events as JSON. Useful for reproducing a drag bug report
//! without a UI.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin tree-replay -- scenario.json
//!
//! # With a config file and debug logs
//! RUST_LOG=debug cargo run --bin tree-replay -- scenario.json config.json
//! ```
//!
//! # Scenario Format
//!
//! ```json
//! {
//!   "snapshot": { "folders": [...], "notes": [...] },
//!   "events": [
//!     { "type": "start", "activeId": "n1", "pointer": { "x": 0, "y": 0 } },
//!     { "type": "end", "delta": { "x": 0, "y": 40 }, "collisions": [{ "id": "n2" }] }
//!   ],
//!   "rejectPersistence": false
//! }
//! ```
//!
//! # Environment Variables
//!
//! - `NOTETREE_FOLDER_DROP_PREFIX`, `NOTETREE_ROOT_ZONE_ID`,
//!   `NOTETREE_ROLLBACK_ON_FAILURE`, `NOTETREE_MAX_DEPTH`,
//!   `NOTETREE_EVENT_CHANNEL_CAPACITY`: override the matching config field
//! - `RUST_LOG`: Logging level (e.g., "info", "debug", "trace")

use std::env;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use notetree_core::{
    DragEvent, DropResolution, ExplorerConfig, FileExplorer, PersistRequest, PersistenceError,
    RecordingPersistence, TreeEvent, TreeSnapshot, TreeView,
};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Scenario {
    snapshot: TreeSnapshot,
    #[serde(default)]
    events: Vec<DragEvent>,
    /// Fail every persistence call, to exercise rollback
    #[serde(default)]
    reject_persistence: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReplayReport {
    resolutions: Vec<DropResolution>,
    persisted: Vec<PersistRequest>,
    events: Vec<TreeEvent>,
    tree: TreeView,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut args = env::args().skip(1);
    let scenario_path = args
        .next()
        .ok_or_else(|| anyhow::anyhow!("usage: tree-replay <scenario.json> [config.json]"))?;
    let config = load_config(args.next().as_deref())?;

    let raw = tokio::fs::read_to_string(&scenario_path)
        .await
        .with_context(|| format!("Failed to read scenario {}", scenario_path))?;
    let scenario: Scenario = serde_json::from_str(&raw).context("Invalid scenario JSON")?;

    tracing::info!(
        "Replaying {} event(s) from {}",
        scenario.events.len(),
        scenario_path
    );

    let report = replay(scenario, config).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Config file (if any), then `NOTETREE_*` overrides, then validation
fn load_config(path: Option<&str>) -> anyhow::Result<ExplorerConfig> {
    let mut config = match path {
        Some(path) => {
            let raw = std::fs::read_to_string(Path::new(path))
                .with_context(|| format!("Failed to read config {}", path))?;
            ExplorerConfig::from_json(&raw)?
        }
        None => ExplorerConfig::default(),
    };

    if let Ok(prefix) = env::var("NOTETREE_FOLDER_DROP_PREFIX") {
        config.folder_drop_prefix = prefix;
    }
    if let Ok(zone) = env::var("NOTETREE_ROOT_ZONE_ID") {
        config.root_zone_id = zone;
    }
    if let Some(rollback) = env_parsed::<bool>("NOTETREE_ROLLBACK_ON_FAILURE")? {
        config.rollback_on_failure = rollback;
    }
    if let Some(depth) = env_parsed::<usize>("NOTETREE_MAX_DEPTH")? {
        config.max_depth = depth;
    }
    if let Some(capacity) = env_parsed::<usize>("NOTETREE_EVENT_CHANNEL_CAPACITY")? {
        config.event_channel_capacity = capacity;
    }

    config.validate()?;
    Ok(config)
}

fn env_parsed<T>(name: &str) -> anyhow::Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map(Some)
            .map_err(|e| anyhow::anyhow!("Invalid {}='{}': {}", name, raw, e)),
        Err(_) => Ok(None),
    }
}

async fn replay(scenario: Scenario, config: ExplorerConfig) -> anyhow::Result<ReplayReport> {
    let persistence = RecordingPersistence::new();
    let mut explorer = FileExplorer::new(scenario.snapshot, Arc::new(persistence.clone()), config)?;
    let mut rx = explorer.subscribe();

    let mut resolutions = Vec::new();
    let mut events = Vec::new();
    for event in scenario.events {
        let Some(end) = explorer.handle(event)? else {
            continue;
        };
        if let Some(job) = end.job {
            if scenario.reject_persistence {
                persistence.fail_next(PersistenceError::rejected(
                    job.request.describe(),
                    "rejected by scenario",
                ));
            }
            if let Err(e) = explorer.dispatcher().persist(job).await {
                tracing::warn!("Persistence failed: {}", e);
            }
        }
        resolutions.push(end.resolution);
        drain(&mut rx, &mut events);
    }

    Ok(ReplayReport {
        resolutions,
        persisted: persistence.calls(),
        events,
        tree: explorer.view(),
    })
}

fn drain(rx: &mut broadcast::Receiver<TreeEvent>, into: &mut Vec<TreeEvent>) {
    loop {
        match rx.try_recv() {
            Ok(event) => into.push(event),
            Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                tracing::warn!("Event log skipped {} event(s)", skipped);
            }
            Err(_) => break,
        }
    }
}
