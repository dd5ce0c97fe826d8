//! Operator commands for Theta save files.
//!
//! Stands in for the application's status surface: a save/load smoke test
//! over a small demo world, inspection of an existing save, and the
//! recent-saves listing.

pub mod demo;
pub mod report;

use anyhow::{Context, Result, ensure};
use std::collections::BTreeMap;
use theta_storage::{SaveId, SaveStore, SaveSummary};
use tracing::info;

pub use report::{InspectReport, SmokeReport};

/// Builds the demo world, saves it, clears the registry, loads the save
/// back and checks that every entity and reference survived.
pub async fn smoke(store: &SaveStore, count: usize) -> Result<SmokeReport> {
    let registry = store.registry();
    let world = demo::build_world(registry, count).context("failed to build demo world")?;
    let before = registry.snapshot();
    let saved = registry.stats();
    info!(
        "Demo world: {} players, {} monsters, party {}",
        world.players.len(),
        world.monsters.len(),
        world.party
    );

    let id = store.save_async().await.context("save failed")?;
    let size_bytes = std::fs::metadata(store.path_of(&id))
        .with_context(|| format!("save {id} missing after write"))?
        .len();

    registry.clear_state();
    let loaded = store
        .load_async(id.as_str())
        .await
        .with_context(|| format!("load of {id} failed"))?;

    ensure!(
        registry.snapshot() == before,
        "reloaded registry differs from the saved one"
    );
    let cycles_verified = demo::verify_world(registry, &world)?;

    Ok(SmokeReport {
        id,
        size_bytes,
        saved,
        loaded,
        cycles_verified,
    })
}

/// Loads `id` into the store's registry and summarizes its contents.
pub fn inspect(store: &SaveStore, id: &str) -> Result<InspectReport> {
    let stats = store
        .load(id)
        .with_context(|| format!("failed to load save {id}"))?;
    let mut types: BTreeMap<String, usize> = BTreeMap::new();
    for entity in store.registry().live_entities() {
        *types.entry(entity.type_name().to_string()).or_default() += 1;
    }
    Ok(InspectReport {
        id: SaveId::parse(id)?,
        stats,
        types,
    })
}

/// Recent saves, newest first.
pub fn list(store: &SaveStore, limit: Option<usize>) -> Result<Vec<SaveSummary>> {
    let saves = match limit {
        Some(limit) => store.list_recent(limit),
        None => store.recent(),
    };
    saves.with_context(|| format!("failed to list {}", store.data_dir().display()))
}
