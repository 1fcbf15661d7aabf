//! Demo host binary for the Cadence routine engine.
//!
//! Wires the tick scheduler to in-memory stores, loads configuration and
//! (optionally) world content from YAML, and drives a bounded tick loop
//! over the sample harbor-town roster, logging what each NPC decides.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load engine configuration from `cadence-config.yaml`
//! 3. Load world content from `CADENCE_WORLD` (YAML) or build the sample
//! 4. Publish (validate) the world content
//! 5. Create the tick scheduler over in-memory stores
//! 6. Run the bounded tick loop
//! 7. Log the final session states and drained generation requests

mod error;
mod sample;

use std::path::Path;
use std::sync::Arc;

use cadence_core::condition::ConditionEvaluator;
use cadence_core::stores::{
    CollectingGenerationSink, InMemoryMoodStore, InMemoryRelationshipStore,
};
use cadence_core::{EngineConfig, TickScheduler, publish};
use cadence_types::SessionId;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;

/// World seconds advanced per demo tick (half an hour).
const TICK_STEP_SECS: u64 = 1_800;

/// Number of ticks the demo runs (two world days).
const TICK_COUNT: u64 = 96;

/// World time the demo starts at (06:00 on day one).
const START_SECS: u64 = 21_600;

/// Application entry point for the demo host.
///
/// # Errors
///
/// Returns an error if configuration loading, world validation, or a
/// tick setup fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("cadence-engine starting");

    // 2. Load engine configuration.
    let config = load_config()?;
    info!(
        world_name = config.world.name,
        seed = config.world.seed,
        day_length_secs = config.world.day_length_secs,
        hop_limit = config.resolve.hop_limit,
        "Configuration loaded"
    );

    // 3. World content: an external YAML file, or the built-in sample.
    let day_length = config.world.day_length_secs;
    let (document, roster) = match std::env::var("CADENCE_WORLD") {
        Ok(path) => {
            info!(path, "Loading world content from file");
            let contents = std::fs::read_to_string(Path::new(&path)).map_err(EngineError::from)?;
            let document = serde_yml::from_str(&contents).map_err(EngineError::from)?;
            // A file-supplied world still drives the sample roster.
            let sample = sample::build();
            (document, sample.roster)
        }
        Err(_) => {
            let sample = sample::build();
            (sample.document, sample.roster)
        }
    };

    // 4. Publish (validate) the world.
    let world = Arc::new(publish(document, day_length).map_err(EngineError::from)?);
    info!(
        activities = world.catalog.len(),
        routines = world.routines.len(),
        npcs = roster.len(),
        "World published"
    );

    // 5. Scheduler over in-memory stores.
    let generation = Arc::new(CollectingGenerationSink::new());
    let mut scheduler = TickScheduler::new(
        config,
        ConditionEvaluator::new(),
        Arc::new(InMemoryRelationshipStore::new()),
        Arc::new(InMemoryMoodStore::new()),
        Arc::clone(&generation) as Arc<dyn cadence_core::GenerationSink>,
    );
    let session = SessionId::new();
    info!(%session, "Session opened");

    // 6. The bounded tick loop.
    for tick in 0..TICK_COUNT {
        let world_time = START_SECS.saturating_add(tick.saturating_mul(TICK_STEP_SECS));
        let summary = scheduler
            .run_tick(session, world_time, &roster, &world)
            .await
            .map_err(EngineError::from)?;

        for (npc, activity) in &summary.selections {
            info!(%npc, %activity, world_time, "selection");
        }
        for request in generation.drain() {
            info!(
                npc = %request.npc_id,
                activity = %request.activity_id,
                scene_intent = request.scene_intent,
                "generation request emitted"
            );
        }
    }

    // 7. Final state report.
    for handle in &roster {
        if let Some(state) = scheduler.session_state(session, handle.npc_id) {
            info!(
                npc = %handle.npc_id,
                activity = ?state.current_activity,
                energy = %state.energy,
                cooldowns = state.cooldowns.len(),
                "final session state"
            );
        }
    }

    info!("cadence-engine finished");
    Ok(())
}

/// Load engine configuration from `cadence-config.yaml` when present,
/// falling back to defaults.
fn load_config() -> Result<EngineConfig, EngineError> {
    let path = Path::new("cadence-config.yaml");
    if path.exists() {
        Ok(EngineConfig::from_file(path)?)
    } else {
        info!("cadence-config.yaml not found; using defaults");
        Ok(EngineConfig::default())
    }
}
