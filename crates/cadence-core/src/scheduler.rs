//! The tick scheduler: deciding who gets re-evaluated, and running them.
//!
//! Each tick, the scheduler walks the host-supplied roster, skips NPCs
//! whose tier interval has not elapsed since their last evaluation, and
//! runs the resolve->apply pipeline for the rest. The active tier runs
//! synchronously in roster order (lowest latency to the player-facing
//! path); the background tier fans out on a tokio [`JoinSet`], each task
//! owning its NPC's session state for the duration (the arena is keyed
//! by `(session, npc)`, so workers never share a record).
//!
//! Isolation is per NPC: a routine lookup miss or traversal failure
//! degrades that one NPC to idle for the tick, logs at warn, and leaves
//! everyone else untouched. Nothing in here is fatal to the host.
//!
//! A tick may be abandoned mid-flight when a newer world-time tick
//! supersedes it: [`TickControl::supersede`] bumps an epoch counter the
//! scheduler checks between NPCs. Not-yet-processed NPCs are simply
//! skipped -- their state is untouched and the next tick picks them up.
//!
//! Randomness is derived per evaluation from
//! `(world seed, session, npc, world time)` with SplitMix64-style
//! mixing, so any NPC's decision stream replays identically regardless
//! of roster order or which tier it lands in.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use cadence_types::{
    ActivityId, GenerationRequest, LocationKind, NpcId, NpcSessionState, PreferenceLayer,
    RoutineId, SessionId, SimulationTier,
};

use crate::clock::{ClockError, WorldClock};
use crate::condition::ConditionEvaluator;
use crate::config::EngineConfig;
use crate::effects;
use crate::preferences::resolve_preferences;
use crate::resolver::{Decision, ResolveContext, choose_activity};
use crate::stores::{GenerationSink, MoodStore, RelationshipStore};
use crate::world::WorldConfigSet;

/// Errors that can occur setting up a tick.
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    /// The world clock could not be constructed.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },
}

/// One NPC as the host presents it to the scheduler each tick.
///
/// Tier assignment and location tracking are host concerns; the
/// scheduler only consumes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NpcHandle {
    /// The NPC.
    pub npc_id: NpcId,
    /// The routine archetype assigned to this NPC.
    pub routine_id: RoutineId,
    /// Scheduling tier (by proximity/relevance to the player).
    pub tier: SimulationTier,
    /// Concrete place key, used only for co-presence grouping.
    pub location: String,
    /// The kind of place the NPC is at, used by activity requirements.
    pub location_kind: LocationKind,
    /// Per-session preference overrides (the strongest merge layer).
    #[serde(default)]
    pub session_preferences: PreferenceLayer,
}

/// What happened to one NPC during a tick.
#[derive(Debug, Clone, PartialEq, Eq)]
enum NpcOutcome {
    /// Commitment window still open.
    Held,
    /// A fresh activity was selected.
    Selected(ActivityId),
    /// Fallback: kept previous or went idle.
    Idled,
    /// Pipeline failure; degraded for this tick.
    Degraded,
}

/// Summary of one tick's execution.
#[derive(Debug, Clone, Default)]
pub struct TickSummary {
    /// The world time this tick ran at.
    pub world_time_secs: u64,
    /// NPCs whose pipeline ran (held + selected + idled + degraded).
    pub evaluated: u32,
    /// NPCs skipped because their tier interval had not elapsed.
    pub skipped: u32,
    /// NPCs still inside their commitment window.
    pub held: u32,
    /// NPCs that fell back to idle or kept their previous activity.
    pub idled: u32,
    /// Fresh selections made this tick.
    pub selections: BTreeMap<NpcId, ActivityId>,
    /// NPCs degraded by a pipeline failure.
    pub degraded: Vec<NpcId>,
    /// Generation requests emitted.
    pub generation_requests: u32,
    /// True if the tick was superseded and abandoned before finishing.
    pub abandoned: bool,
}

/// Handle for superseding an in-flight tick from another task.
#[derive(Debug, Clone)]
pub struct TickControl {
    epoch: Arc<AtomicU64>,
}

impl TickControl {
    /// Mark any in-flight tick as stale. The scheduler stops before the
    /// next unprocessed NPC; already-running background tasks complete
    /// and write back normally.
    pub fn supersede(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
    }
}

/// The tick scheduler: owns the session-state arena and drives
/// resolve->apply for every due NPC.
pub struct TickScheduler {
    config: EngineConfig,
    evaluator: Arc<ConditionEvaluator>,
    relationships: Arc<dyn RelationshipStore>,
    moods: Arc<dyn MoodStore>,
    generation: Arc<dyn GenerationSink>,
    /// Flat arena: one record per (session, npc), owned exclusively by
    /// one worker at a time.
    states: BTreeMap<(SessionId, NpcId), NpcSessionState>,
    /// World time of each NPC's last evaluation, for interval gating.
    last_evaluated: BTreeMap<(SessionId, NpcId), u64>,
    /// Tick epoch for supersession.
    epoch: Arc<AtomicU64>,
}

impl TickScheduler {
    /// Create a scheduler over the given stores.
    pub fn new(
        config: EngineConfig,
        evaluator: ConditionEvaluator,
        relationships: Arc<dyn RelationshipStore>,
        moods: Arc<dyn MoodStore>,
        generation: Arc<dyn GenerationSink>,
    ) -> Self {
        Self {
            config,
            evaluator: Arc::new(evaluator),
            relationships,
            moods,
            generation,
            states: BTreeMap::new(),
            last_evaluated: BTreeMap::new(),
            epoch: Arc::new(AtomicU64::new(0)),
        }
    }

    /// A handle for superseding in-flight ticks.
    pub fn control(&self) -> TickControl {
        TickControl {
            epoch: Arc::clone(&self.epoch),
        }
    }

    /// Read one NPC's session state, if it exists yet.
    pub fn session_state(&self, session: SessionId, npc: NpcId) -> Option<&NpcSessionState> {
        self.states.get(&(session, npc))
    }

    /// Install a session record (e.g. restored from external storage).
    pub fn set_session_state(&mut self, session: SessionId, npc: NpcId, state: NpcSessionState) {
        self.states.insert((session, npc), state);
    }

    /// Iterate all session records for one session, for persistence at
    /// tick end (storage itself is the host's concern).
    pub fn session_states(
        &self,
        session: SessionId,
    ) -> impl Iterator<Item = (NpcId, &NpcSessionState)> {
        self.states
            .iter()
            .filter(move |((s, _), _)| *s == session)
            .map(|((_, npc), state)| (*npc, state))
    }

    /// Drop all records belonging to a session that ended.
    pub fn remove_session(&mut self, session: SessionId) {
        self.states.retain(|(s, _), _| *s != session);
        self.last_evaluated.retain(|(s, _), _| *s != session);
    }

    /// Run one tick over the roster.
    ///
    /// # Errors
    ///
    /// Returns [`TickError`] only for setup failures (a malformed
    /// clock); per-NPC failures degrade that NPC and are reported in
    /// the summary instead.
    pub async fn run_tick(
        &mut self,
        session_id: SessionId,
        world_time_secs: u64,
        roster: &[NpcHandle],
        world: &Arc<WorldConfigSet>,
    ) -> Result<TickSummary, TickError> {
        let clock = WorldClock::new(world_time_secs, self.config.world.day_length_secs)?;
        // Starting a tick supersedes any still-running predecessor.
        let my_epoch = self.epoch.fetch_add(1, Ordering::SeqCst).saturating_add(1);

        let mut summary = TickSummary {
            world_time_secs,
            ..TickSummary::default()
        };

        // Co-presence: who is at each place.
        let mut presence: BTreeMap<&str, BTreeSet<NpcId>> = BTreeMap::new();
        for handle in roster {
            presence
                .entry(handle.location.as_str())
                .or_default()
                .insert(handle.npc_id);
        }

        // Partition into due active / due background.
        let mut active: Vec<&NpcHandle> = Vec::new();
        let mut background: Vec<&NpcHandle> = Vec::new();
        for handle in roster {
            let key = (session_id, handle.npc_id);
            let interval = self.config.tiers.interval_secs(handle.tier);
            let due = self.last_evaluated.get(&key).is_none_or(|last| {
                world_time_secs.saturating_sub(*last) >= interval
            });
            if !due {
                summary.skipped = summary.skipped.saturating_add(1);
                continue;
            }
            match handle.tier {
                SimulationTier::Active => active.push(handle),
                SimulationTier::Background => background.push(handle),
            }
        }

        // --- Active tier: synchronous, roster order. ---
        for handle in active {
            if self.epoch.load(Ordering::SeqCst) != my_epoch {
                summary.abandoned = true;
                break;
            }
            let present = present_for(&presence, handle);
            let key = (session_id, handle.npc_id);
            let mut state = self
                .states
                .remove(&key)
                .unwrap_or_else(|| NpcSessionState::new(world_time_secs));

            let outcome = evaluate_npc(
                session_id,
                handle,
                &clock,
                &mut state,
                &present,
                world,
                &self.evaluator,
                self.relationships.as_ref(),
                self.moods.as_ref(),
                self.generation.as_ref(),
                &self.config,
                &mut summary.generation_requests,
            );

            self.states.insert(key, state);
            self.last_evaluated.insert(key, world_time_secs);
            record_outcome(&mut summary, handle.npc_id, outcome);
        }

        // --- Background tier: concurrent, each task owning its state. ---
        if !summary.abandoned {
            let mut join_set: JoinSet<((SessionId, NpcId), NpcSessionState, NpcOutcome, u32)> =
                JoinSet::new();

            for handle in background {
                if self.epoch.load(Ordering::SeqCst) != my_epoch {
                    summary.abandoned = true;
                    break;
                }
                let key = (session_id, handle.npc_id);
                let mut state = self
                    .states
                    .remove(&key)
                    .unwrap_or_else(|| NpcSessionState::new(world_time_secs));
                let present = present_for(&presence, handle);
                let handle = handle.clone();
                let world = Arc::clone(world);
                let evaluator = Arc::clone(&self.evaluator);
                let relationships = Arc::clone(&self.relationships);
                let moods = Arc::clone(&self.moods);
                let generation = Arc::clone(&self.generation);
                let config = self.config.clone();

                join_set.spawn(async move {
                    let mut requests: u32 = 0;
                    let outcome = evaluate_npc(
                        session_id,
                        &handle,
                        &clock,
                        &mut state,
                        &present,
                        &world,
                        &evaluator,
                        relationships.as_ref(),
                        moods.as_ref(),
                        generation.as_ref(),
                        &config,
                        &mut requests,
                    );
                    (key, state, outcome, requests)
                });
            }

            while let Some(joined) = join_set.join_next().await {
                match joined {
                    Ok((key, state, outcome, requests)) => {
                        self.states.insert(key, state);
                        self.last_evaluated.insert(key, world_time_secs);
                        summary.generation_requests =
                            summary.generation_requests.saturating_add(requests);
                        record_outcome(&mut summary, key.1, outcome);
                    }
                    Err(error) => {
                        // The task panicked or was cancelled; its NPC's
                        // state is lost for this tick and will be
                        // recreated lazily. Everyone else continues.
                        warn!(%error, "background evaluation task failed");
                    }
                }
            }
        }

        info!(
            world_time_secs,
            evaluated = summary.evaluated,
            skipped = summary.skipped,
            held = summary.held,
            selections = summary.selections.len(),
            idled = summary.idled,
            degraded = summary.degraded.len(),
            abandoned = summary.abandoned,
            "tick complete"
        );
        Ok(summary)
    }
}

/// Co-located NPCs for a handle, excluding the NPC itself.
fn present_for(
    presence: &BTreeMap<&str, BTreeSet<NpcId>>,
    handle: &NpcHandle,
) -> BTreeSet<NpcId> {
    let mut present = presence
        .get(handle.location.as_str())
        .cloned()
        .unwrap_or_default();
    present.remove(&handle.npc_id);
    present
}

/// Fold one NPC's outcome into the tick summary.
fn record_outcome(summary: &mut TickSummary, npc: NpcId, outcome: NpcOutcome) {
    summary.evaluated = summary.evaluated.saturating_add(1);
    match outcome {
        NpcOutcome::Held => summary.held = summary.held.saturating_add(1),
        NpcOutcome::Selected(activity) => {
            summary.selections.insert(npc, activity);
        }
        NpcOutcome::Idled => summary.idled = summary.idled.saturating_add(1),
        NpcOutcome::Degraded => summary.degraded.push(npc),
    }
}

/// One NPC's complete resolve->apply pipeline, with its own error
/// boundary. Never returns an error: failures degrade this NPC only.
#[allow(clippy::too_many_arguments)]
fn evaluate_npc(
    session_id: SessionId,
    handle: &NpcHandle,
    clock: &WorldClock,
    state: &mut NpcSessionState,
    present: &BTreeSet<NpcId>,
    world: &WorldConfigSet,
    evaluator: &ConditionEvaluator,
    relationships: &dyn RelationshipStore,
    moods: &dyn MoodStore,
    generation: &dyn GenerationSink,
    config: &EngineConfig,
    generation_requests: &mut u32,
) -> NpcOutcome {
    // Settle debts from earlier store failures before deciding anything.
    effects::retry_pending_writes(handle.npc_id, state, relationships);

    let Some(graph) = world.routine(&handle.routine_id) else {
        warn!(npc = %handle.npc_id, routine = %handle.routine_id, "routine not found; degrading to idle");
        return NpcOutcome::Degraded;
    };

    let npc_layer = world.npc_preference_layer(handle.npc_id);
    let preferences = resolve_preferences(
        &graph.preference_defaults,
        &npc_layer,
        &handle.session_preferences,
    );

    let empty_roles = BTreeMap::new();
    let role_bindings = world
        .role_bindings
        .get(&handle.npc_id)
        .unwrap_or(&empty_roles);

    let ctx = ResolveContext {
        npc_id: handle.npc_id,
        clock,
        location_kind: handle.location_kind,
        present_npcs: present,
        role_bindings,
        relationships,
    };

    let mut rng = SmallRng::seed_from_u64(evaluation_seed(
        config.world.seed,
        session_id,
        handle.npc_id,
        clock.world_time_secs(),
    ));

    let decision = choose_activity(
        &world.catalog,
        graph,
        &preferences,
        state,
        &ctx,
        evaluator,
        &config.resolve,
        &config.scoring,
        &mut rng,
    );

    match decision {
        Decision::Hold => NpcOutcome::Held,
        Decision::Idle { .. } => NpcOutcome::Idled,
        Decision::Selected {
            activity,
            transitions,
            fallback,
        } => {
            for transition in &transitions {
                effects::apply_transition_effects(handle.npc_id, transition, state, moods);
            }
            effects::apply_activity_effects(
                handle.npc_id,
                &activity.effects,
                activity.min_duration_secs,
                state,
                relationships,
                moods,
                role_bindings,
            );

            if let Some(scene_intent) = &activity.scene_intent {
                let mut context = BTreeMap::new();
                context.insert(
                    String::from("world_time_secs"),
                    serde_json::json!(clock.world_time_secs()),
                );
                context.insert(String::from("location"), serde_json::json!(handle.location));
                context.insert(
                    String::from("time_of_day"),
                    serde_json::json!(clock.time_of_day()),
                );
                generation.submit(GenerationRequest {
                    npc_id: handle.npc_id,
                    session_id,
                    activity_id: activity.id.clone(),
                    scene_intent: scene_intent.clone(),
                    action_blocks: activity.action_blocks.clone(),
                    context,
                    requested_at: Utc::now(),
                });
                *generation_requests = generation_requests.saturating_add(1);
            }

            if fallback {
                debug!(npc = %handle.npc_id, activity = %activity.id, "fallback activity selected");
            }
            NpcOutcome::Selected(activity.id.clone())
        }
    }
}

/// Derive a deterministic per-evaluation seed.
///
/// SplitMix64-style mixing over the world seed, session, NPC, and world
/// time. Evaluation order and tier placement never affect an NPC's
/// decision stream.
fn evaluation_seed(
    world_seed: u64,
    session: SessionId,
    npc: NpcId,
    world_time_secs: u64,
) -> u64 {
    let mut h: u64 = world_seed;
    h = h.wrapping_add(world_time_secs.wrapping_mul(0x9e37_79b9_7f4a_7c15));
    for bytes in [session.into_inner().into_bytes(), npc.into_inner().into_bytes()] {
        for b in bytes {
            h = h.wrapping_add(u64::from(b));
            h = h.wrapping_mul(0xbf58_476d_1ce4_e5b9);
        }
    }
    h = (h ^ (h >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    h = (h ^ (h >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    h ^ (h >> 31)
}
