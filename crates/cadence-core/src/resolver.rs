//! The activity resolver: one NPC, one decision.
//!
//! Given an NPC's routine graph, effective preferences, session state,
//! and a read-only world context, `choose_activity` walks the pipeline:
//!
//! 1. **Commitment gate** -- if `next_decision_due` has not passed, the
//!    running activity continues untouched (`min_duration` semantics).
//! 2. **Traversal** -- resolve the governing routine node (see
//!    [`crate::graph`]).
//! 3. **Candidates** -- collect the node's offered activities whose own
//!    conditions pass.
//! 4. **Feasibility** -- drop candidates whose requirements fail, whose
//!    catalog entry is missing, or that are cooling down.
//! 5. **Fallback** -- an empty feasible set is not an error: keep the
//!    previous activity, or take the configured idle activity, or stand
//!    idle.
//! 6. **Selection** -- score the feasible set (see [`crate::scoring`])
//!    and draw by weight from the seeded random source. Deliberately
//!    not argmax: equal-ish candidates should vary run to run (under a
//!    fixed seed, identically).
//! 7. **Bookkeeping** -- set `next_decision_due` and the cooldown entry.
//!
//! Effect application is the scheduler's job, driven by the returned
//! [`Decision`]; the resolver only mutates decision bookkeeping.

use std::collections::{BTreeMap, BTreeSet};

use rand::Rng;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use tracing::{debug, warn};

use cadence_types::{
    Activity, ActivityId, CandidateActivity, LocationKind, NpcId, NpcPreferences, NpcSessionState,
    RoutineGraph, RoutineNodeKind, TransitionEffects,
};

use crate::catalog::ActivityCatalog;
use crate::clock::WorldClock;
use crate::condition::{ConditionContext, ConditionEvaluator};
use crate::config::{ResolveConfig, ScoringConfig};
use crate::graph::find_active_node;
use crate::scoring::{ScoreContext, score_candidate};
use crate::stores::RelationshipStore;

/// Fixed-point scale for score draws (milli-score ticks).
const SCORE_SCALE: Decimal = Decimal::from_parts(1000, 0, 0, false, 0);

/// Read-only world context for one NPC's resolution.
pub struct ResolveContext<'a> {
    /// The NPC being resolved.
    pub npc_id: NpcId,
    /// The world clock snapshot for this tick.
    pub clock: &'a WorldClock,
    /// The kind of place the NPC is currently at.
    pub location_kind: LocationKind,
    /// NPCs currently co-located with this NPC.
    pub present_npcs: &'a BTreeSet<NpcId>,
    /// This NPC's role bindings.
    pub role_bindings: &'a BTreeMap<String, NpcId>,
    /// Relationship metric access.
    pub relationships: &'a dyn RelationshipStore,
}

/// The outcome of one resolution.
#[derive(Debug)]
pub enum Decision<'a> {
    /// The commitment window is still open; nothing changed.
    Hold,

    /// A fresh selection was made; the caller applies its effects.
    Selected {
        /// The chosen activity.
        activity: &'a Activity,
        /// Transition effects of edges taken during traversal, in order.
        transitions: Vec<TransitionEffects>,
        /// True when the selection came from the fallback path rather
        /// than scoring.
        fallback: bool,
    },

    /// Nothing was selectable: the previous activity was kept, or the
    /// NPC went idle.
    Idle {
        /// The previous activity kept running, if any.
        kept: Option<ActivityId>,
    },
}

/// One feasible candidate, ready for scoring.
struct FeasibleCandidate<'a> {
    activity: &'a Activity,
    base_weight: Decimal,
    companions: Vec<NpcId>,
}

/// Resolve what the NPC should be doing right now.
#[allow(clippy::too_many_arguments)]
pub fn choose_activity<'a, R: Rng + ?Sized>(
    catalog: &'a ActivityCatalog,
    graph: &RoutineGraph,
    preferences: &NpcPreferences,
    state: &mut NpcSessionState,
    ctx: &ResolveContext<'_>,
    evaluator: &ConditionEvaluator,
    resolve_config: &ResolveConfig,
    scoring_config: &ScoringConfig,
    rng: &mut R,
) -> Decision<'a> {
    let now = ctx.clock.world_time_secs();

    // 1. Commitment gate.
    if state.next_decision_due > now {
        return Decision::Hold;
    }
    state.prune_cooldowns(now);

    let condition_ctx = ConditionContext {
        npc_id: ctx.npc_id,
        energy: state.energy,
        mood: &state.mood,
        flags: &state.flags,
        time_of_day: ctx.clock.time_of_day(),
        relationships: ctx.relationships,
        role_bindings: ctx.role_bindings,
    };

    // 2. Traversal.
    let active = match find_active_node(
        graph,
        ctx.clock,
        evaluator,
        &condition_ctx,
        resolve_config.hop_limit,
        rng,
    ) {
        Ok(active) => active,
        Err(error) => {
            warn!(npc = %ctx.npc_id, routine = %graph.id, %error, "traversal failed; falling back");
            return fallback(catalog, resolve_config, state, now);
        }
    };
    let transitions: Vec<TransitionEffects> =
        active.transitions.iter().map(|t| (*t).clone()).collect();

    // 3. Candidates whose own conditions pass.
    let offered: Vec<CandidateActivity> = match &active.node.kind {
        RoutineNodeKind::TimeSlot { candidates, .. } => candidates
            .iter()
            .filter(|c| evaluator.evaluate_all(&c.conditions, &condition_ctx, rng))
            .cloned()
            .collect(),
        RoutineNodeKind::Activity { activity } => vec![CandidateActivity {
            activity: activity.clone(),
            weight: Decimal::ONE,
            conditions: Vec::new(),
        }],
        RoutineNodeKind::Decision { .. } => Vec::new(),
    };

    // 4. Feasibility.
    let mut feasible: Vec<FeasibleCandidate<'a>> = Vec::new();
    for candidate in &offered {
        let Some(activity) = catalog.get(&candidate.activity) else {
            debug!(npc = %ctx.npc_id, activity = %candidate.activity, "dangling candidate skipped");
            continue;
        };
        if state.in_cooldown(&activity.id, now) {
            continue;
        }
        let Some(companions) = requirements_met(activity, state, ctx) else {
            continue;
        };
        feasible.push(FeasibleCandidate {
            activity,
            base_weight: candidate.weight,
            companions,
        });
    }

    // 5. Fallback on exhaustion.
    if feasible.is_empty() {
        debug!(npc = %ctx.npc_id, node = %active.node.id, "no feasible candidate; falling back");
        return fallback(catalog, resolve_config, state, now);
    }

    // 6. Score and draw. Candidates excluded by explicit zero weights
    //    drop out of the pool here.
    let mut pool: Vec<(usize, u64)> = Vec::new();
    let mut total_ticks: u64 = 0;
    for (index, candidate) in feasible.iter().enumerate() {
        let breakdown = score_candidate(
            scoring_config,
            &ScoreContext {
                npc_id: ctx.npc_id,
                activity: candidate.activity,
                base_weight: candidate.base_weight,
                preferences,
                state,
                time_of_day: ctx.clock.time_of_day(),
                companions: &candidate.companions,
                relationships: ctx.relationships,
            },
        );
        if let Some(breakdown) = breakdown {
            let ticks = score_ticks(breakdown.total);
            if ticks > 0 {
                pool.push((index, ticks));
                total_ticks = total_ticks.saturating_add(ticks);
            }
        }
    }
    if pool.is_empty() || total_ticks == 0 {
        debug!(npc = %ctx.npc_id, "all candidates excluded by preference weights; falling back");
        return fallback(catalog, resolve_config, state, now);
    }

    let mut roll = rng.random_range(0..total_ticks);
    let mut chosen_index = pool.first().map_or(0, |(index, _)| *index);
    for (index, ticks) in &pool {
        if roll < *ticks {
            chosen_index = *index;
            break;
        }
        roll = roll.saturating_sub(*ticks);
    }
    let Some(chosen) = feasible.get(chosen_index) else {
        // Pool indices always come from `feasible`; degrade if not.
        return fallback(catalog, resolve_config, state, now);
    };
    let activity = chosen.activity;

    // 7. Bookkeeping. Re-selecting the running activity continues it
    //    (the original start time stands); any selection opens a fresh
    //    commitment window and cooldown.
    if state.current_activity.as_ref() != Some(&activity.id) {
        state.activity_started_at = now;
    }
    state.current_activity = Some(activity.id.clone());
    state.next_decision_due = now.saturating_add(activity.min_duration_secs);
    if activity.cooldown_secs > 0 {
        state
            .cooldowns
            .insert(activity.id.clone(), now.saturating_add(activity.cooldown_secs));
    }

    debug!(npc = %ctx.npc_id, activity = %activity.id, until = state.next_decision_due, "activity selected");
    Decision::Selected {
        activity,
        transitions,
        fallback: false,
    }
}

/// Check an activity's hard requirements.
///
/// Returns the resolved required companions on success, `None` on any
/// failed requirement.
fn requirements_met(
    activity: &Activity,
    state: &NpcSessionState,
    ctx: &ResolveContext<'_>,
) -> Option<Vec<NpcId>> {
    let Some(requirements) = &activity.requirements else {
        return Some(Vec::new());
    };

    if !requirements.location_kinds.is_empty()
        && !requirements.location_kinds.contains(&ctx.location_kind)
    {
        return None;
    }

    if let Some(min_energy) = requirements.min_energy
        && state.energy < min_energy
    {
        return None;
    }

    if !requirements.mood_tags.is_empty()
        && !requirements.mood_tags.iter().any(|tag| state.mood.tags.contains(tag))
    {
        return None;
    }

    if !requirements.times_of_day.is_empty()
        && !requirements.times_of_day.contains(&ctx.clock.time_of_day())
    {
        return None;
    }

    // Companions: every requirement must resolve to a present NPC.
    let mut companions = Vec::new();
    for companion_ref in &requirements.companions {
        let resolved = match companion_ref {
            cadence_types::CompanionRef::Npc(id) => Some(*id),
            cadence_types::CompanionRef::Role(role) => ctx.role_bindings.get(role).copied(),
        };
        let Some(id) = resolved else {
            return None;
        };
        if !ctx.present_npcs.contains(&id) {
            return None;
        }
        companions.push(id);
    }

    Some(companions)
}

/// The documented fallback path for traversal failure and feasibility
/// exhaustion.
///
/// Precedence: keep the previous activity if one is running; otherwise
/// take the configured idle activity; otherwise stand idle. Both idle
/// outcomes re-check after `idle_recheck_secs` rather than every tick.
fn fallback<'a>(
    catalog: &'a ActivityCatalog,
    resolve_config: &ResolveConfig,
    state: &mut NpcSessionState,
    now: u64,
) -> Decision<'a> {
    if let Some(current) = &state.current_activity {
        // Finish what it was doing until the routine offers something.
        state.next_decision_due = now.saturating_add(resolve_config.idle_recheck_secs);
        return Decision::Idle {
            kept: Some(current.clone()),
        };
    }

    if let Some(fallback_id) = &resolve_config.fallback_activity {
        if let Some(activity) = catalog.get(fallback_id) {
            state.current_activity = Some(activity.id.clone());
            state.activity_started_at = now;
            state.next_decision_due = now.saturating_add(
                activity.min_duration_secs.max(resolve_config.idle_recheck_secs),
            );
            return Decision::Selected {
                activity,
                transitions: Vec::new(),
                fallback: true,
            };
        }
        warn!(activity = %fallback_id, "configured fallback activity missing from catalog");
    }

    state.current_activity = None;
    state.next_decision_due = now.saturating_add(resolve_config.idle_recheck_secs);
    Decision::Idle { kept: None }
}

/// Convert a score to fixed-point draw ticks.
fn score_ticks(score: Decimal) -> u64 {
    score.saturating_mul(SCORE_SCALE).trunc().to_u64().unwrap_or(0)
}
