//! Effect application: turning a selected activity into state changes.
//!
//! Effects are applied exactly once per activity selection -- the
//! resolver's `next_decision_due` gate guarantees a selection cannot
//! repeat within its commitment window, which is what makes reapplying
//! effects after an external-store failure safe.
//!
//! # Order of operations
//!
//! 1. Energy: per-hour rate scaled by the committed duration, clamped
//!    to `[0, 100]`.
//! 2. Mood: vector add (axes clamped to `[-1, 1]`), tag add/remove,
//!    written through to the external mood store.
//! 3. Relationships: deltas resolved (literal id or role binding) and
//!    written through to the external relationship store; failed writes
//!    are buffered on the session record and retried at this NPC's next
//!    evaluation only.
//! 4. Flags: merged last-writer-wins.
//!
//! All writes are last-writer-wins per key; nothing here rolls back.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use tracing::warn;

use cadence_types::{
    ActivityEffects, CompanionRef, MoodImpact, NpcId, NpcSessionState, PendingRelationshipWrite,
    TransitionEffects,
};

use crate::stores::{MoodStore, RelationshipStore};

/// Energy floor.
const ENERGY_MIN: Decimal = Decimal::ZERO;
/// Energy ceiling.
const ENERGY_MAX: Decimal = Decimal::ONE_HUNDRED;
/// Mood axis floor.
const AXIS_MIN: Decimal = Decimal::NEGATIVE_ONE;
/// Mood axis ceiling.
const AXIS_MAX: Decimal = Decimal::ONE;
/// Seconds per world hour, the unit of `energy_per_hour`.
const SECONDS_PER_HOUR: Decimal = Decimal::from_parts(3600, 0, 0, false, 0);

/// Apply a selected activity's declared effects.
///
/// `committed_secs` is the duration the NPC just committed to (the
/// activity's `min_duration_secs`); the energy rate is scaled by it.
pub fn apply_activity_effects(
    npc: NpcId,
    effects: &ActivityEffects,
    committed_secs: u64,
    state: &mut NpcSessionState,
    relationships: &dyn RelationshipStore,
    moods: &dyn MoodStore,
    role_bindings: &BTreeMap<String, NpcId>,
) {
    // 1. Energy, scaled by the committed duration.
    let hours = Decimal::from(committed_secs)
        .checked_div(SECONDS_PER_HOUR)
        .unwrap_or(Decimal::ZERO);
    let delta = effects.energy_per_hour.saturating_mul(hours);
    state.energy = state
        .energy
        .saturating_add(delta)
        .clamp(ENERGY_MIN, ENERGY_MAX);

    // 2. Mood.
    apply_mood(npc, &effects.mood_impact, state, moods);

    // 3. Relationships.
    for (target_ref, deltas) in &effects.relationship_deltas {
        if deltas.is_zero() {
            continue;
        }
        let Some(target) = resolve_target(npc, target_ref, role_bindings) else {
            continue;
        };
        if let Err(error) = relationships.apply_delta(npc, target, deltas) {
            warn!(%npc, %target, %error, "relationship write failed; buffering for retry");
            state.pending_relationship_writes.push(PendingRelationshipWrite {
                target,
                deltas: *deltas,
            });
        }
    }

    // 4. Flags.
    for (key, value) in &effects.flags {
        state.flags.insert(key.clone(), value.clone());
    }
}

/// Apply the transition effects of a taken routine edge.
///
/// Transition effects are instantaneous: energy is added as-is rather
/// than scaled by a duration.
pub fn apply_transition_effects(
    npc: NpcId,
    effects: &TransitionEffects,
    state: &mut NpcSessionState,
    moods: &dyn MoodStore,
) {
    state.energy = state
        .energy
        .saturating_add(effects.energy)
        .clamp(ENERGY_MIN, ENERGY_MAX);

    apply_mood(npc, &effects.mood_impact, state, moods);

    for (key, value) in &effects.flags {
        state.flags.insert(key.clone(), value.clone());
    }
}

/// Retry relationship writes buffered by earlier store failures.
///
/// Called at the start of each evaluation of the owning NPC. Writes that
/// fail again are re-buffered; other NPCs are never affected.
pub fn retry_pending_writes(
    npc: NpcId,
    state: &mut NpcSessionState,
    relationships: &dyn RelationshipStore,
) {
    if state.pending_relationship_writes.is_empty() {
        return;
    }
    let pending = std::mem::take(&mut state.pending_relationship_writes);
    for write in pending {
        if let Err(error) = relationships.apply_delta(npc, write.target, &write.deltas) {
            warn!(%npc, target = %write.target, %error, "relationship retry failed; keeping buffered");
            state.pending_relationship_writes.push(write);
        }
    }
}

/// Apply a mood impact to the session snapshot and write it through.
fn apply_mood(npc: NpcId, impact: &MoodImpact, state: &mut NpcSessionState, moods: &dyn MoodStore) {
    if impact.is_zero() {
        return;
    }
    state.mood.valence = state
        .mood
        .valence
        .saturating_add(impact.valence)
        .clamp(AXIS_MIN, AXIS_MAX);
    state.mood.arousal = state
        .mood
        .arousal
        .saturating_add(impact.arousal)
        .clamp(AXIS_MIN, AXIS_MAX);
    for tag in &impact.add_tags {
        state.mood.tags.insert(*tag);
    }
    for tag in &impact.remove_tags {
        state.mood.tags.remove(tag);
    }

    // The session snapshot is the engine-side cache; the store is the
    // write-through authority. A failed write only costs freshness.
    if let Err(error) = moods.apply_impact(npc, impact) {
        warn!(%npc, %error, "mood write-through failed; session snapshot retained");
    }
}

/// Resolve a relationship target to a concrete NPC.
fn resolve_target(
    npc: NpcId,
    target: &CompanionRef,
    role_bindings: &BTreeMap<String, NpcId>,
) -> Option<NpcId> {
    match target {
        CompanionRef::Npc(id) => Some(*id),
        CompanionRef::Role(role) => {
            let resolved = role_bindings.get(role).copied();
            if resolved.is_none() {
                warn!(%npc, role, "relationship delta target role unresolved; skipping");
            }
            resolved
        }
    }
}
