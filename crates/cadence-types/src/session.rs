//! Per-(session, NPC) mutable runtime state.
//!
//! Session state is created lazily on an NPC's first resolution in a
//! session, mutated only by the effect applier and by decision
//! transitions, and destroyed with the session. It lives in a flat arena
//! keyed by `(SessionId, NpcId)` so concurrent tick workers can own
//! disjoint entries without back-references.

use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::activity::RelationshipDeltas;
use crate::enums::MoodTag;
use crate::ids::{ActivityId, FlagKey, NpcId};

/// Mood snapshot: a continuous valence/arousal vector plus discrete tags.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct MoodState {
    /// Pleasantness axis in `[-1, 1]`.
    #[ts(as = "String")]
    pub valence: Decimal,
    /// Activation axis in `[-1, 1]`.
    #[ts(as = "String")]
    pub arousal: Decimal,
    /// Discrete mood labels currently in effect.
    pub tags: BTreeSet<MoodTag>,
}

/// A relationship write that failed against the external store and is
/// retried at this NPC's next evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PendingRelationshipWrite {
    /// The resolved target NPC.
    pub target: NpcId,
    /// The deltas still owed to the store.
    pub deltas: RelationshipDeltas,
}

/// Mutable per-(session, NPC) record driving routine resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct NpcSessionState {
    /// Current energy in `[0, 100]`.
    #[ts(as = "String")]
    pub energy: Decimal,

    /// The activity the NPC is currently engaged in, if any.
    pub current_activity: Option<ActivityId>,

    /// World time at which the current activity started.
    pub activity_started_at: u64,

    /// World time before which no new decision is made. Enforces the
    /// `min_duration` commitment of the running activity.
    pub next_decision_due: u64,

    /// Current mood snapshot.
    pub mood: MoodState,

    /// Per-activity cooldown expiry: activity id -> world time until
    /// which it is ineligible.
    pub cooldowns: BTreeMap<ActivityId, u64>,

    /// Session flags set by activity and transition effects.
    pub flags: BTreeMap<FlagKey, serde_json::Value>,

    /// Relationship writes that failed against the external store,
    /// retried at the next evaluation of this NPC only.
    #[serde(default)]
    pub pending_relationship_writes: Vec<PendingRelationshipWrite>,
}

/// Energy assigned to a freshly created session record.
const STARTING_ENERGY: Decimal = Decimal::from_parts(80, 0, 0, false, 0);

impl NpcSessionState {
    /// Create a fresh record for an NPC first seen at `world_time_secs`.
    ///
    /// The NPC starts idle with no commitment, so the first evaluation
    /// makes a real decision immediately.
    pub fn new(world_time_secs: u64) -> Self {
        Self {
            energy: STARTING_ENERGY,
            current_activity: None,
            activity_started_at: world_time_secs,
            next_decision_due: world_time_secs,
            mood: MoodState::default(),
            cooldowns: BTreeMap::new(),
            flags: BTreeMap::new(),
            pending_relationship_writes: Vec::new(),
        }
    }

    /// Whether `activity` is cooling down at `world_time_secs`.
    pub fn in_cooldown(&self, activity: &ActivityId, world_time_secs: u64) -> bool {
        self.cooldowns
            .get(activity)
            .is_some_and(|until| world_time_secs < *until)
    }

    /// Drop cooldown entries that have already expired.
    ///
    /// Purely a size bound on long sessions; expired entries are never
    /// consulted.
    pub fn prune_cooldowns(&mut self, world_time_secs: u64) {
        self.cooldowns.retain(|_, until| *until > world_time_secs);
    }
}
