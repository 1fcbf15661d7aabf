//! Activity templates: the reusable, declarative "things an NPC can do".
//!
//! Activities are world-level configuration: authored in the editor,
//! versioned, and never mutated by the runtime. An activity bundles its
//! eligibility requirements, its consequences (effects), duration and
//! cooldown bookkeeping, and optional generation metadata that the tick
//! scheduler forwards to the content pipeline when the activity is chosen.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{ActivityCategory, LocationKind, MoodTag, TimeOfDay};
use crate::ids::{ActivityId, CompanionRef, FlagKey};

// ---------------------------------------------------------------------------
// Activity
// ---------------------------------------------------------------------------

/// A reusable activity definition, keyed by stable id.
///
/// Immutable once published. Routine graphs reference activities by id;
/// a dangling reference is a publish-time validation error and, if it
/// somehow reaches runtime, the candidate is simply treated as
/// infeasible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Activity {
    /// Stable string key (e.g. `"activity:work_shop"`).
    pub id: ActivityId,

    /// Human-readable name for logs and tooling.
    pub display_name: String,

    /// Broad category, used for per-category preference weights and
    /// personality compatibility scoring.
    pub category: ActivityCategory,

    /// Eligibility requirements. `None` means always eligible (subject to
    /// cooldown and node conditions).
    #[serde(default)]
    pub requirements: Option<ActivityRequirements>,

    /// Consequences applied when the activity is selected.
    #[serde(default)]
    pub effects: ActivityEffects,

    /// Minimum commitment in world seconds. A running activity is never
    /// replaced before this elapses.
    pub min_duration_secs: u64,

    /// World seconds after selection during which the activity cannot be
    /// selected again.
    #[serde(default)]
    pub cooldown_secs: u64,

    /// When set, selecting this activity emits a fire-and-forget
    /// generation request carrying this scene intent.
    #[serde(default)]
    pub scene_intent: Option<String>,

    /// Action-block references forwarded alongside the scene intent.
    #[serde(default)]
    pub action_blocks: Vec<String>,
}

impl Activity {
    /// Whether selecting this activity should trigger content generation.
    pub const fn triggers_generation(&self) -> bool {
        self.scene_intent.is_some()
    }
}

// ---------------------------------------------------------------------------
// Requirements
// ---------------------------------------------------------------------------

/// Hard eligibility requirements for an activity.
///
/// Empty collections mean "no constraint" so designers only write the
/// restrictions they care about.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ActivityRequirements {
    /// Location kinds the NPC must currently be at (empty = anywhere).
    #[serde(default)]
    pub location_kinds: Vec<LocationKind>,

    /// Other NPCs (by identity or role) that must be present.
    #[serde(default)]
    #[ts(as = "Vec<String>")]
    pub companions: Vec<CompanionRef>,

    /// Minimum energy required to start.
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub min_energy: Option<Decimal>,

    /// Mood tags the NPC must currently carry at least one of (empty = any mood).
    #[serde(default)]
    pub mood_tags: Vec<MoodTag>,

    /// Time-of-day buckets during which the activity is allowed (empty = any time).
    #[serde(default)]
    pub times_of_day: Vec<TimeOfDay>,
}

// ---------------------------------------------------------------------------
// Effects
// ---------------------------------------------------------------------------

/// Per-metric relationship deltas toward one target.
///
/// Values are signed; the external store clamps to its own 0–100 range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RelationshipDeltas {
    /// Change to affinity.
    #[serde(default)]
    #[ts(as = "String")]
    pub affinity: Decimal,
    /// Change to trust.
    #[serde(default)]
    #[ts(as = "String")]
    pub trust: Decimal,
    /// Change to chemistry.
    #[serde(default)]
    #[ts(as = "String")]
    pub chemistry: Decimal,
    /// Change to tension.
    #[serde(default)]
    #[ts(as = "String")]
    pub tension: Decimal,
}

impl RelationshipDeltas {
    /// Whether every delta is zero.
    pub fn is_zero(&self) -> bool {
        self.affinity.is_zero()
            && self.trust.is_zero()
            && self.chemistry.is_zero()
            && self.tension.is_zero()
    }
}

/// Mood consequence of an activity: a vector add plus tag churn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct MoodImpact {
    /// Valence shift, applied to the `[-1, 1]` valence axis.
    #[serde(default)]
    #[ts(as = "String")]
    pub valence: Decimal,
    /// Arousal shift, applied to the `[-1, 1]` arousal axis.
    #[serde(default)]
    #[ts(as = "String")]
    pub arousal: Decimal,
    /// Tags to add.
    #[serde(default)]
    pub add_tags: Vec<MoodTag>,
    /// Tags to remove.
    #[serde(default)]
    pub remove_tags: Vec<MoodTag>,
}

impl MoodImpact {
    /// Whether this impact changes nothing.
    pub fn is_zero(&self) -> bool {
        self.valence.is_zero()
            && self.arousal.is_zero()
            && self.add_tags.is_empty()
            && self.remove_tags.is_empty()
    }
}

/// Declared consequences of selecting an activity.
///
/// Applied exactly once per selection by the effect applier; the
/// `next_decision_due` gate in the resolver makes reapplication
/// impossible within one commitment window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ActivityEffects {
    /// Energy change per world hour, scaled by the committed duration.
    /// Negative for draining activities, positive for restorative ones.
    #[serde(default)]
    #[ts(as = "String")]
    pub energy_per_hour: Decimal,

    /// Mood vector add and tag churn.
    #[serde(default)]
    pub mood_impact: MoodImpact,

    /// Relationship deltas keyed by target (literal NPC or role).
    #[serde(default)]
    #[ts(as = "BTreeMap<String, RelationshipDeltas>")]
    pub relationship_deltas: BTreeMap<CompanionRef, RelationshipDeltas>,

    /// Session flags to set (last-writer-wins per key).
    #[serde(default)]
    pub flags: BTreeMap<FlagKey, serde_json::Value>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample_activity() -> Activity {
        Activity {
            id: ActivityId::from("activity:work_shop"),
            display_name: String::from("Tend the shop"),
            category: ActivityCategory::Work,
            requirements: Some(ActivityRequirements {
                location_kinds: vec![LocationKind::Shop],
                min_energy: Some(Decimal::from(20)),
                ..ActivityRequirements::default()
            }),
            effects: ActivityEffects {
                energy_per_hour: Decimal::from(-5),
                ..ActivityEffects::default()
            },
            min_duration_secs: 3600,
            cooldown_secs: 0,
            scene_intent: None,
            action_blocks: Vec::new(),
        }
    }

    #[test]
    fn activity_round_trips() {
        let activity = sample_activity();
        let json = serde_json::to_string(&activity).unwrap();
        let back: Activity = serde_json::from_str(&json).unwrap();
        assert_eq!(back, activity);
    }

    #[test]
    fn sparse_authoring_fills_defaults() {
        let json = r#"{
            "id": "activity:idle",
            "display_name": "Idle",
            "category": "routine",
            "min_duration_secs": 600
        }"#;
        let activity: Activity = serde_json::from_str(json).unwrap();
        assert!(activity.requirements.is_none());
        assert!(activity.effects.energy_per_hour.is_zero());
        assert_eq!(activity.cooldown_secs, 0);
        assert!(!activity.triggers_generation());
    }

    #[test]
    fn zero_checks() {
        assert!(RelationshipDeltas::default().is_zero());
        assert!(MoodImpact::default().is_zero());
        let deltas = RelationshipDeltas {
            tension: Decimal::from(2),
            ..RelationshipDeltas::default()
        };
        assert!(!deltas.is_zero());
    }
}
