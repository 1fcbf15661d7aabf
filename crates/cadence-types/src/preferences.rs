//! NPC preference model: what an NPC likes doing, with whom, and when.
//!
//! Preferences arrive in three layers -- routine-graph defaults, NPC
//! static defaults, and per-session overrides -- merged field-by-field
//! into one effective [`NpcPreferences`] by the resolver in
//! `cadence-core`. Map fields merge key-by-key (later layers win per
//! key); scalar fields are replaced wholesale by later layers.

use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{ActivityCategory, LocationKind};
use crate::ids::{ActivityId, NpcId};

// ---------------------------------------------------------------------------
// Personality
// ---------------------------------------------------------------------------

/// Personality trait modifiers feeding the scoring compatibility factor.
///
/// Each trait is a [`Decimal`] in `[0, 1]` with 0.5 as the neutral
/// midpoint. Traits are static per NPC (a layer scalar, not a map).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PersonalityTraits {
    /// Appetite for social interaction; raises `Social` activity scores.
    #[ts(as = "String")]
    pub extraversion: Decimal,
    /// Diligence and orderliness; raises `Work` and `Routine` scores.
    #[ts(as = "String")]
    pub conscientiousness: Decimal,
    /// Appetite for novelty; raises `Leisure` and `Quest` scores.
    #[ts(as = "String")]
    pub openness: Decimal,
}

impl Default for PersonalityTraits {
    fn default() -> Self {
        Self {
            extraversion: neutral_trait(),
            conscientiousness: neutral_trait(),
            openness: neutral_trait(),
        }
    }
}

/// The neutral trait midpoint (0.5).
fn neutral_trait() -> Decimal {
    Decimal::new(5, 1)
}

// ---------------------------------------------------------------------------
// Time-of-day bias
// ---------------------------------------------------------------------------

/// Coarse chronotype flags modulating scoring at the edges of the day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TimeBias {
    /// Favors Dawn-bucket activity; dampens Night.
    #[serde(default)]
    pub early_riser: bool,
    /// Favors Night-bucket activity; dampens Dawn.
    #[serde(default)]
    pub night_owl: bool,
}

// ---------------------------------------------------------------------------
// Layers and the effective set
// ---------------------------------------------------------------------------

/// One source layer of preferences. Every field is optional so a layer
/// only states what it overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PreferenceLayer {
    /// Per-activity weight overrides (merged per key).
    #[serde(default)]
    #[ts(as = "BTreeMap<ActivityId, String>")]
    pub activity_weights: BTreeMap<ActivityId, Decimal>,

    /// Per-category weight overrides (merged per key).
    #[serde(default)]
    #[ts(as = "BTreeMap<ActivityCategory, String>")]
    pub category_weights: BTreeMap<ActivityCategory, Decimal>,

    /// NPCs this NPC seeks out (replaced wholesale).
    #[serde(default)]
    pub preferred_companions: Option<BTreeSet<NpcId>>,

    /// NPCs this NPC avoids (replaced wholesale).
    #[serde(default)]
    pub avoided_companions: Option<BTreeSet<NpcId>>,

    /// Location kinds this NPC favors (replaced wholesale).
    #[serde(default)]
    pub favorite_locations: Option<Vec<LocationKind>>,

    /// Chronotype flags (replaced wholesale).
    #[serde(default)]
    pub time_bias: Option<TimeBias>,

    /// Personality traits (replaced wholesale).
    #[serde(default)]
    pub personality: Option<PersonalityTraits>,
}

impl PreferenceLayer {
    /// Whether this layer states nothing at all.
    pub fn is_empty(&self) -> bool {
        self.activity_weights.is_empty()
            && self.category_weights.is_empty()
            && self.preferred_companions.is_none()
            && self.avoided_companions.is_none()
            && self.favorite_locations.is_none()
            && self.time_bias.is_none()
            && self.personality.is_none()
    }
}

/// The effective preference set for one NPC after the layer merge.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct NpcPreferences {
    /// Per-activity weights. Missing entries default to weight 1 during
    /// scoring; an explicit weight `<= 0` hard-excludes the activity.
    #[ts(as = "BTreeMap<ActivityId, String>")]
    pub activity_weights: BTreeMap<ActivityId, Decimal>,

    /// Per-category weights. Missing entries default to weight 1; an
    /// explicit weight `<= 0` hard-excludes the whole category.
    #[ts(as = "BTreeMap<ActivityCategory, String>")]
    pub category_weights: BTreeMap<ActivityCategory, Decimal>,

    /// NPCs this NPC seeks out.
    pub preferred_companions: BTreeSet<NpcId>,

    /// NPCs this NPC avoids.
    pub avoided_companions: BTreeSet<NpcId>,

    /// Location kinds this NPC favors.
    pub favorite_locations: Vec<LocationKind>,

    /// Chronotype flags.
    pub time_bias: TimeBias,

    /// Personality traits (neutral 0.5s when never stated).
    pub personality: PersonalityTraits,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn empty_layer_is_empty() {
        assert!(PreferenceLayer::default().is_empty());
        let layer = PreferenceLayer {
            time_bias: Some(TimeBias {
                early_riser: true,
                night_owl: false,
            }),
            ..PreferenceLayer::default()
        };
        assert!(!layer.is_empty());
    }

    #[test]
    fn default_personality_is_neutral() {
        let traits = PersonalityTraits::default();
        assert_eq!(traits.extraversion, Decimal::new(5, 1));
        assert_eq!(traits.conscientiousness, Decimal::new(5, 1));
        assert_eq!(traits.openness, Decimal::new(5, 1));
    }

    #[test]
    fn layer_round_trips() {
        let mut weights = BTreeMap::new();
        weights.insert(ActivityId::from("activity:work_shop"), Decimal::ZERO);
        let layer = PreferenceLayer {
            activity_weights: weights,
            ..PreferenceLayer::default()
        };
        let json = serde_json::to_string(&layer).unwrap();
        let back: PreferenceLayer = serde_json::from_str(&json).unwrap();
        assert_eq!(back, layer);
    }
}
