//! The preference resolver: merging layered preference sources.
//!
//! Three layers, weakest first: routine-graph defaults, NPC static
//! defaults, per-session overrides. Scalar fields are replaced wholesale
//! by the strongest layer that states them; map fields merge key-by-key
//! with later layers winning per key. The merge is a pure function over
//! immutable inputs -- no shared mutable preference objects exist, so the
//! result is deterministic regardless of when or how often it runs.

use cadence_types::{NpcPreferences, PreferenceLayer};

/// Merge the three preference layers into one effective set.
///
/// Later arguments are stronger: `session` beats `npc` beats `routine`.
/// Fields no layer states fall back to [`NpcPreferences::default()`]
/// (neutral personality, no weights, no companion lists).
pub fn resolve_preferences(
    routine: &PreferenceLayer,
    npc: &PreferenceLayer,
    session: &PreferenceLayer,
) -> NpcPreferences {
    let mut effective = NpcPreferences::default();

    // Map fields: merge per key, weakest layer first so later inserts win.
    for layer in [routine, npc, session] {
        for (id, weight) in &layer.activity_weights {
            effective.activity_weights.insert(id.clone(), *weight);
        }
        for (category, weight) in &layer.category_weights {
            effective.category_weights.insert(*category, *weight);
        }
    }

    // Scalar fields: strongest layer that states the field wins wholesale.
    for layer in [routine, npc, session] {
        if let Some(companions) = &layer.preferred_companions {
            effective.preferred_companions = companions.clone();
        }
        if let Some(companions) = &layer.avoided_companions {
            effective.avoided_companions = companions.clone();
        }
        if let Some(locations) = &layer.favorite_locations {
            effective.favorite_locations = locations.clone();
        }
        if let Some(bias) = layer.time_bias {
            effective.time_bias = bias;
        }
        if let Some(personality) = layer.personality {
            effective.personality = personality;
        }
    }

    effective
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};

    use cadence_types::{ActivityCategory, ActivityId, NpcId, PersonalityTraits, TimeBias};
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn maps_merge_per_key() {
        let mut routine = PreferenceLayer::default();
        routine
            .activity_weights
            .insert(ActivityId::from("activity:work"), Decimal::from(2));
        routine
            .activity_weights
            .insert(ActivityId::from("activity:rest"), Decimal::ONE);

        let mut session = PreferenceLayer::default();
        session
            .activity_weights
            .insert(ActivityId::from("activity:work"), Decimal::ZERO);

        let effective = resolve_preferences(&routine, &PreferenceLayer::default(), &session);

        // Session override wins for "work"; routine entry survives for "rest".
        assert_eq!(
            effective.activity_weights.get(&ActivityId::from("activity:work")),
            Some(&Decimal::ZERO)
        );
        assert_eq!(
            effective.activity_weights.get(&ActivityId::from("activity:rest")),
            Some(&Decimal::ONE)
        );
    }

    #[test]
    fn scalars_replace_wholesale() {
        let routine = PreferenceLayer {
            preferred_companions: Some(BTreeSet::from([NpcId::new(), NpcId::new()])),
            time_bias: Some(TimeBias {
                early_riser: true,
                night_owl: false,
            }),
            ..PreferenceLayer::default()
        };

        let replacement = NpcId::new();
        let npc = PreferenceLayer {
            preferred_companions: Some(BTreeSet::from([replacement])),
            ..PreferenceLayer::default()
        };

        let effective = resolve_preferences(&routine, &npc, &PreferenceLayer::default());

        // NPC layer replaced the whole companion set, not merged into it.
        assert_eq!(effective.preferred_companions.len(), 1);
        assert!(effective.preferred_companions.contains(&replacement));
        // Unstated fields fall through to the routine layer.
        assert!(effective.time_bias.early_riser);
    }

    #[test]
    fn category_weights_layer_correctly() {
        let mut routine = PreferenceLayer::default();
        routine
            .category_weights
            .insert(ActivityCategory::Work, Decimal::new(15, 1));

        let mut npc = PreferenceLayer::default();
        npc.category_weights
            .insert(ActivityCategory::Social, Decimal::new(5, 1));

        let effective = resolve_preferences(&routine, &npc, &PreferenceLayer::default());
        assert_eq!(effective.category_weights.len(), 2);
        assert_eq!(
            effective.category_weights.get(&ActivityCategory::Work),
            Some(&Decimal::new(15, 1))
        );
    }

    #[test]
    fn empty_layers_yield_defaults() {
        let effective = resolve_preferences(
            &PreferenceLayer::default(),
            &PreferenceLayer::default(),
            &PreferenceLayer::default(),
        );
        assert_eq!(effective, NpcPreferences::default());
        assert_eq!(effective.personality, PersonalityTraits::default());
        assert!(effective.activity_weights.is_empty());
    }

    #[test]
    fn merge_is_deterministic() {
        let mut routine = PreferenceLayer::default();
        routine
            .activity_weights
            .insert(ActivityId::from("activity:a"), Decimal::from(3));
        let mut npc = PreferenceLayer::default();
        npc.activity_weights
            .insert(ActivityId::from("activity:a"), Decimal::from(7));
        let mut weights = BTreeMap::new();
        weights.insert(ActivityId::from("activity:b"), Decimal::from(9));
        let session = PreferenceLayer {
            activity_weights: weights,
            ..PreferenceLayer::default()
        };

        let first = resolve_preferences(&routine, &npc, &session);
        let second = resolve_preferences(&routine, &npc, &session);
        assert_eq!(first, second);
    }
}
