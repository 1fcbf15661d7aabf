//! Sample world content for the demo binary.
//!
//! A small harbor town: a shopkeeper with a market-hours routine, a
//! night watchman on a wrapping overnight shift, and a deckhand who
//! loiters at the tavern. Enough content to exercise time slots,
//! decision branches, wrapping ranges, cooldowns, roles, and a scene
//! intent without drowning the log.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use cadence_core::scheduler::NpcHandle;
use cadence_core::world::WorldDocument;
use cadence_types::{
    Activity, ActivityCategory, ActivityEffects, ActivityId, ActivityRequirements, CandidateActivity,
    CompanionRef, Condition, LocationKind, MoodImpact, NodeId, NpcId, PersonalityTraits,
    PreferenceLayer, RelationshipDeltas, RoutineEdge, RoutineGraph, RoutineId, RoutineNode,
    RoutineNodeKind, SimulationTier, TimeBias, TimeRange,
};

/// The built sample world: content plus a matching roster.
pub struct SampleWorld {
    /// World content ready for publishing.
    pub document: WorldDocument,
    /// The roster the demo loop drives.
    pub roster: Vec<NpcHandle>,
}

/// Build the sample world and roster.
pub fn build() -> SampleWorld {
    let marta = NpcId::new();
    let joris = NpcId::new();
    let pell = NpcId::new();

    let mut npc_preferences = BTreeMap::new();
    npc_preferences.insert(
        marta,
        PreferenceLayer {
            personality: Some(PersonalityTraits {
                extraversion: Decimal::new(6, 1),
                conscientiousness: Decimal::new(8, 1),
                openness: Decimal::new(4, 1),
            }),
            time_bias: Some(TimeBias {
                early_riser: true,
                night_owl: false,
            }),
            ..PreferenceLayer::default()
        },
    );
    npc_preferences.insert(
        joris,
        PreferenceLayer {
            personality: Some(PersonalityTraits {
                extraversion: Decimal::new(3, 1),
                conscientiousness: Decimal::new(7, 1),
                openness: Decimal::new(5, 1),
            }),
            time_bias: Some(TimeBias {
                early_riser: false,
                night_owl: true,
            }),
            ..PreferenceLayer::default()
        },
    );

    let mut role_bindings = BTreeMap::new();
    let mut marta_roles = BTreeMap::new();
    marta_roles.insert(String::from("role:drinking_companion"), joris);
    role_bindings.insert(marta, marta_roles);

    let document = WorldDocument {
        activities: activities(),
        routines: vec![shopkeeper_daily(), watchman_nightly()],
        npc_preferences,
        role_bindings,
    };

    let roster = vec![
        NpcHandle {
            npc_id: marta,
            routine_id: RoutineId::from("routine:shopkeeper_daily"),
            tier: SimulationTier::Active,
            location: String::from("place:market_row"),
            location_kind: LocationKind::Shop,
            session_preferences: PreferenceLayer::default(),
        },
        NpcHandle {
            npc_id: joris,
            routine_id: RoutineId::from("routine:watchman_nightly"),
            tier: SimulationTier::Background,
            location: String::from("place:north_gate"),
            location_kind: LocationKind::Street,
            session_preferences: PreferenceLayer::default(),
        },
        NpcHandle {
            npc_id: pell,
            routine_id: RoutineId::from("routine:shopkeeper_daily"),
            tier: SimulationTier::Background,
            location: String::from("place:anchor_tavern"),
            location_kind: LocationKind::Tavern,
            session_preferences: PreferenceLayer::default(),
        },
    ];

    SampleWorld { document, roster }
}

/// The activity catalog for the sample town.
fn activities() -> Vec<Activity> {
    vec![
        Activity {
            id: ActivityId::from("activity:idle"),
            display_name: String::from("Idle about"),
            category: ActivityCategory::Routine,
            requirements: None,
            effects: ActivityEffects {
                energy_per_hour: Decimal::ONE,
                ..ActivityEffects::default()
            },
            min_duration_secs: 600,
            cooldown_secs: 0,
            scene_intent: None,
            action_blocks: Vec::new(),
        },
        Activity {
            id: ActivityId::from("activity:sleep"),
            display_name: String::from("Sleep"),
            category: ActivityCategory::Routine,
            requirements: None,
            effects: ActivityEffects {
                energy_per_hour: Decimal::from(12),
                mood_impact: MoodImpact {
                    remove_tags: vec![cadence_types::MoodTag::Tired],
                    ..MoodImpact::default()
                },
                ..ActivityEffects::default()
            },
            min_duration_secs: 21_600,
            cooldown_secs: 0,
            scene_intent: None,
            action_blocks: Vec::new(),
        },
        Activity {
            id: ActivityId::from("activity:open_shop"),
            display_name: String::from("Open the shop"),
            category: ActivityCategory::Work,
            requirements: Some(ActivityRequirements {
                location_kinds: vec![LocationKind::Shop],
                min_energy: Some(Decimal::from(20)),
                ..ActivityRequirements::default()
            }),
            effects: ActivityEffects {
                energy_per_hour: Decimal::from(-4),
                ..ActivityEffects::default()
            },
            min_duration_secs: 7_200,
            cooldown_secs: 0,
            scene_intent: None,
            action_blocks: Vec::new(),
        },
        Activity {
            id: ActivityId::from("activity:tend_counter"),
            display_name: String::from("Tend the counter"),
            category: ActivityCategory::Work,
            requirements: Some(ActivityRequirements {
                location_kinds: vec![LocationKind::Shop],
                min_energy: Some(Decimal::from(10)),
                ..ActivityRequirements::default()
            }),
            effects: ActivityEffects {
                energy_per_hour: Decimal::from(-3),
                ..ActivityEffects::default()
            },
            min_duration_secs: 3_600,
            cooldown_secs: 0,
            scene_intent: None,
            action_blocks: Vec::new(),
        },
        Activity {
            id: ActivityId::from("activity:patrol"),
            display_name: String::from("Walk the walls"),
            category: ActivityCategory::Work,
            requirements: Some(ActivityRequirements {
                location_kinds: vec![LocationKind::Street],
                min_energy: Some(Decimal::from(15)),
                ..ActivityRequirements::default()
            }),
            effects: ActivityEffects {
                energy_per_hour: Decimal::from(-5),
                ..ActivityEffects::default()
            },
            min_duration_secs: 7_200,
            cooldown_secs: 0,
            scene_intent: None,
            action_blocks: Vec::new(),
        },
        Activity {
            id: ActivityId::from("activity:tavern_round"),
            display_name: String::from("A round at the tavern"),
            category: ActivityCategory::Social,
            requirements: Some(ActivityRequirements {
                location_kinds: vec![LocationKind::Tavern],
                min_energy: Some(Decimal::from(25)),
                ..ActivityRequirements::default()
            }),
            effects: ActivityEffects {
                energy_per_hour: Decimal::from(-2),
                mood_impact: MoodImpact {
                    valence: Decimal::new(15, 2),
                    arousal: Decimal::new(1, 1),
                    add_tags: vec![cadence_types::MoodTag::Cheerful],
                    remove_tags: Vec::new(),
                },
                relationship_deltas: BTreeMap::from([(
                    CompanionRef::Role(String::from("role:drinking_companion")),
                    RelationshipDeltas {
                        affinity: Decimal::from(2),
                        trust: Decimal::ONE,
                        ..RelationshipDeltas::default()
                    },
                )]),
                ..ActivityEffects::default()
            },
            min_duration_secs: 5_400,
            cooldown_secs: 21_600,
            scene_intent: Some(String::from("share a round and trade harbor gossip")),
            action_blocks: vec![String::from("block:raise_tankard")],
        },
        Activity {
            id: ActivityId::from("activity:stroll"),
            display_name: String::from("Stroll the docks"),
            category: ActivityCategory::Leisure,
            requirements: None,
            effects: ActivityEffects {
                energy_per_hour: Decimal::from(-1),
                mood_impact: MoodImpact {
                    valence: Decimal::new(5, 2),
                    ..MoodImpact::default()
                },
                ..ActivityEffects::default()
            },
            min_duration_secs: 2_700,
            cooldown_secs: 0,
            scene_intent: None,
            action_blocks: Vec::new(),
        },
    ]
}

/// Shopkeeper: sleep overnight, errands in the morning, shop through
/// the day, and an evening decision between tavern and a quiet stroll.
fn shopkeeper_daily() -> RoutineGraph {
    RoutineGraph {
        id: RoutineId::from("routine:shopkeeper_daily"),
        display_name: String::from("Shopkeeper daily"),
        nodes: vec![
            RoutineNode {
                id: NodeId::from("node:night"),
                kind: RoutineNodeKind::TimeSlot {
                    range: TimeRange {
                        start_secs: 79_200,
                        end_secs: 21_600,
                    },
                    candidates: vec![candidate("activity:sleep", 1, &[])],
                },
            },
            RoutineNode {
                id: NodeId::from("node:morning"),
                kind: RoutineNodeKind::TimeSlot {
                    range: TimeRange {
                        start_secs: 21_600,
                        end_secs: 32_400,
                    },
                    candidates: vec![
                        candidate("activity:stroll", 1, &[]),
                        candidate("activity:idle", 1, &[]),
                    ],
                },
            },
            RoutineNode {
                id: NodeId::from("node:workday"),
                kind: RoutineNodeKind::TimeSlot {
                    range: TimeRange {
                        start_secs: 32_400,
                        end_secs: 61_200,
                    },
                    candidates: vec![
                        CandidateActivity {
                            activity: ActivityId::from("activity:open_shop"),
                            weight: Decimal::from(2),
                            conditions: Vec::new(),
                        },
                        CandidateActivity {
                            activity: ActivityId::from("activity:tend_counter"),
                            weight: Decimal::new(15, 1),
                            conditions: Vec::new(),
                        },
                        CandidateActivity {
                            activity: ActivityId::from("activity:stroll"),
                            weight: Decimal::new(5, 1),
                            conditions: Vec::new(),
                        },
                    ],
                },
            },
            RoutineNode {
                id: NodeId::from("node:evening"),
                kind: RoutineNodeKind::TimeSlot {
                    range: TimeRange {
                        start_secs: 61_200,
                        end_secs: 79_200,
                    },
                    candidates: Vec::new(),
                },
            },
            RoutineNode {
                id: NodeId::from("node:evening_choice"),
                kind: RoutineNodeKind::Decision {
                    default_conditions: Vec::new(),
                },
            },
            RoutineNode {
                id: NodeId::from("node:tavern"),
                kind: RoutineNodeKind::Activity {
                    activity: ActivityId::from("activity:tavern_round"),
                },
            },
            RoutineNode {
                id: NodeId::from("node:quiet_evening"),
                kind: RoutineNodeKind::Activity {
                    activity: ActivityId::from("activity:stroll"),
                },
            },
        ],
        edges: vec![
            RoutineEdge {
                from: NodeId::from("node:evening"),
                to: NodeId::from("node:evening_choice"),
                conditions: Vec::new(),
                weight: None,
                transition_effects: None,
            },
            RoutineEdge {
                from: NodeId::from("node:evening_choice"),
                to: NodeId::from("node:tavern"),
                conditions: vec![Condition::EnergyRange {
                    min: Some(Decimal::from(30)),
                    max: None,
                }],
                weight: Some(Decimal::from(2)),
                transition_effects: None,
            },
            RoutineEdge {
                from: NodeId::from("node:evening_choice"),
                to: NodeId::from("node:quiet_evening"),
                conditions: Vec::new(),
                weight: Some(Decimal::ONE),
                transition_effects: None,
            },
        ],
        preference_defaults: PreferenceLayer {
            category_weights: BTreeMap::from([(ActivityCategory::Work, Decimal::new(12, 1))]),
            ..PreferenceLayer::default()
        },
    }
}

/// Watchman: sleep through the day, patrol a wrapping overnight shift.
fn watchman_nightly() -> RoutineGraph {
    RoutineGraph {
        id: RoutineId::from("routine:watchman_nightly"),
        display_name: String::from("Watchman nightly"),
        nodes: vec![
            RoutineNode {
                id: NodeId::from("node:day_rest"),
                kind: RoutineNodeKind::TimeSlot {
                    range: TimeRange {
                        start_secs: 28_800,
                        end_secs: 57_600,
                    },
                    candidates: vec![candidate("activity:sleep", 1, &[])],
                },
            },
            RoutineNode {
                id: NodeId::from("node:dusk"),
                kind: RoutineNodeKind::TimeSlot {
                    range: TimeRange {
                        start_secs: 57_600,
                        end_secs: 72_000,
                    },
                    candidates: vec![
                        candidate("activity:stroll", 1, &[]),
                        candidate("activity:idle", 1, &[]),
                    ],
                },
            },
            RoutineNode {
                id: NodeId::from("node:watch"),
                kind: RoutineNodeKind::TimeSlot {
                    range: TimeRange {
                        start_secs: 72_000,
                        end_secs: 28_800,
                    },
                    candidates: vec![
                        CandidateActivity {
                            activity: ActivityId::from("activity:patrol"),
                            weight: Decimal::from(3),
                            conditions: Vec::new(),
                        },
                        candidate("activity:idle", 1, &[]),
                    ],
                },
            },
        ],
        edges: Vec::new(),
        preference_defaults: PreferenceLayer::default(),
    }
}

/// Shorthand for an unconditioned candidate with an integer weight.
fn candidate(activity: &str, weight: i64, conditions: &[Condition]) -> CandidateActivity {
    CandidateActivity {
        activity: ActivityId::from(activity),
        weight: Decimal::from(weight),
        conditions: conditions.to_vec(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn sample_world_publishes_cleanly() {
        let sample = build();
        let world = cadence_core::publish(sample.document, 86_400).unwrap();
        assert_eq!(world.catalog.len(), 7);
        assert_eq!(world.routines.len(), 2);
        assert_eq!(sample.roster.len(), 3);
    }

    #[test]
    fn roster_routines_exist_in_world() {
        let sample = build();
        let world = cadence_core::publish(sample.document, 86_400).unwrap();
        for handle in &sample.roster {
            assert!(
                world.routine(&handle.routine_id).is_some(),
                "missing routine {}",
                handle.routine_id
            );
        }
    }
}
