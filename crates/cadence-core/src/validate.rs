//! Publish-time validation of world content.
//!
//! Configuration errors are rejected here, before the content ever
//! reaches a tick: dangling activity references, malformed graphs, and
//! ambiguous time-slot overlaps all fail the publish. Runtime code can
//! therefore treat the published set as internally consistent and limit
//! itself to recoverable degradation (a stale reference after a hot
//! reload becomes an infeasible candidate, nothing more).

use cadence_types::{ActivityId, NodeId, RoutineId, RoutineNodeKind, TimeRange};

use crate::catalog::CatalogError;
use crate::world::{WorldConfigSet, WorldDocument};

/// Errors that reject a world document at publish time.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    /// The activity list failed catalog construction.
    #[error("catalog error: {source}")]
    Catalog {
        /// The underlying catalog error.
        #[from]
        source: CatalogError,
    },

    /// Two routine graphs share an id.
    #[error("duplicate routine id: {routine}")]
    DuplicateRoutineId {
        /// The offending id.
        routine: RoutineId,
    },

    /// Two nodes within one graph share an id.
    #[error("duplicate node id {node} in routine {routine}")]
    DuplicateNodeId {
        /// The graph containing the duplicates.
        routine: RoutineId,
        /// The offending node id.
        node: NodeId,
    },

    /// A graph has no time-slot node, so no world time can ever resolve
    /// an active node.
    #[error("routine {routine} has no time-slot nodes")]
    NoTimeSlotNodes {
        /// The offending graph.
        routine: RoutineId,
    },

    /// A time range lies outside the configured day or is empty.
    #[error(
        "invalid time range [{start}, {end}) on node {node} in routine {routine} (day length {day_length})"
    )]
    InvalidTimeRange {
        /// The graph containing the node.
        routine: RoutineId,
        /// The offending node.
        node: NodeId,
        /// Range start in seconds of day.
        start: u32,
        /// Range end in seconds of day.
        end: u32,
        /// The configured day length.
        day_length: u32,
    },

    /// Two time-slot nodes cover *identical* ranges, which the
    /// narrower-range preference cannot order. Distinct overlapping
    /// ranges are legal.
    #[error("time-slot nodes {first} and {second} in routine {routine} have identical ranges")]
    AmbiguousTimeSlots {
        /// The graph containing the nodes.
        routine: RoutineId,
        /// The earlier-declared node.
        first: NodeId,
        /// The later-declared node.
        second: NodeId,
    },

    /// An edge references a node id that does not exist in its graph.
    #[error("edge {from} -> {to} in routine {routine} references unknown node {unknown}")]
    UnknownEdgeEndpoint {
        /// The graph containing the edge.
        routine: RoutineId,
        /// Edge source.
        from: NodeId,
        /// Edge target.
        to: NodeId,
        /// Whichever endpoint failed to resolve.
        unknown: NodeId,
    },

    /// A node references an activity missing from the catalog.
    #[error("node {node} in routine {routine} references unknown activity {activity}")]
    DanglingActivity {
        /// The graph containing the node.
        routine: RoutineId,
        /// The referencing node.
        node: NodeId,
        /// The missing activity id.
        activity: ActivityId,
    },
}

/// Validate a world document and publish it as a [`WorldConfigSet`].
///
/// `day_length_secs` must match the engine configuration the world will
/// run under; time ranges are validated against it.
///
/// # Errors
///
/// Returns the first [`ValidationError`] encountered. Validation is
/// deterministic (declaration order), so fixing errors one at a time
/// converges.
pub fn publish(
    document: WorldDocument,
    day_length_secs: u32,
) -> Result<WorldConfigSet, ValidationError> {
    let catalog = crate::catalog::ActivityCatalog::from_activities(document.activities)?;

    let mut routines = std::collections::BTreeMap::new();
    for graph in document.routines {
        validate_graph(&graph, &catalog, day_length_secs)?;
        let id = graph.id.clone();
        if routines.insert(id.clone(), graph).is_some() {
            return Err(ValidationError::DuplicateRoutineId { routine: id });
        }
    }

    Ok(WorldConfigSet {
        catalog,
        routines,
        npc_preferences: document.npc_preferences,
        role_bindings: document.role_bindings,
    })
}

/// Validate one routine graph against the catalog and day length.
fn validate_graph(
    graph: &cadence_types::RoutineGraph,
    catalog: &crate::catalog::ActivityCatalog,
    day_length_secs: u32,
) -> Result<(), ValidationError> {
    let routine = graph.id.clone();

    // Node ids must be unique.
    let mut seen = std::collections::BTreeSet::new();
    for node in &graph.nodes {
        if !seen.insert(node.id.clone()) {
            return Err(ValidationError::DuplicateNodeId {
                routine,
                node: node.id.clone(),
            });
        }
    }

    // Time-slot ranges: well-formed and pairwise non-identical.
    let mut slot_ranges: Vec<(&NodeId, TimeRange)> = Vec::new();
    for node in &graph.nodes {
        if let RoutineNodeKind::TimeSlot { range, .. } = &node.kind {
            if range.start_secs >= day_length_secs
                || range.end_secs > day_length_secs
                || range.start_secs == range.end_secs
            {
                return Err(ValidationError::InvalidTimeRange {
                    routine,
                    node: node.id.clone(),
                    start: range.start_secs,
                    end: range.end_secs,
                    day_length: day_length_secs,
                });
            }
            if let Some((first, _)) = slot_ranges.iter().find(|(_, r)| r == range) {
                return Err(ValidationError::AmbiguousTimeSlots {
                    routine,
                    first: (*first).clone(),
                    second: node.id.clone(),
                });
            }
            slot_ranges.push((&node.id, *range));
        }
    }
    if slot_ranges.is_empty() {
        return Err(ValidationError::NoTimeSlotNodes { routine });
    }

    // Edges must connect existing nodes.
    for edge in &graph.edges {
        for endpoint in [&edge.from, &edge.to] {
            if graph.node(endpoint).is_none() {
                return Err(ValidationError::UnknownEdgeEndpoint {
                    routine,
                    from: edge.from.clone(),
                    to: edge.to.clone(),
                    unknown: endpoint.clone(),
                });
            }
        }
    }

    // Activity references must exist in the catalog.
    for node in &graph.nodes {
        match &node.kind {
            RoutineNodeKind::TimeSlot { candidates, .. } => {
                for candidate in candidates {
                    if !catalog.contains(&candidate.activity) {
                        return Err(ValidationError::DanglingActivity {
                            routine,
                            node: node.id.clone(),
                            activity: candidate.activity.clone(),
                        });
                    }
                }
            }
            RoutineNodeKind::Activity { activity } => {
                if !catalog.contains(activity) {
                    return Err(ValidationError::DanglingActivity {
                        routine,
                        node: node.id.clone(),
                        activity: activity.clone(),
                    });
                }
            }
            RoutineNodeKind::Decision { .. } => {}
        }
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use cadence_types::{
        Activity, ActivityCategory, ActivityEffects, CandidateActivity, PreferenceLayer,
        RoutineEdge, RoutineGraph, RoutineNode,
    };
    use rust_decimal::Decimal;

    use super::*;

    fn activity(id: &str) -> Activity {
        Activity {
            id: ActivityId::from(id),
            display_name: id.to_owned(),
            category: ActivityCategory::Routine,
            requirements: None,
            effects: ActivityEffects::default(),
            min_duration_secs: 600,
            cooldown_secs: 0,
            scene_intent: None,
            action_blocks: Vec::new(),
        }
    }

    fn time_slot(id: &str, start: u32, end: u32, activities: &[&str]) -> RoutineNode {
        RoutineNode {
            id: NodeId::from(id),
            kind: RoutineNodeKind::TimeSlot {
                range: TimeRange {
                    start_secs: start,
                    end_secs: end,
                },
                candidates: activities
                    .iter()
                    .map(|a| CandidateActivity {
                        activity: ActivityId::from(*a),
                        weight: Decimal::ONE,
                        conditions: Vec::new(),
                    })
                    .collect(),
            },
        }
    }

    fn graph(nodes: Vec<RoutineNode>, edges: Vec<RoutineEdge>) -> RoutineGraph {
        RoutineGraph {
            id: RoutineId::from("routine:test"),
            display_name: String::from("Test"),
            nodes,
            edges,
            preference_defaults: PreferenceLayer::default(),
        }
    }

    fn document(graphs: Vec<RoutineGraph>) -> WorldDocument {
        WorldDocument {
            activities: vec![activity("activity:work"), activity("activity:rest")],
            routines: graphs,
            npc_preferences: std::collections::BTreeMap::new(),
            role_bindings: std::collections::BTreeMap::new(),
        }
    }

    const DAY: u32 = 86_400;

    #[test]
    fn valid_document_publishes() {
        let doc = document(vec![graph(
            vec![time_slot("node:day", 0, 43_200, &["activity:work"])],
            Vec::new(),
        )]);
        let world = publish(doc, DAY).unwrap();
        assert_eq!(world.catalog.len(), 2);
        assert!(world.routine(&RoutineId::from("routine:test")).is_some());
    }

    #[test]
    fn dangling_activity_rejected() {
        let doc = document(vec![graph(
            vec![time_slot("node:day", 0, 43_200, &["activity:fly"])],
            Vec::new(),
        )]);
        assert!(matches!(
            publish(doc, DAY),
            Err(ValidationError::DanglingActivity { .. })
        ));
    }

    #[test]
    fn unknown_edge_endpoint_rejected() {
        let doc = document(vec![graph(
            vec![time_slot("node:day", 0, 43_200, &["activity:work"])],
            vec![RoutineEdge {
                from: NodeId::from("node:day"),
                to: NodeId::from("node:ghost"),
                conditions: Vec::new(),
                weight: None,
                transition_effects: None,
            }],
        )]);
        assert!(matches!(
            publish(doc, DAY),
            Err(ValidationError::UnknownEdgeEndpoint { .. })
        ));
    }

    #[test]
    fn identical_time_slots_rejected() {
        let doc = document(vec![graph(
            vec![
                time_slot("node:a", 0, 43_200, &["activity:work"]),
                time_slot("node:b", 0, 43_200, &["activity:rest"]),
            ],
            Vec::new(),
        )]);
        assert!(matches!(
            publish(doc, DAY),
            Err(ValidationError::AmbiguousTimeSlots { .. })
        ));
    }

    #[test]
    fn distinct_overlapping_slots_allowed() {
        let doc = document(vec![graph(
            vec![
                time_slot("node:wide", 0, 43_200, &["activity:work"]),
                time_slot("node:narrow", 32_400, 39_600, &["activity:rest"]),
            ],
            Vec::new(),
        )]);
        assert!(publish(doc, DAY).is_ok());
    }

    #[test]
    fn empty_and_out_of_day_ranges_rejected() {
        let doc = document(vec![graph(
            vec![time_slot("node:a", 10, 10, &["activity:work"])],
            Vec::new(),
        )]);
        assert!(matches!(
            publish(doc, DAY),
            Err(ValidationError::InvalidTimeRange { .. })
        ));

        let doc = document(vec![graph(
            vec![time_slot("node:a", 0, DAY.saturating_add(1), &["activity:work"])],
            Vec::new(),
        )]);
        assert!(matches!(
            publish(doc, DAY),
            Err(ValidationError::InvalidTimeRange { .. })
        ));
    }

    #[test]
    fn graph_without_time_slots_rejected() {
        let doc = document(vec![graph(
            vec![RoutineNode {
                id: NodeId::from("node:decide"),
                kind: RoutineNodeKind::Decision {
                    default_conditions: Vec::new(),
                },
            }],
            Vec::new(),
        )]);
        assert!(matches!(
            publish(doc, DAY),
            Err(ValidationError::NoTimeSlotNodes { .. })
        ));
    }

    #[test]
    fn duplicate_node_ids_rejected() {
        let doc = document(vec![graph(
            vec![
                time_slot("node:a", 0, 100, &["activity:work"]),
                time_slot("node:a", 200, 300, &["activity:rest"]),
            ],
            Vec::new(),
        )]);
        assert!(matches!(
            publish(doc, DAY),
            Err(ValidationError::DuplicateNodeId { .. })
        ));
    }

    #[test]
    fn duplicate_routine_ids_rejected() {
        let g1 = graph(
            vec![time_slot("node:a", 0, 100, &["activity:work"])],
            Vec::new(),
        );
        let g2 = g1.clone();
        let doc = document(vec![g1, g2]);
        assert!(matches!(
            publish(doc, DAY),
            Err(ValidationError::DuplicateRoutineId { .. })
        ));
    }
}
