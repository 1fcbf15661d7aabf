//! Routine graph traversal: finding the node that governs "now".
//!
//! Traversal starts from time-slot nodes: the node whose range contains
//! the current seconds-of-day wins, preferring the narrower range when
//! several overlap (a lunch-hour slot beats an all-day slot). Remaining
//! ties break by declaration order -- a documented, deliberate rule, not
//! an accident of iteration.
//!
//! From there, decision nodes route along their outgoing edges: edges
//! are evaluated in declaration order, a single passing edge is taken
//! directly, and multiple passing edges are drawn by weight from the
//! shared seeded random source. Cycles are legal by design (revisiting a
//! decision node under new conditions is intentional), so traversal is
//! bounded by a hop counter rather than a visited set. Exceeding the
//! limit is recoverable: the caller falls back to idle and the incident
//! is logged at warn.

use rand::Rng;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use tracing::warn;

use cadence_types::{
    NodeId, RoutineEdge, RoutineGraph, RoutineId, RoutineNode, RoutineNodeKind, TransitionEffects,
};

use crate::clock::WorldClock;
use crate::condition::{ConditionContext, ConditionEvaluator};

/// Fixed-point scale for edge-weight draws (milli-weights).
const WEIGHT_SCALE: Decimal = Decimal::from_parts(1000, 0, 0, false, 0);

/// Recoverable traversal failures.
///
/// None of these abort a tick: the resolver degrades the NPC to its
/// fallback and carries on.
#[derive(Debug, thiserror::Error)]
pub enum TraversalError {
    /// No time-slot node covers the current time.
    #[error("no time-slot node in routine {routine} covers second-of-day {seconds_of_day}")]
    NoActiveNode {
        /// The graph that was searched.
        routine: RoutineId,
        /// The uncovered second of day.
        seconds_of_day: u32,
    },

    /// Traversal followed more edges than the hop limit allows --
    /// almost always a misconfigured cycle with always-true conditions.
    #[error("hop limit {limit} exceeded in routine {routine}")]
    HopLimitExceeded {
        /// The graph being traversed.
        routine: RoutineId,
        /// The configured hop limit.
        limit: u32,
    },

    /// A decision node had no passing outgoing edge.
    #[error("decision node {node} in routine {routine} has no passing edge")]
    DeadEnd {
        /// The graph being traversed.
        routine: RoutineId,
        /// The stuck decision node.
        node: NodeId,
    },
}

/// The result of traversal: the governing node plus any transition
/// effects picked up along the taken edges, in order.
#[derive(Debug)]
pub struct ActiveNode<'a> {
    /// The node that governs activity selection right now.
    pub node: &'a RoutineNode,
    /// Transition effects of the edges taken to reach it.
    pub transitions: Vec<&'a TransitionEffects>,
}

/// Find the routine node governing the current world time.
///
/// # Errors
///
/// Returns a [`TraversalError`] when no time-slot covers the current
/// time, a decision node dead-ends, or the hop limit is exceeded. All
/// are recoverable; callers fall back to idle.
pub fn find_active_node<'a, R: Rng + ?Sized>(
    graph: &'a RoutineGraph,
    clock: &WorldClock,
    evaluator: &ConditionEvaluator,
    ctx: &ConditionContext<'_>,
    hop_limit: u32,
    rng: &mut R,
) -> Result<ActiveNode<'a>, TraversalError> {
    let seconds_of_day = clock.seconds_of_day();
    let day_length = clock.day_length_secs();

    // Entry: the narrowest time-slot containing now. Strict less-than
    // keeps the earliest-declared node on width ties.
    let mut entry: Option<(&RoutineNode, u32)> = None;
    for node in &graph.nodes {
        if let RoutineNodeKind::TimeSlot { range, .. } = &node.kind
            && range.contains(seconds_of_day)
        {
            let width = range.width_secs(day_length);
            if entry.is_none_or(|(_, best)| width < best) {
                entry = Some((node, width));
            }
        }
    }
    let Some((mut current, _)) = entry else {
        return Err(TraversalError::NoActiveNode {
            routine: graph.id.clone(),
            seconds_of_day,
        });
    };

    let mut transitions: Vec<&'a TransitionEffects> = Vec::new();
    let mut hops: u32 = 0;

    loop {
        match &current.kind {
            // A time-slot offering candidates is terminal; a bare one
            // (no candidates) may route onward like a decision node.
            RoutineNodeKind::TimeSlot { candidates, .. } if !candidates.is_empty() => {
                return Ok(ActiveNode {
                    node: current,
                    transitions,
                });
            }
            RoutineNodeKind::Activity { .. } => {
                return Ok(ActiveNode {
                    node: current,
                    transitions,
                });
            }
            RoutineNodeKind::TimeSlot { .. } | RoutineNodeKind::Decision { .. } => {}
        }

        let default_conditions = match &current.kind {
            RoutineNodeKind::Decision { default_conditions } => default_conditions.as_slice(),
            _ => &[],
        };

        // Collect passing edges in declaration order.
        let mut passing: Vec<&RoutineEdge> = Vec::new();
        for edge in graph.edges_from(&current.id) {
            let conditions = if edge.conditions.is_empty() {
                default_conditions
            } else {
                edge.conditions.as_slice()
            };
            if evaluator.evaluate_all(conditions, ctx, rng) {
                passing.push(edge);
            }
        }

        let chosen = match passing.as_slice() {
            [] => {
                // A bare time-slot with no outgoing edges is terminal
                // with zero candidates; the resolver falls back.
                if matches!(current.kind, RoutineNodeKind::TimeSlot { .. }) {
                    return Ok(ActiveNode {
                        node: current,
                        transitions,
                    });
                }
                return Err(TraversalError::DeadEnd {
                    routine: graph.id.clone(),
                    node: current.id.clone(),
                });
            }
            [only] => *only,
            several => {
                let Some(edge) = pick_weighted_edge(several, rng) else {
                    return Err(TraversalError::DeadEnd {
                        routine: graph.id.clone(),
                        node: current.id.clone(),
                    });
                };
                edge
            }
        };

        hops = hops.saturating_add(1);
        if hops > hop_limit {
            return Err(TraversalError::HopLimitExceeded {
                routine: graph.id.clone(),
                limit: hop_limit,
            });
        }

        if let Some(effects) = &chosen.transition_effects {
            transitions.push(effects);
        }

        let Some(next) = graph.node(&chosen.to) else {
            // Validation guarantees endpoints exist; a hot reload could
            // in principle race this, so degrade instead of panicking.
            warn!(routine = %graph.id, to = %chosen.to, "edge target vanished mid-traversal");
            return Err(TraversalError::DeadEnd {
                routine: graph.id.clone(),
                node: current.id.clone(),
            });
        };
        current = next;
    }
}

/// Weighted draw among passing edges.
///
/// Weights default to 1 and scale to milli-weight ticks; non-positive
/// weights contribute nothing. If every weight is non-positive the
/// earliest-declared edge wins.
fn pick_weighted_edge<'a, R: Rng + ?Sized>(
    edges: &[&'a RoutineEdge],
    rng: &mut R,
) -> Option<&'a RoutineEdge> {
    let first = edges.first().copied()?;

    let ticks: Vec<u64> = edges
        .iter()
        .map(|e| weight_ticks(e.weight.unwrap_or(Decimal::ONE)))
        .collect();
    let total: u64 = ticks.iter().fold(0, |acc, t| acc.saturating_add(*t));
    if total == 0 {
        return Some(first);
    }

    let mut roll = rng.random_range(0..total);
    for (edge, t) in edges.iter().zip(ticks.iter()) {
        if roll < *t {
            return Some(*edge);
        }
        roll = roll.saturating_sub(*t);
    }
    Some(first)
}

/// Convert a weight to fixed-point draw ticks (floor at zero).
fn weight_ticks(weight: Decimal) -> u64 {
    weight
        .saturating_mul(WEIGHT_SCALE)
        .trunc()
        .to_u64()
        .unwrap_or(0)
}
