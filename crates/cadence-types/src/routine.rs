//! Routine graphs: per-archetype directed graphs of time/decision/activity
//! nodes describing *when* which activities are eligible.
//!
//! A graph is world-level configuration owned by the archetype (e.g.
//! `"routine:shopkeeper_daily"`) and assigned to NPCs by reference, never
//! embedded per NPC. Designer-introduced cycles are legal: traversal is
//! bounded by a hop counter, not a visited set, because revisiting a
//! decision node under new conditions is intentional.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::activity::MoodImpact;
use crate::condition::Condition;
use crate::ids::{ActivityId, FlagKey, NodeId, RoutineId};
use crate::preferences::PreferenceLayer;

// ---------------------------------------------------------------------------
// Time ranges
// ---------------------------------------------------------------------------

/// A half-open range of seconds-of-day, `[start, end)`.
///
/// Ranges may wrap midnight: `start > end` means the range covers
/// `[start, day_length) and [0, end)` (e.g. a night shift 22:00–04:00).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TimeRange {
    /// Inclusive start, in seconds of day.
    pub start_secs: u32,
    /// Exclusive end, in seconds of day.
    pub end_secs: u32,
}

impl TimeRange {
    /// Whether `seconds_of_day` falls inside this range.
    pub const fn contains(&self, seconds_of_day: u32) -> bool {
        if self.start_secs <= self.end_secs {
            seconds_of_day >= self.start_secs && seconds_of_day < self.end_secs
        } else {
            // Wrapping range (crosses midnight).
            seconds_of_day >= self.start_secs || seconds_of_day < self.end_secs
        }
    }

    /// Width of the range in seconds, given the configured day length.
    ///
    /// Used by traversal to prefer the narrower of two overlapping
    /// time-slot nodes. Saturates rather than wrapping on malformed input;
    /// publish-time validation rejects ranges wider than the day.
    pub const fn width_secs(&self, day_length_secs: u32) -> u32 {
        if self.start_secs <= self.end_secs {
            self.end_secs.saturating_sub(self.start_secs)
        } else {
            day_length_secs
                .saturating_sub(self.start_secs)
                .saturating_add(self.end_secs)
        }
    }
}

// ---------------------------------------------------------------------------
// Nodes
// ---------------------------------------------------------------------------

/// One candidate activity offered by a time-slot node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct CandidateActivity {
    /// The activity on offer.
    pub activity: ActivityId,

    /// Base weight feeding the scoring product (default 1).
    #[serde(default = "default_weight")]
    #[ts(as = "String")]
    pub weight: Decimal,

    /// Conditions that must all pass for the candidate to be offered.
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

fn default_weight() -> Decimal {
    Decimal::ONE
}

/// The kind-specific payload of a routine node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum RoutineNodeKind {
    /// Active during a time range; offers a weighted candidate list.
    TimeSlot {
        /// When this node is active.
        range: TimeRange,
        /// Candidate activities offered while active.
        candidates: Vec<CandidateActivity>,
    },

    /// A branch point. Outgoing edges are evaluated in declaration order;
    /// edges without their own conditions inherit `default_conditions`.
    Decision {
        /// Conditions inherited by outgoing edges that declare none.
        #[serde(default)]
        default_conditions: Vec<Condition>,
    },

    /// A pass-through node offering exactly one activity.
    Activity {
        /// The single activity this node resolves to.
        activity: ActivityId,
    },
}

/// A node in a routine graph, identified by id.
///
/// Immutable within a published graph. Declaration order matters: it is
/// the documented tie-break for overlapping time-slot nodes of equal
/// width and the evaluation order for outgoing edges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RoutineNode {
    /// Stable node key, unique within the graph.
    pub id: NodeId,
    /// Kind-specific payload.
    #[serde(flatten)]
    pub kind: RoutineNodeKind,
}

// ---------------------------------------------------------------------------
// Edges
// ---------------------------------------------------------------------------

/// Effects applied once when a routine edge is taken during traversal.
///
/// Unlike activity effects, transition effects are instantaneous: the
/// energy delta is applied as-is, not scaled by a duration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TransitionEffects {
    /// Instant energy change.
    #[serde(default)]
    #[ts(as = "String")]
    pub energy: Decimal,
    /// Mood vector add and tag churn.
    #[serde(default)]
    pub mood_impact: MoodImpact,
    /// Session flags to set.
    #[serde(default)]
    pub flags: std::collections::BTreeMap<FlagKey, serde_json::Value>,
}

/// A directed edge between two routine nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RoutineEdge {
    /// Source node id.
    pub from: NodeId,
    /// Target node id.
    pub to: NodeId,

    /// Conditions for taking this edge. Empty means: inherit the source
    /// decision node's default conditions (or always pass if none).
    #[serde(default)]
    pub conditions: Vec<Condition>,

    /// Weight for the draw among simultaneously-passing edges (default 1).
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub weight: Option<Decimal>,

    /// Effects applied when the edge is taken.
    #[serde(default)]
    pub transition_effects: Option<TransitionEffects>,
}

// ---------------------------------------------------------------------------
// Graph
// ---------------------------------------------------------------------------

/// A named routine graph representing one behavioral archetype.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RoutineGraph {
    /// Stable graph key (e.g. `"routine:shopkeeper_daily"`).
    pub id: RoutineId,

    /// Human-readable name for logs and tooling.
    pub display_name: String,

    /// Nodes, in declaration order.
    pub nodes: Vec<RoutineNode>,

    /// Edges, in declaration order.
    #[serde(default)]
    pub edges: Vec<RoutineEdge>,

    /// Preference defaults contributed by this archetype -- the lowest
    /// layer of the preference merge.
    #[serde(default)]
    pub preference_defaults: PreferenceLayer,
}

impl RoutineGraph {
    /// Find a node by id.
    pub fn node(&self, id: &NodeId) -> Option<&RoutineNode> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    /// Outgoing edges of a node, in declaration order.
    pub fn edges_from<'a>(&'a self, id: &'a NodeId) -> impl Iterator<Item = &'a RoutineEdge> {
        self.edges.iter().filter(move |e| &e.from == id)
    }
}
