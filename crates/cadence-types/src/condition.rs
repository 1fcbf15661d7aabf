//! The declarative condition language.
//!
//! Conditions are pure predicates evaluated against a read-only snapshot
//! of world/session/NPC state. They appear on routine edges, on candidate
//! activity references, and on decision nodes. Evaluation lives in
//! `cadence-core`; this module only defines the data shape.
//!
//! The `Custom` variant is the open extension point: hosts register a
//! handler per string id, and unknown ids evaluate to `false` (fail
//! closed) rather than erroring.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{MoodTag, RelationshipMetric, TimeOfDay};
use crate::ids::{CompanionRef, FlagKey};

/// A declarative predicate over current world/session/NPC state.
///
/// All variants are side-effect free. `RandomChance` draws from the
/// shared seeded random source so evaluation stays reproducible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Condition {
    /// A relationship metric toward `target` falls within `[min, max]`.
    ///
    /// Omitted bounds are open (no constraint on that side).
    RelationshipThreshold {
        /// Whose relationship to inspect (literal NPC or role).
        #[ts(as = "String")]
        target: CompanionRef,
        /// The metric to compare.
        metric: RelationshipMetric,
        /// Inclusive lower bound, if any.
        #[serde(default)]
        #[ts(as = "Option<String>")]
        min: Option<Decimal>,
        /// Inclusive upper bound, if any.
        #[serde(default)]
        #[ts(as = "Option<String>")]
        max: Option<Decimal>,
    },

    /// A session flag equals the given JSON value.
    ///
    /// An unset flag only matches the JSON `null` value.
    FlagEquals {
        /// The flag to read.
        flag: FlagKey,
        /// The value it must equal.
        value: serde_json::Value,
    },

    /// The NPC's current mood tags intersect `any_of`.
    MoodTagIn {
        /// Tags that satisfy the condition (any one suffices).
        any_of: Vec<MoodTag>,
    },

    /// The NPC's current energy falls within `[min, max]`.
    EnergyRange {
        /// Inclusive lower bound, if any.
        #[serde(default)]
        #[ts(as = "Option<String>")]
        min: Option<Decimal>,
        /// Inclusive upper bound, if any.
        #[serde(default)]
        #[ts(as = "Option<String>")]
        max: Option<Decimal>,
    },

    /// Passes with the given probability per evaluation.
    RandomChance {
        /// Probability in `[0, 1]`.
        #[ts(as = "String")]
        probability: Decimal,
    },

    /// The current time-of-day bucket is one of `any_of`.
    TimeOfDayIn {
        /// Buckets that satisfy the condition.
        any_of: Vec<TimeOfDay>,
    },

    /// A host-registered custom condition.
    ///
    /// Resolved through the evaluator's extension registry by `id`. If no
    /// handler is registered the condition evaluates `false` and the miss
    /// is logged, never raised as an error.
    Custom {
        /// Registry key of the handler.
        id: String,
        /// Free-form parameters passed to the handler.
        #[serde(default)]
        params: BTreeMap<String, serde_json::Value>,
    },
}
