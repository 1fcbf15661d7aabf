//! Shared type definitions for the Cadence NPC routine engine.
//!
//! This crate is the single source of truth for the declarative data
//! model: activity templates, routine graphs, the condition language,
//! layered preferences, and per-session NPC state. Types defined here
//! flow downstream to `TypeScript` via `ts-rs` for the authoring UI.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe identifiers: UUID wrappers for runtime entities,
//!   stable string keys for designer-authored configuration
//! - [`enums`] -- Enumeration types (categories, time buckets, moods,
//!   relationship metrics, tiers)
//! - [`condition`] -- The declarative condition language
//! - [`activity`] -- Activity templates: requirements, effects, durations
//! - [`routine`] -- Routine graphs: time/decision/activity nodes and edges
//! - [`preferences`] -- Layered NPC preferences and personality traits
//! - [`session`] -- Mutable per-(session, NPC) runtime state
//! - [`generation`] -- The fire-and-forget generation request record

pub mod activity;
pub mod condition;
pub mod enums;
pub mod generation;
pub mod ids;
pub mod preferences;
pub mod routine;
pub mod session;

// Re-export all public types at crate root for convenience.
pub use activity::{
    Activity, ActivityEffects, ActivityRequirements, MoodImpact, RelationshipDeltas,
};
pub use condition::Condition;
pub use enums::{
    ActivityCategory, LocationKind, MoodTag, RelationshipMetric, SimulationTier, TimeOfDay,
};
pub use generation::GenerationRequest;
pub use ids::{ActivityId, CompanionRef, FlagKey, NodeId, NpcId, RoutineId, SessionId};
pub use preferences::{NpcPreferences, PersonalityTraits, PreferenceLayer, TimeBias};
pub use routine::{
    CandidateActivity, RoutineEdge, RoutineGraph, RoutineNode, RoutineNodeKind, TimeRange,
    TransitionEffects,
};
pub use session::{MoodState, NpcSessionState, PendingRelationshipWrite};

#[cfg(test)]
mod tests {
    //! Integration tests for type exports and `TypeScript` binding generation.

    #[test]
    fn export_bindings() {
        // ts-rs generates TypeScript bindings when types with
        // #[ts(export)] are used. Importing them here triggers generation.
        // The actual files are written to the `bindings/` directory
        // relative to the crate root.
        use ts_rs::TS;

        // IDs
        let _ = crate::ids::NpcId::export_all();
        let _ = crate::ids::SessionId::export_all();
        let _ = crate::ids::ActivityId::export_all();
        let _ = crate::ids::RoutineId::export_all();
        let _ = crate::ids::NodeId::export_all();

        // Configuration model
        let _ = crate::activity::Activity::export_all();
        let _ = crate::condition::Condition::export_all();
        let _ = crate::routine::RoutineGraph::export_all();
        let _ = crate::preferences::PreferenceLayer::export_all();

        // Runtime records
        let _ = crate::session::NpcSessionState::export_all();
        let _ = crate::generation::GenerationRequest::export_all();
    }
}
