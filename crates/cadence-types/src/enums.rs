//! Enumeration types for the Cadence routine engine.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Activity categories
// ---------------------------------------------------------------------------

/// The broad category an activity belongs to.
///
/// Categories carry per-category preference weights and map onto
/// personality traits during scoring (sociable NPCs favor `Social`,
/// conscientious NPCs favor `Work` and `Routine`, open NPCs favor
/// `Leisure` and `Quest`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ActivityCategory {
    /// Productive labor: tending a shop, smithing, farming.
    Work,
    /// Interaction with other NPCs: conversation, shared meals, games.
    Social,
    /// Unstructured enjoyment: reading, walking, hobbies.
    Leisure,
    /// Maintenance of self and home: eating, sleeping, chores.
    Routine,
    /// Story-driven objectives assigned by the host.
    Quest,
}

// ---------------------------------------------------------------------------
// Time of day
// ---------------------------------------------------------------------------

/// Coarse time-of-day bucket derived from the world clock.
///
/// Buckets are fixed fractions of the configured day length; with the
/// default 86,400-second day they map to Dawn 04:00–08:00, Morning
/// 08:00–12:00, Afternoon 12:00–18:00, Dusk 18:00–22:00, and Night
/// 22:00–04:00.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum TimeOfDay {
    /// Early hours before the working day.
    Dawn,
    /// The working morning.
    Morning,
    /// Midday through late afternoon.
    Afternoon,
    /// Evening wind-down.
    Dusk,
    /// Late night.
    Night,
}

// ---------------------------------------------------------------------------
// Location kinds
// ---------------------------------------------------------------------------

/// The kind of place an NPC can currently be at.
///
/// Activity requirements constrain selection by location kind rather than
/// by concrete place, so the same catalog works across differently-shaped
/// worlds. Pathfinding and concrete positions are outside this engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum LocationKind {
    /// The NPC's own residence.
    Home,
    /// A place of employment (counter, forge, field).
    Workplace,
    /// A commercial storefront.
    Shop,
    /// A tavern, inn, or other social venue.
    Tavern,
    /// Open streets and squares.
    Street,
    /// A market or trading ground.
    Market,
    /// Parks, gardens, and other green space.
    Park,
    /// A temple or shrine.
    Temple,
    /// Untamed land beyond the settlement.
    Wilderness,
}

// ---------------------------------------------------------------------------
// Mood tags
// ---------------------------------------------------------------------------

/// A discrete mood label layered on top of the valence/arousal vector.
///
/// Tags gate activity requirements and conditions ("only when cheerful"),
/// while the continuous vector drives scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum MoodTag {
    /// High valence, high arousal.
    Cheerful,
    /// High valence, low arousal.
    Content,
    /// Low valence, high arousal.
    Anxious,
    /// Low valence, high arousal, outward-directed.
    Irritable,
    /// Low valence, low arousal.
    Melancholy,
    /// Neutral valence, high arousal.
    Energetic,
    /// Neutral valence, low arousal.
    Tired,
    /// Affection-directed; set by social effects.
    Affectionate,
}

// ---------------------------------------------------------------------------
// Relationship metrics
// ---------------------------------------------------------------------------

/// A named relationship metric tracked by the external relationship store.
///
/// Each metric is conventionally 0–100, with 50 as the neutral midpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum RelationshipMetric {
    /// General fondness.
    Affinity,
    /// Confidence in the other's reliability.
    Trust,
    /// Romantic or magnetic pull.
    Chemistry,
    /// Accumulated friction.
    Tension,
}

// ---------------------------------------------------------------------------
// Simulation tiers
// ---------------------------------------------------------------------------

/// Scheduling priority bucket controlling how often an NPC is re-evaluated.
///
/// Tier assignment (by proximity/relevance to the player) is the host's
/// responsibility; the engine only consumes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum SimulationTier {
    /// Near the player or otherwise relevant; evaluated synchronously at a
    /// short interval.
    Active,
    /// Everyone else; evaluated concurrently at a longer interval.
    Background,
}
