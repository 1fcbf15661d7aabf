//! External store seams: relationships, mood, and generation requests.
//!
//! The engine never owns relationship or mood values -- it reads and
//! writes them through these traits, which the host backs with whatever
//! storage it likes. All writes are last-writer-wins per key; no
//! cross-NPC transactions exist, so hosts may service concurrent keyed
//! writes freely.
//!
//! In-memory reference implementations ship here for tests and the demo
//! binary. They clamp metrics the same way a production store is
//! expected to.

use std::collections::BTreeMap;
use std::sync::{Mutex, RwLock};

use rust_decimal::Decimal;

use cadence_types::{
    GenerationRequest, MoodImpact, MoodState, NpcId, RelationshipDeltas, RelationshipMetric,
};

/// Errors surfaced by external stores.
///
/// Store failures are never fatal to the engine: relationship writes are
/// buffered and retried at the failing NPC's next evaluation, and mood
/// writes fall back to the session-cached snapshot.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store could not service the request.
    #[error("store unavailable: {reason}")]
    Unavailable {
        /// Description of the failure.
        reason: String,
    },
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Read/write access to directed relationship metrics between NPCs.
///
/// Metrics are conventionally 0–100 with 50 neutral. `metric` must be
/// total: unknown pairs return the neutral default rather than erroring.
pub trait RelationshipStore: Send + Sync {
    /// Current value of one metric from `npc` toward `target`.
    fn metric(&self, npc: NpcId, target: NpcId, metric: RelationshipMetric) -> Decimal;

    /// Apply signed deltas to all four metrics from `npc` toward `target`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backing store rejects the write; the
    /// caller buffers and retries.
    fn apply_delta(
        &self,
        npc: NpcId,
        target: NpcId,
        deltas: &RelationshipDeltas,
    ) -> Result<(), StoreError>;
}

/// Read/write access to NPC mood state.
pub trait MoodStore: Send + Sync {
    /// Current mood of `npc` (default mood for unknown NPCs).
    fn mood(&self, npc: NpcId) -> MoodState;

    /// Apply a mood impact to `npc`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backing store rejects the write.
    fn apply_impact(&self, npc: NpcId, impact: &MoodImpact) -> Result<(), StoreError>;
}

/// Fire-and-forget sink for generation requests.
///
/// `submit` must not block on I/O: implementations enqueue and return.
pub trait GenerationSink: Send + Sync {
    /// Hand a request to the content pipeline.
    fn submit(&self, request: GenerationRequest);
}

// ---------------------------------------------------------------------------
// In-memory reference implementations
// ---------------------------------------------------------------------------

/// Relationship metric bounds.
const METRIC_MIN: Decimal = Decimal::ZERO;
/// Relationship metric upper bound.
const METRIC_MAX: Decimal = Decimal::ONE_HUNDRED;
/// Neutral default for unknown pairs.
const METRIC_NEUTRAL: Decimal = Decimal::from_parts(50, 0, 0, false, 0);

/// The four metrics for one directed (npc, target) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct MetricRecord {
    affinity: Decimal,
    trust: Decimal,
    chemistry: Decimal,
    tension: Decimal,
}

impl Default for MetricRecord {
    fn default() -> Self {
        Self {
            affinity: METRIC_NEUTRAL,
            trust: METRIC_NEUTRAL,
            chemistry: METRIC_NEUTRAL,
            tension: METRIC_NEUTRAL,
        }
    }
}

/// In-memory relationship store for tests and the demo binary.
///
/// Values are clamped to `[0, 100]` on every write.
#[derive(Debug, Default)]
pub struct InMemoryRelationshipStore {
    records: RwLock<BTreeMap<(NpcId, NpcId), MetricRecord>>,
}

impl InMemoryRelationshipStore {
    /// Create an empty store (all pairs neutral).
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed one directed pair with explicit metric values (clamped).
    pub fn seed(
        &self,
        npc: NpcId,
        target: NpcId,
        affinity: Decimal,
        trust: Decimal,
        chemistry: Decimal,
        tension: Decimal,
    ) {
        let mut records = self.records.write().unwrap_or_else(std::sync::PoisonError::into_inner);
        records.insert(
            (npc, target),
            MetricRecord {
                affinity: affinity.clamp(METRIC_MIN, METRIC_MAX),
                trust: trust.clamp(METRIC_MIN, METRIC_MAX),
                chemistry: chemistry.clamp(METRIC_MIN, METRIC_MAX),
                tension: tension.clamp(METRIC_MIN, METRIC_MAX),
            },
        );
    }
}

impl RelationshipStore for InMemoryRelationshipStore {
    fn metric(&self, npc: NpcId, target: NpcId, metric: RelationshipMetric) -> Decimal {
        let records = self.records.read().unwrap_or_else(std::sync::PoisonError::into_inner);
        let record = records.get(&(npc, target)).copied().unwrap_or_default();
        match metric {
            RelationshipMetric::Affinity => record.affinity,
            RelationshipMetric::Trust => record.trust,
            RelationshipMetric::Chemistry => record.chemistry,
            RelationshipMetric::Tension => record.tension,
        }
    }

    fn apply_delta(
        &self,
        npc: NpcId,
        target: NpcId,
        deltas: &RelationshipDeltas,
    ) -> Result<(), StoreError> {
        let mut records = self.records.write().unwrap_or_else(std::sync::PoisonError::into_inner);
        let record = records.entry((npc, target)).or_default();
        record.affinity = record
            .affinity
            .saturating_add(deltas.affinity)
            .clamp(METRIC_MIN, METRIC_MAX);
        record.trust = record
            .trust
            .saturating_add(deltas.trust)
            .clamp(METRIC_MIN, METRIC_MAX);
        record.chemistry = record
            .chemistry
            .saturating_add(deltas.chemistry)
            .clamp(METRIC_MIN, METRIC_MAX);
        record.tension = record
            .tension
            .saturating_add(deltas.tension)
            .clamp(METRIC_MIN, METRIC_MAX);
        Ok(())
    }
}

/// In-memory mood store for tests and the demo binary.
#[derive(Debug, Default)]
pub struct InMemoryMoodStore {
    moods: RwLock<BTreeMap<NpcId, MoodState>>,
}

/// Mood axis bounds.
const AXIS_MIN: Decimal = Decimal::NEGATIVE_ONE;
/// Mood axis upper bound.
const AXIS_MAX: Decimal = Decimal::ONE;

impl InMemoryMoodStore {
    /// Create an empty store (all NPCs at neutral mood).
    pub fn new() -> Self {
        Self::default()
    }
}

impl MoodStore for InMemoryMoodStore {
    fn mood(&self, npc: NpcId) -> MoodState {
        let moods = self.moods.read().unwrap_or_else(std::sync::PoisonError::into_inner);
        moods.get(&npc).cloned().unwrap_or_default()
    }

    fn apply_impact(&self, npc: NpcId, impact: &MoodImpact) -> Result<(), StoreError> {
        let mut moods = self.moods.write().unwrap_or_else(std::sync::PoisonError::into_inner);
        let mood = moods.entry(npc).or_default();
        mood.valence = mood
            .valence
            .saturating_add(impact.valence)
            .clamp(AXIS_MIN, AXIS_MAX);
        mood.arousal = mood
            .arousal
            .saturating_add(impact.arousal)
            .clamp(AXIS_MIN, AXIS_MAX);
        for tag in &impact.add_tags {
            mood.tags.insert(*tag);
        }
        for tag in &impact.remove_tags {
            mood.tags.remove(tag);
        }
        Ok(())
    }
}

/// A generation sink that collects requests for inspection.
///
/// Used by tests and the demo binary; production hosts forward to a
/// queue instead.
#[derive(Debug, Default)]
pub struct CollectingGenerationSink {
    requests: Mutex<Vec<GenerationRequest>>,
}

impl CollectingGenerationSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain all requests collected so far.
    pub fn drain(&self) -> Vec<GenerationRequest> {
        let mut requests = self
            .requests
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        std::mem::take(&mut *requests)
    }
}

impl GenerationSink for CollectingGenerationSink {
    fn submit(&self, request: GenerationRequest) {
        let mut requests = self
            .requests
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        requests.push(request);
    }
}

/// A generation sink that drops every request.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullGenerationSink;

impl GenerationSink for NullGenerationSink {
    fn submit(&self, _request: GenerationRequest) {}
}
