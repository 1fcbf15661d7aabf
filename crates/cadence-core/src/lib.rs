//! Routine resolution engine for Cadence.
//!
//! This crate owns the per-tick decision pipeline that determines what
//! every NPC is doing, for how long, and with what consequences -- driven
//! entirely by the declarative configuration defined in `cadence-types`.
//!
//! # Modules
//!
//! - [`clock`] -- World time snapshot and time-of-day derivation.
//! - [`config`] -- Engine configuration loaded from `cadence-config.yaml`.
//! - [`stores`] -- External store seams (relationships, mood, generation)
//!   plus in-memory reference implementations.
//! - [`condition`] -- The condition evaluator and its extension registry.
//! - [`catalog`] -- The read-only activity catalog.
//! - [`world`] -- World content: raw documents and the published set.
//! - [`validate`] -- Publish-time validation of world content.
//! - [`graph`] -- Routine graph traversal.
//! - [`preferences`] -- The layered preference merge.
//! - [`scoring`] -- Eight-factor candidate scoring.
//! - [`resolver`] -- The per-NPC activity resolution pipeline.
//! - [`effects`] -- Effect application and store write-through.
//! - [`scheduler`] -- The tick scheduler: tiers, concurrency, isolation.

pub mod catalog;
pub mod clock;
pub mod condition;
pub mod config;
pub mod effects;
pub mod graph;
pub mod preferences;
pub mod resolver;
pub mod scheduler;
pub mod scoring;
pub mod stores;
pub mod validate;
pub mod world;

pub use catalog::{ActivityCatalog, CatalogError};
pub use clock::{ClockError, WorldClock};
pub use condition::{ConditionContext, ConditionEvaluator, CustomCondition};
pub use config::{ConfigError, EngineConfig, ResolveConfig, ScoringConfig, TiersConfig, WorldTuning};
pub use graph::{ActiveNode, TraversalError, find_active_node};
pub use preferences::resolve_preferences;
pub use resolver::{Decision, ResolveContext, choose_activity};
pub use scheduler::{NpcHandle, TickControl, TickError, TickScheduler, TickSummary};
pub use scoring::{ScoreBreakdown, ScoreContext, score_candidate};
pub use stores::{
    CollectingGenerationSink, GenerationSink, InMemoryMoodStore, InMemoryRelationshipStore,
    MoodStore, NullGenerationSink, RelationshipStore, StoreError,
};
pub use validate::{ValidationError, publish};
pub use world::{WorldConfigSet, WorldDocument};
