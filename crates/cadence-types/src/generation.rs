//! The fire-and-forget generation request record.
//!
//! When a selected activity carries a scene intent, the tick scheduler
//! emits one of these records to the host's content pipeline. The engine
//! never waits for, or interprets, a response -- generation latency must
//! not touch the tick loop.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::{ActivityId, NpcId, SessionId};

/// A request for the content pipeline to render a chosen activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GenerationRequest {
    /// The NPC the scene is about.
    pub npc_id: NpcId,
    /// The session the scene belongs to.
    pub session_id: SessionId,
    /// The activity that was selected.
    pub activity_id: ActivityId,
    /// Designer-authored scene intent from the activity definition.
    pub scene_intent: String,
    /// Action-block references from the activity definition.
    pub action_blocks: Vec<String>,
    /// Free-form context for the pipeline (world time, location, mood).
    pub context: BTreeMap<String, serde_json::Value>,
    /// Wall-clock time the request was emitted.
    pub requested_at: DateTime<Utc>,
}
