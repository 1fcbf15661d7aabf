//! World content: the published configuration set the engine runs on.
//!
//! A [`WorldDocument`] is the raw, serde-friendly payload a host's
//! configuration store supplies (and the demo binary loads from YAML).
//! Publishing it through [`crate::validate::publish`] produces a
//! [`WorldConfigSet`]: validated, indexed, and read-only. Hot reload is a
//! swap of the whole set between ticks -- the engine only ever borrows it
//! for the duration of one tick.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use cadence_types::{Activity, NpcId, PreferenceLayer, RoutineGraph, RoutineId};

use crate::catalog::ActivityCatalog;

/// Raw world content as authored: activities, routine graphs, per-NPC
/// preference defaults, and role bindings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldDocument {
    /// Activity definitions.
    #[serde(default)]
    pub activities: Vec<Activity>,

    /// Routine graphs.
    #[serde(default)]
    pub routines: Vec<RoutineGraph>,

    /// Static per-NPC preference defaults (the middle merge layer).
    #[serde(default)]
    pub npc_preferences: BTreeMap<NpcId, PreferenceLayer>,

    /// Per-NPC role bindings: role string -> bound NPC.
    #[serde(default)]
    pub role_bindings: BTreeMap<NpcId, BTreeMap<String, NpcId>>,
}

/// Validated, indexed world content.
///
/// Constructed only by [`crate::validate::publish`]; all internal
/// references are known to resolve (modulo later hot reloads, which the
/// resolver tolerates by treating dangling candidates as infeasible).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorldConfigSet {
    /// The activity catalog.
    pub catalog: ActivityCatalog,
    /// Routine graphs keyed by id.
    pub routines: BTreeMap<RoutineId, RoutineGraph>,
    /// Static per-NPC preference defaults.
    pub npc_preferences: BTreeMap<NpcId, PreferenceLayer>,
    /// Per-NPC role bindings.
    pub role_bindings: BTreeMap<NpcId, BTreeMap<String, NpcId>>,
}

impl WorldConfigSet {
    /// Look up a routine graph by id.
    pub fn routine(&self, id: &RoutineId) -> Option<&RoutineGraph> {
        self.routines.get(id)
    }

    /// The static preference layer for an NPC (empty if none authored).
    pub fn npc_preference_layer(&self, npc: NpcId) -> PreferenceLayer {
        self.npc_preferences.get(&npc).cloned().unwrap_or_default()
    }
}
