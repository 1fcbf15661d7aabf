//! The read-only activity catalog.
//!
//! Built once per world-configuration load and never mutated afterward.
//! Lookup misses at runtime are not errors: a routine graph referencing
//! a missing activity is caught at publish time by validation, and if a
//! stale reference survives a hot reload the resolver simply treats the
//! candidate as infeasible.

use std::collections::BTreeMap;

use cadence_types::{Activity, ActivityId};

/// Errors that can occur building a catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Two activities share an id.
    #[error("duplicate activity id: {id}")]
    DuplicateId {
        /// The offending id.
        id: ActivityId,
    },
}

/// Read-only registry of activity definitions, keyed by id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivityCatalog {
    activities: BTreeMap<ActivityId, Activity>,
}

impl ActivityCatalog {
    /// Build a catalog from a list of activity definitions.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::DuplicateId`] if two definitions share an
    /// id -- silently keeping one of them would make behavior depend on
    /// file order.
    pub fn from_activities(activities: Vec<Activity>) -> Result<Self, CatalogError> {
        let mut map = BTreeMap::new();
        for activity in activities {
            let id = activity.id.clone();
            if map.insert(id.clone(), activity).is_some() {
                return Err(CatalogError::DuplicateId { id });
            }
        }
        Ok(Self { activities: map })
    }

    /// Look up an activity by id.
    pub fn get(&self, id: &ActivityId) -> Option<&Activity> {
        self.activities.get(id)
    }

    /// Whether the catalog contains `id`.
    pub fn contains(&self, id: &ActivityId) -> bool {
        self.activities.contains_key(id)
    }

    /// Number of activities in the catalog.
    pub fn len(&self) -> usize {
        self.activities.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.activities.is_empty()
    }

    /// Iterate all activities in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Activity> {
        self.activities.values()
    }
}
