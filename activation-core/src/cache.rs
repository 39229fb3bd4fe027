//! Process-local mirror of the remote collection.
//!
//! The cache is never authoritative. It is rebuilt from a full listing and
//! patched only after the store confirms a write. It performs no I/O.

use std::collections::BTreeMap;

use crate::error::{ActivationError, Result};
use crate::types::{CollectionStatus, Entity, EntityId};

#[derive(Debug, Default, Clone)]
pub struct EntityCache {
    entities: BTreeMap<EntityId, Entity>,
}

impl EntityCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole view with a fresh listing.
    pub fn load(&mut self, entities: impl IntoIterator<Item = Entity>) {
        self.entities = entities
            .into_iter()
            .map(|entity| (entity.id.clone(), entity))
            .collect();
    }

    pub fn get(&self, id: &EntityId) -> Result<&Entity> {
        self.entities
            .get(id)
            .ok_or_else(|| ActivationError::EntityNotFound(id.clone()))
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.entities.contains_key(id)
    }

    /// Entities currently believed active, in id order.
    pub fn active_entities(&self) -> Vec<&Entity> {
        self.entities.values().filter(|e| e.active).collect()
    }

    /// Record a confirmed remote write. Returns whether the cached flag changed.
    ///
    /// Unknown ids are ignored; the entity may have been dropped by a reload
    /// while the call was in flight.
    pub fn apply_active(&mut self, id: &EntityId, active: bool) -> bool {
        match self.entities.get_mut(id) {
            Some(entity) if entity.active != active => {
                entity.active = active;
                true
            }
            _ => false,
        }
    }

    pub fn status(&self) -> CollectionStatus {
        let active_ids: Vec<EntityId> = self
            .active_entities()
            .into_iter()
            .map(|e| e.id.clone())
            .collect();
        let total = self.entities.len();

        CollectionStatus {
            total,
            active: active_ids.len(),
            inactive: total - active_ids.len(),
            active_ids,
        }
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
