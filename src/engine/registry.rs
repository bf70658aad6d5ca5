//! Entity Registry - Live entities of one render root.
//!
//! Manages the lifecycle of entity records:
//! - id → entity lookup
//! - parent links for walking up from a child
//! - recursive release of an entity and everything it rendered

use std::collections::HashMap;

use tracing::trace;

use super::entity::Entity;
use crate::error::{ReconcileError, Result};
use crate::types::EntityId;

#[derive(Debug, Default)]
pub struct EntityRegistry {
    entities: HashMap<EntityId, Entity>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, entity: Entity) {
        trace!(entity = %entity.id, kind = entity.component_type.name(), "entity registered");
        self.entities.insert(entity.id, entity);
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    pub fn get(&self, id: EntityId) -> Result<&Entity> {
        self.entities.get(&id).ok_or(ReconcileError::EntityNotFound(id))
    }

    pub fn get_mut(&mut self, id: EntityId) -> Result<&mut Entity> {
        self.entities
            .get_mut(&id)
            .ok_or(ReconcileError::EntityNotFound(id))
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.entities.values_mut()
    }

    /// Child entity ids of `id`, in path order.
    pub fn child_ids(&self, id: EntityId) -> Vec<EntityId> {
        self.entities
            .get(&id)
            .map(|entity| entity.children.values().copied().collect())
            .unwrap_or_default()
    }

    /// Remove an entity record.
    ///
    /// Also recursively releases all children still registered! Returns the
    /// removed records, the entity itself first.
    pub fn release(&mut self, id: EntityId) -> Vec<Entity> {
        let Some(entity) = self.entities.remove(&id) else {
            return Vec::new();
        };
        let children: Vec<EntityId> = entity.children.values().copied().collect();
        if let Some(parent) = entity.parent.and_then(|p| self.entities.get_mut(&p)) {
            parent.children.retain(|_, child| *child != id);
        }
        let mut released = vec![entity];
        for child in children {
            released.extend(self.release(child));
        }
        trace!(entity = %id, count = released.len(), "entities released");
        released
    }
}
