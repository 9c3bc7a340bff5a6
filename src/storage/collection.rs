use log::{debug, warn};
use std::collections::HashMap;
use std::sync::Arc;

use crate::core::{Entity, EntityId, EntityKind, EntityRef, MirrorError, Result};
use crate::host::{command, Host};

/// Ordered, duplicate-free mirror of every host entity of one kind.
///
/// Entities are keyed by id; name lookup is a linear, case-insensitive scan
/// because names change under renames.
pub struct MirrorCollection {
    kind: EntityKind,
    items: Vec<EntityRef>,
    /// id -> position in `items`, rebuilt on every structural change
    positions: HashMap<EntityId, usize>,
    host: Host,
    no_confirm: bool,
}

impl MirrorCollection {
    pub(crate) fn new(kind: EntityKind, host: Host, no_confirm: bool) -> Self {
        Self {
            kind,
            items: Vec::new(),
            positions: HashMap::new(),
            host,
            no_confirm,
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EntityRef> {
        self.items.iter()
    }

    pub fn get(&self, index: usize) -> Option<&EntityRef> {
        self.items.get(index)
    }

    /// Checked indexed access.
    pub fn at(&self, index: usize) -> Result<&EntityRef> {
        self.items.get(index).ok_or(MirrorError::IndexOutOfRange {
            index,
            len: self.items.len(),
        })
    }

    pub fn by_id(&self, id: EntityId) -> Option<&EntityRef> {
        self.positions.get(&id).map(|&pos| &self.items[pos])
    }

    pub fn by_name(&self, name: &str) -> Option<&EntityRef> {
        self.items.iter().find(|entity| entity.has_name(name))
    }

    pub fn contains(&self, entity: &Entity) -> bool {
        entity.kind() == self.kind && self.positions.contains_key(&entity.id())
    }

    pub fn names(&self) -> Vec<String> {
        self.items.iter().map(|entity| entity.name()).collect()
    }

    /// Appends `entity` unless an entity with its id is already present.
    ///
    /// Returns whether it was inserted; the already-present handle is kept.
    pub fn add(&mut self, entity: EntityRef) -> bool {
        if entity.kind() != self.kind {
            warn!(
                "refusing to add {} '{}' to the {} collection",
                entity.kind(),
                entity.name(),
                self.kind
            );
            return false;
        }
        if self.positions.contains_key(&entity.id()) {
            return false;
        }
        self.positions.insert(entity.id(), self.items.len());
        self.items.push(entity);
        true
    }

    /// Deletes `entity` on the host and drops it from the collection.
    ///
    /// Returns `false` without sending anything when the entity is not part
    /// of this collection.
    pub fn remove(&mut self, entity: &Entity) -> Result<bool> {
        self.remove_with(entity, self.no_confirm)
    }

    /// Like [`remove`](Self::remove), choosing whether the host may prompt
    /// for confirmation.
    pub fn remove_with(&mut self, entity: &Entity, no_confirm: bool) -> Result<bool> {
        if !self.contains(entity) {
            return Ok(false);
        }
        let index = self.positions[&entity.id()];
        self.delete_at(index, no_confirm)?;
        Ok(true)
    }

    pub fn remove_at(&mut self, index: usize) -> Result<EntityRef> {
        if index >= self.items.len() {
            return Err(MirrorError::IndexOutOfRange {
                index,
                len: self.items.len(),
            });
        }
        self.delete_at(index, self.no_confirm)
    }

    /// Deletes every entity, front to back. Stops at the first host failure,
    /// leaving the remaining entities in place.
    pub fn clear(&mut self) -> Result<()> {
        while !self.items.is_empty() {
            self.delete_at(0, self.no_confirm)?;
        }
        Ok(())
    }

    /// The entity the host currently reports as active for this kind.
    pub fn active_item(&self) -> Result<Option<EntityRef>> {
        if self.items.is_empty() {
            return Ok(None);
        }
        let active = self
            .host
            .query_optional_name(&command::active_name(self.kind))?;
        Ok(active.and_then(|name| self.by_name(&name).cloned()))
    }

    /// Makes `entity` the host's active item of this kind.
    ///
    /// Returns `false` without sending anything when the entity is not part
    /// of this collection.
    pub fn activate(&self, entity: &Entity) -> Result<bool> {
        if !self.contains(entity) {
            return Ok(false);
        }
        entity.activate()?;
        Ok(true)
    }

    pub fn deactivate(&self) -> Result<()> {
        self.host.execute(&[command::deactivate(self.kind)])
    }

    /// Name the host would give the next entity of this kind. Nothing is
    /// created.
    pub fn predict_next_name(&self, prefix: Option<&str>) -> Result<String> {
        let query = command::next_name(self.kind, prefix);
        self.host
            .query_optional_name(&query)?
            .ok_or(MirrorError::MalformedResponse {
                command: query,
                detail: "host proposed an empty name".into(),
            })
    }

    /// Replaces the contents without talking to the host.
    pub(crate) fn replace_all(&mut self, items: Vec<EntityRef>) {
        self.items = items;
        self.reindex();
    }

    /// Drops an entity locally without a host delete. Used when the host
    /// already lost it.
    pub(crate) fn detach(&mut self, id: EntityId) -> Option<EntityRef> {
        let index = self.positions.get(&id).copied()?;
        let entity = self.items.remove(index);
        self.reindex();
        Some(entity)
    }

    fn delete_at(&mut self, index: usize, no_confirm: bool) -> Result<EntityRef> {
        let entity = Arc::clone(&self.items[index]);
        self.host
            .execute(&[command::delete(self.kind, &entity.name(), no_confirm)])?;
        self.items.remove(index);
        self.reindex();
        debug!("removed {} '{}'", self.kind, entity.name());
        Ok(entity)
    }

    fn reindex(&mut self) {
        self.positions = self
            .items
            .iter()
            .enumerate()
            .map(|(pos, entity)| (entity.id(), pos))
            .collect();
    }
}
