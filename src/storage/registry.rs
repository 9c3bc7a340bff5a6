use crate::core::{Entity, EntityId, EntityKind, EntityRef, Result};
use crate::host::Host;

use super::MirrorCollection;

/// One [`MirrorCollection`] per kind, for the whole life of a session.
///
/// Routing by kind tag happens here and nowhere else.
pub struct Registry {
    /// Indexed by `EntityKind as usize`, same order as `EntityKind::ALL`
    collections: Vec<MirrorCollection>,
}

impl Registry {
    pub fn new(host: Host, no_confirm: bool) -> Self {
        let collections = EntityKind::ALL
            .iter()
            .map(|&kind| MirrorCollection::new(kind, host.clone(), no_confirm))
            .collect();
        Self { collections }
    }

    pub fn collection(&self, kind: EntityKind) -> &MirrorCollection {
        &self.collections[kind as usize]
    }

    pub fn collection_mut(&mut self, kind: EntityKind) -> &mut MirrorCollection {
        &mut self.collections[kind as usize]
    }

    pub fn collections(&self) -> impl Iterator<Item = &MirrorCollection> {
        self.collections.iter()
    }

    pub fn add(&mut self, entity: EntityRef) -> bool {
        self.collection_mut(entity.kind()).add(entity)
    }

    /// Removes the entity from its collection and deletes it on the host.
    pub fn remove(&mut self, entity: &Entity) -> Result<bool> {
        self.collection_mut(entity.kind()).remove(entity)
    }

    pub fn contains(&self, entity: &Entity) -> bool {
        self.collection(entity.kind()).contains(entity)
    }

    /// Drops the entity from its collection without a host delete.
    pub fn detach(&mut self, entity: &Entity) -> Option<EntityRef> {
        self.collection_mut(entity.kind()).detach(entity.id())
    }

    pub fn find(&self, kind: EntityKind, id: EntityId) -> Option<&EntityRef> {
        self.collection(kind).by_id(id)
    }

    pub fn by_name(&self, kind: EntityKind, name: &str) -> Option<&EntityRef> {
        self.collection(kind).by_name(name)
    }

    /// Number of mirrored entities across every kind.
    pub fn total_len(&self) -> usize {
        self.collections.iter().map(MirrorCollection::len).sum()
    }

    /// Forgets every entity locally. The host is not touched.
    pub(crate) fn reset(&mut self) {
        for collection in &mut self.collections {
            collection.replace_all(Vec::new());
        }
    }
}
