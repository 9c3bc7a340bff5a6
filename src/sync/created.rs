use log::{debug, info};
use std::sync::Arc;

use super::Synchronizer;
use crate::core::{EntityKind, EntityRef, MirrorError, Result};
use crate::storage::Registry;

/// Entities discovered after one host operation, in discovery order.
#[derive(Debug, Clone, Default)]
pub struct CreatedItems {
    items: Vec<EntityRef>,
}

impl CreatedItems {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EntityRef> {
        self.items.iter()
    }

    pub fn of_kind(&self, kind: EntityKind) -> impl Iterator<Item = &EntityRef> {
        self.items.iter().filter(move |entity| entity.kind() == kind)
    }

    pub fn names(&self) -> Vec<String> {
        self.items.iter().map(|entity| entity.name()).collect()
    }

    pub fn into_vec(self) -> Vec<EntityRef> {
        self.items
    }
}

impl IntoIterator for CreatedItems {
    type Item = EntityRef;
    type IntoIter = std::vec::IntoIter<EntityRef>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl Synchronizer<'_> {
    /// Mirrors every entity the host lists for `kinds` that the mirror does
    /// not know by name yet.
    ///
    /// Only the given kinds are checked; the caller knows which operation it
    /// issued and therefore which kinds it can have produced.
    pub fn resolve_created(&self, registry: &mut Registry, kinds: &[EntityKind]) -> Result<CreatedItems> {
        let mut listing = self.listing();
        let mut created = CreatedItems::default();
        let mut visited = Vec::with_capacity(kinds.len());

        for &kind in kinds {
            if visited.contains(&kind) {
                continue;
            }
            visited.push(kind);

            let fresh: Vec<_> = listing
                .records(kind)?
                .into_iter()
                .filter(|record| registry.by_name(kind, &record.name).is_none())
                .collect();

            for record in fresh {
                let entity = self.factory.build(record)?;
                if registry.add(Arc::clone(&entity)) {
                    debug!("created {} '{}'", kind, entity.name());
                    created.items.push(entity);
                }
            }
        }

        if !created.is_empty() {
            info!("resolved {} created entities", created.len());
        }
        Ok(created)
    }

    /// Resolves the single entity of `kind` an operation was expected to
    /// create.
    ///
    /// With no new entity nothing is added and `CreationNotFound` is
    /// returned. With several, all of them are mirrored (they are real host
    /// entities) and `AmbiguousCreationResult` names them.
    pub fn resolve_single_created(&self, registry: &mut Registry, kind: EntityKind) -> Result<EntityRef> {
        let created = self.resolve_created(registry, &[kind])?;
        match created.len() {
            0 => Err(MirrorError::CreationNotFound { kind }),
            1 => Ok(created.into_vec().remove(0)),
            _ => Err(MirrorError::AmbiguousCreationResult {
                kind,
                names: created.names(),
            }),
        }
    }
}
