use log::{debug, info, warn};
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use super::Synchronizer;
use crate::core::{EntityId, EntityKind, EntityRecord, EntityRef, Result};
use crate::storage::Registry;

/// An entity the host renamed behind the mirror's back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Renamed {
    pub id: EntityId,
    pub from: String,
    pub to: String,
}

/// What one kind's reconciliation changed.
#[derive(Debug, Clone)]
pub struct KindChanges {
    pub kind: EntityKind,
    pub added: Vec<EntityRef>,
    pub renamed: Vec<Renamed>,
    /// Entities the host no longer has; dropped locally, never host-deleted.
    pub removed: Vec<EntityRef>,
    /// Host rows left out of the mirror: unclassifiable sub-type, or an id
    /// already taken by another row.
    pub skipped: Vec<EntityRecord>,
}

impl KindChanges {
    fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            added: Vec::new(),
            renamed: Vec::new(),
            removed: Vec::new(),
            skipped: Vec::new(),
        }
    }

    /// Whether the mirror changed. Skipped rows do not count.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.renamed.is_empty() && self.removed.is_empty()
    }
}

/// Result of a Refresh over one or more kinds.
#[derive(Debug, Clone, Default)]
pub struct RefreshReport {
    pub kinds: Vec<KindChanges>,
}

impl RefreshReport {
    pub fn is_empty(&self) -> bool {
        self.kinds.iter().all(KindChanges::is_empty)
    }

    pub fn changes(&self, kind: EntityKind) -> Option<&KindChanges> {
        self.kinds.iter().find(|changes| changes.kind == kind)
    }

    pub fn added(&self) -> impl Iterator<Item = &EntityRef> {
        self.kinds.iter().flat_map(|changes| changes.added.iter())
    }

    pub fn removed(&self) -> impl Iterator<Item = &EntityRef> {
        self.kinds.iter().flat_map(|changes| changes.removed.iter())
    }

    pub fn skipped(&self) -> impl Iterator<Item = &EntityRecord> {
        self.kinds.iter().flat_map(|changes| changes.skipped.iter())
    }
}

/// One listing row and the entity it resolved to.
struct Slot {
    record: EntityRecord,
    entity: Option<EntityRef>,
    /// The match rests on an id (listed or queried), not on the name alone.
    confirmed: bool,
    fresh: bool,
}

impl Slot {
    fn new(record: EntityRecord) -> Self {
        Self {
            record,
            entity: None,
            confirmed: false,
            fresh: false,
        }
    }
}

impl Synchronizer<'_> {
    /// Reconciles the listed kinds with the host, one kind at a time.
    ///
    /// Entities that still exist keep their `Arc`; each collection ends up in
    /// host order.
    pub fn refresh(&self, registry: &mut Registry, kinds: &[EntityKind]) -> Result<RefreshReport> {
        let mut listing = self.listing();
        let mut report = RefreshReport::default();

        for &kind in kinds {
            let records = listing.records(kind)?;
            let changes = self.reconcile(registry, kind, records)?;
            if !changes.is_empty() {
                info!(
                    "refreshed {}: {} added, {} renamed, {} removed",
                    kind,
                    changes.added.len(),
                    changes.renamed.len(),
                    changes.removed.len()
                );
            }
            report.kinds.push(changes);
        }
        Ok(report)
    }

    /// Matches listing rows to the entities mirrored before.
    ///
    /// Listed ids are binding. A name-only row first claims the entity with
    /// that name; rows left over get their id from the host. When that id
    /// belongs to an entity a name claimed for another row, the id wins and
    /// the other row is resolved again by its own id, so chained renames
    /// (`A -> C` then `B -> A`) land on the right entities.
    fn reconcile(
        &self,
        registry: &mut Registry,
        kind: EntityKind,
        records: Vec<EntityRecord>,
    ) -> Result<KindChanges> {
        let before: Vec<EntityRef> = registry.collection(kind).iter().cloned().collect();
        let mut slots: Vec<Slot> = records.into_iter().map(Slot::new).collect();
        let mut claims: HashMap<EntityId, usize> = HashMap::with_capacity(slots.len());
        let mut pending = VecDeque::new();
        let mut changes = KindChanges::new(kind);

        for (index, slot) in slots.iter_mut().enumerate() {
            let existing = match slot.record.id {
                Some(id) => unclaimed(&before, &claims, |e| e.id() == id),
                None => unclaimed(&before, &claims, |e| e.has_name(&slot.record.name)),
            };
            match existing {
                Some(entity) => {
                    claims.insert(entity.id(), index);
                    slot.confirmed = slot.record.id.is_some();
                    slot.entity = Some(entity);
                }
                None => pending.push_back(index),
            }
        }

        while let Some(index) = pending.pop_front() {
            let id = match slots[index].record.id {
                Some(id) => id,
                None => {
                    let id = self.factory.lookup_id(kind, &slots[index].record.name)?;
                    slots[index].record.id = Some(id);
                    id
                }
            };
            slots[index].confirmed = true;

            match claims.get(&id).copied() {
                Some(owner) if slots[owner].confirmed => {
                    warn!(
                        "{} '{}' repeats id {} of '{}', skipping",
                        kind, slots[index].record.name, id, slots[owner].record.name
                    );
                    changes.skipped.push(slots[index].record.clone());
                }
                Some(owner) => {
                    debug!(
                        "{} id {} belongs to '{}', not '{}'",
                        kind, id, slots[index].record.name, slots[owner].record.name
                    );
                    slots[index].entity = slots[owner].entity.take();
                    claims.insert(id, index);
                    pending.push_back(owner);
                }
                None => {
                    if let Some(entity) = before.iter().find(|e| e.id() == id).cloned() {
                        slots[index].entity = Some(entity);
                        claims.insert(id, index);
                    } else if let Some(entity) = self.build_listed(&slots[index].record)? {
                        slots[index].entity = Some(entity);
                        slots[index].fresh = true;
                        claims.insert(id, index);
                    } else {
                        changes.skipped.push(slots[index].record.clone());
                    }
                }
            }
        }

        let mut reconciled = Vec::with_capacity(slots.len());
        for slot in slots {
            let Some(entity) = slot.entity else {
                continue;
            };
            if slot.fresh {
                changes.added.push(Arc::clone(&entity));
            } else {
                let current = entity.name();
                if current != slot.record.name {
                    debug!("{} {} renamed '{}' -> '{}'", kind, entity.id(), current, slot.record.name);
                    entity.set_name(&slot.record.name);
                    changes.renamed.push(Renamed {
                        id: entity.id(),
                        from: current,
                        to: slot.record.name,
                    });
                }
            }
            reconciled.push(entity);
        }

        changes.removed = before
            .into_iter()
            .filter(|entity| !claims.contains_key(&entity.id()))
            .collect();

        registry.collection_mut(kind).replace_all(reconciled);
        Ok(changes)
    }
}

fn unclaimed<F>(before: &[EntityRef], claims: &HashMap<EntityId, usize>, matches: F) -> Option<EntityRef>
where
    F: Fn(&EntityRef) -> bool,
{
    before
        .iter()
        .find(|entity| !claims.contains_key(&entity.id()) && matches(entity))
        .cloned()
}
