use log::{info, warn};

use super::Synchronizer;
use crate::core::{EntityKind, Result};
use crate::storage::Registry;

impl Synchronizer<'_> {
    /// Rebuilds the listed kinds from scratch, in host order.
    ///
    /// Whatever the collections held before is dropped locally; nothing is
    /// deleted on the host. Rows whose sub-type cannot be classified are
    /// skipped. Returns the number of entities mirrored.
    pub fn initialise(&self, registry: &mut Registry, kinds: &[EntityKind]) -> Result<usize> {
        let mut listing = self.listing();
        let mut total = 0;

        for &kind in kinds {
            let records = listing.records(kind)?;
            let collection = registry.collection_mut(kind);
            collection.replace_all(Vec::new());

            let listed = records.len();
            for record in &records {
                if let Some(entity) = self.build_listed(record)? {
                    collection.add(entity);
                }
            }
            if collection.len() < listed {
                warn!("{} of {} {} entities not mirrored", listed - collection.len(), listed, kind);
            }
            info!("initialised {} {} entities", collection.len(), kind);
            total += collection.len();
        }
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use crate::core::{EntityDetail, EntityKind, ToolType};
    use crate::host::{Host, InMemoryHost};
    use crate::storage::{EntityFactory, Registry};
    use crate::sync::{ListingStrategy, Synchronizer};

    fn populated() -> InMemoryHost {
        let memory = InMemoryHost::new();
        memory.insert(EntityKind::Tool, "T1", Some("end_mill"));
        memory.insert(EntityKind::Tool, "T2", Some("ball_nosed"));
        memory.insert(EntityKind::Boundary, "B1", Some("block"));
        memory.insert(EntityKind::Workplane, "Top", None);
        memory
    }

    fn initialise(memory: &InMemoryHost, strategy: ListingStrategy) -> Registry {
        let host = Host::new(memory.clone());
        let factory = EntityFactory::new(host.clone());
        let mut registry = Registry::new(host, false);
        let count = Synchronizer::new(&factory, strategy)
            .initialise(&mut registry, &EntityKind::ALL)
            .unwrap();
        assert_eq!(count, 4);
        registry
    }

    #[test]
    fn test_initialise_keeps_host_order() {
        let memory = populated();
        let registry = initialise(&memory, ListingStrategy::PerKind);

        assert_eq!(registry.collection(EntityKind::Tool).names(), vec!["T1", "T2"]);
        let t2 = registry.by_name(EntityKind::Tool, "T2").unwrap();
        assert_eq!(t2.detail(), &EntityDetail::Tool(ToolType::BallNosed));
        assert_eq!(t2.id(), memory.id_of(EntityKind::Tool, "T2").unwrap());
    }

    #[test]
    fn test_strategies_reach_the_same_state() {
        let memory = populated();
        let per_kind = initialise(&memory, ListingStrategy::PerKind);
        let bulk = initialise(&memory, ListingStrategy::Bulk);

        for kind in EntityKind::ALL {
            let left: Vec<_> = per_kind
                .collection(kind)
                .iter()
                .map(|e| (e.id(), e.name(), e.detail().clone()))
                .collect();
            let right: Vec<_> = bulk
                .collection(kind)
                .iter()
                .map(|e| (e.id(), e.name(), e.detail().clone()))
                .collect();
            assert_eq!(left, right, "kind {}", kind);
        }
    }

    #[test]
    fn test_bulk_initialise_is_one_round_trip() {
        let memory = populated();
        initialise(&memory, ListingStrategy::Bulk);
        assert_eq!(memory.queries(), vec!["LIST ALL"]);
    }

    #[test]
    fn test_reinitialise_discards_local_state_only() {
        let memory = populated();
        let host = Host::new(memory.clone());
        let factory = EntityFactory::new(host.clone());
        let mut registry = Registry::new(host, false);
        let sync = Synchronizer::new(&factory, ListingStrategy::PerKind);

        sync.initialise(&mut registry, &[EntityKind::Tool]).unwrap();
        memory.remove(EntityKind::Tool, "T1");
        sync.initialise(&mut registry, &[EntityKind::Tool]).unwrap();

        assert_eq!(registry.collection(EntityKind::Tool).names(), vec!["T2"]);
        assert!(memory.executed().is_empty());
    }

    #[test]
    fn test_unclassifiable_tool_is_skipped() {
        for strategy in [ListingStrategy::PerKind, ListingStrategy::Bulk] {
            let memory = populated();
            memory.insert(EntityKind::Tool, "Laser", Some("laser_cutter"));
            memory.insert(EntityKind::Tool, "T3", Some("drill"));

            let host = Host::new(memory.clone());
            let factory = EntityFactory::new(host.clone());
            let mut registry = Registry::new(host, false);
            let count = Synchronizer::new(&factory, strategy)
                .initialise(&mut registry, &EntityKind::ALL)
                .unwrap();

            assert_eq!(count, 5);
            assert_eq!(registry.collection(EntityKind::Tool).names(), vec!["T1", "T2", "T3"]);
        }
    }
}
