use log::warn;
use std::collections::HashMap;

use super::ListingStrategy;
use crate::core::{EntityKind, EntityRecord, Result};
use crate::host::{command, Host};

/// Host listing for one pass.
///
/// With the bulk strategy the single `LIST ALL` query runs on first use and
/// is then served per kind from memory.
pub(crate) struct Listing<'a> {
    host: &'a Host,
    strategy: ListingStrategy,
    bulk: Option<HashMap<EntityKind, Vec<EntityRecord>>>,
}

impl<'a> Listing<'a> {
    pub(crate) fn new(host: &'a Host, strategy: ListingStrategy) -> Self {
        Self {
            host,
            strategy,
            bulk: None,
        }
    }

    /// Entities of `kind`, in host order.
    pub(crate) fn records(&mut self, kind: EntityKind) -> Result<Vec<EntityRecord>> {
        match self.strategy {
            ListingStrategy::PerKind => {
                let names = self.host.query_names(&command::list_names(kind))?;
                Ok(names
                    .into_iter()
                    .map(|name| EntityRecord::named(kind, name))
                    .collect())
            }
            ListingStrategy::Bulk => {
                if self.bulk.is_none() {
                    self.bulk = Some(self.fetch_bulk()?);
                }
                Ok(self
                    .bulk
                    .as_mut()
                    .and_then(|partitions| partitions.remove(&kind))
                    .unwrap_or_default())
            }
        }
    }

    fn fetch_bulk(&self) -> Result<HashMap<EntityKind, Vec<EntityRecord>>> {
        let rows = self.host.query_bulk(&command::list_all())?;
        let mut partitions: HashMap<EntityKind, Vec<EntityRecord>> = HashMap::new();

        for row in rows {
            let Some(kind) = EntityKind::from_tag(&row.tag) else {
                warn!("skipping bulk row '{}' of unsupported kind '{}'", row.name, row.tag);
                continue;
            };
            let mut record = EntityRecord::named(kind, row.name).with_id(row.id);
            record.sub_type = row.sub_type;
            partitions.entry(kind).or_default().push(record);
        }
        Ok(partitions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::EntityId;
    use crate::host::{HostResponse, InMemoryHost};

    #[test]
    fn test_per_kind_listing_has_no_ids() {
        let memory = InMemoryHost::new();
        memory.insert(EntityKind::Pattern, "P1", None);
        let host = Host::new(memory);

        let mut listing = Listing::new(&host, ListingStrategy::PerKind);
        let records = listing.records(EntityKind::Pattern).unwrap();
        assert_eq!(records, vec![EntityRecord::named(EntityKind::Pattern, "P1")]);
    }

    #[test]
    fn test_bulk_listing_queries_once_and_partitions() {
        let memory = InMemoryHost::new();
        let t1 = memory.insert(EntityKind::Tool, "T1", Some("drill"));
        memory.insert(EntityKind::Pattern, "P1", None);
        let host = Host::new(memory.clone());

        let mut listing = Listing::new(&host, ListingStrategy::Bulk);
        let tools = listing.records(EntityKind::Tool).unwrap();
        let patterns = listing.records(EntityKind::Pattern).unwrap();
        let models = listing.records(EntityKind::Model).unwrap();

        assert_eq!(tools[0].id, Some(t1));
        assert_eq!(tools[0].sub_type.as_deref(), Some("drill"));
        assert_eq!(patterns.len(), 1);
        assert!(models.is_empty());
        assert_eq!(memory.queries(), vec!["LIST ALL"]);
    }

    #[test]
    fn test_bulk_listing_skips_unknown_kinds() {
        let memory = InMemoryHost::new();
        memory.script_reply(
            "LIST ALL",
            HostResponse::Scalar("SPLINE\t1\t'S1'\nMODEL\t2\t'M1'".into()),
        );
        let host = Host::new(memory);

        let mut listing = Listing::new(&host, ListingStrategy::Bulk);
        let models = listing.records(EntityKind::Model).unwrap();
        assert_eq!(models.len(), 1);
        assert_eq!(models[0].id, Some(EntityId::new(2)));
    }
}
