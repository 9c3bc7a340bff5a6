//! Reconciliation of the mirror against host-reported listings.
//!
//! Every pass here is a sequence of blocking round trips. Progress is
//! committed kind by kind: a failure in one kind leaves kinds already
//! processed in their new state.

mod busy;
mod created;
mod initialise;
mod listing;
mod refresh;
mod relation;

pub use busy::wait_until_idle;
pub use created::CreatedItems;
pub use refresh::{KindChanges, RefreshReport, Renamed};
pub use relation::resolve_members;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::core::{EntityRecord, EntityRef, MirrorError, Result};
use crate::host::Host;
use crate::storage::EntityFactory;

/// How the host is asked for its entity lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingStrategy {
    /// One name-list query per kind; ids and sub-types are looked up per new
    /// entity.
    #[default]
    PerKind,
    /// One query returning type/id/name/sub-type rows for every kind.
    Bulk,
}

/// Runs Initialise, Refresh and the Created-Items Resolver over a
/// [`Registry`](crate::storage::Registry).
pub struct Synchronizer<'a> {
    factory: &'a EntityFactory,
    strategy: ListingStrategy,
}

impl<'a> Synchronizer<'a> {
    pub fn new(factory: &'a EntityFactory, strategy: ListingStrategy) -> Self {
        Self { factory, strategy }
    }

    pub fn strategy(&self) -> ListingStrategy {
        self.strategy
    }

    fn host(&self) -> &Host {
        self.factory.host()
    }

    fn listing(&self) -> listing::Listing<'_> {
        listing::Listing::new(self.host(), self.strategy)
    }

    /// Builds the entity for a listing row. A row whose sub-type cannot be
    /// classified is logged and yields `None`; the pass carries on.
    fn build_listed(&self, record: &EntityRecord) -> Result<Option<EntityRef>> {
        match self.factory.build(record.clone()) {
            Ok(entity) => Ok(Some(entity)),
            Err(MirrorError::UnsupportedSubType { kind, sub_type }) => {
                warn!(
                    "skipping {} '{}': unsupported sub-type '{}'",
                    kind, record.name, sub_type
                );
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}
