use log::debug;
use std::sync::Arc;

use crate::core::{Entity, EntityDetail, EntityId, EntityKind, EntityRecord, EntityRef, Result};
use crate::host::{command, Host};

/// Turns host listing rows into typed entities.
///
/// This is the single place where a kind tag or a sub-type string is
/// classified.
#[derive(Debug, Clone)]
pub struct EntityFactory {
    host: Host,
}

impl EntityFactory {
    pub fn new(host: Host) -> Self {
        Self { host }
    }

    /// Builds an entity from a raw kind tag.
    ///
    /// Fails with `UnsupportedKind` for a tag outside the closed set. The
    /// sub-type is asked from the host when the kind needs one and no hint
    /// is given.
    pub fn create(&self, kind_tag: &str, name: &str, sub_type_hint: Option<&str>) -> Result<EntityRef> {
        let kind = kind_tag.parse::<EntityKind>()?;
        let mut record = EntityRecord::named(kind, name);
        record.sub_type = sub_type_hint.map(str::to_string);
        self.build(record)
    }

    /// Builds an entity from a listing record, filling in whatever the record
    /// lacks (id, sub-type) from the host.
    pub fn build(&self, record: EntityRecord) -> Result<EntityRef> {
        let id = match record.id {
            Some(id) => id,
            None => self.lookup_id(record.kind, &record.name)?,
        };
        let detail = self.detail(&record)?;

        debug!("observed {} '{}' (id {})", record.kind, record.name, id);
        Ok(Arc::new(Entity::new(
            id,
            record.kind,
            record.name,
            detail,
            self.host.clone(),
        )))
    }

    /// Host id of the entity currently called `name`.
    pub fn lookup_id(&self, kind: EntityKind, name: &str) -> Result<EntityId> {
        self.host.query_id(&command::entity_id(kind, name))
    }

    fn detail(&self, record: &EntityRecord) -> Result<EntityDetail> {
        if !record.kind.has_sub_type() {
            return Ok(EntityDetail::Plain);
        }
        let sub_type = match &record.sub_type {
            Some(hint) => hint.clone(),
            None => self
                .host
                .query_scalar(&command::sub_type(record.kind, &record.name))?,
        };
        EntityDetail::from_sub_type(record.kind, Some(sub_type.trim()))
    }

    pub fn host(&self) -> &Host {
        &self.host
    }
}
