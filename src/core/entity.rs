use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use super::{EntityDetail, EntityId, EntityKind, Result};
use crate::host::{command, Host};

/// Shared handle to a mirrored entity.
///
/// Synchronization passes hand out the same `Arc` for as long as the entity
/// exists on the host, so `Arc::ptr_eq` is a valid identity check.
pub type EntityRef = Arc<Entity>;

/// Client-side wrapper of one host entity.
pub struct Entity {
    id: EntityId,
    kind: EntityKind,
    detail: EntityDetail,
    /// Host lookup key; changes on rename, the id does not
    name: RwLock<String>,
    observed_at: DateTime<Utc>,
    host: Host,
}

impl Entity {
    pub(crate) fn new(
        id: EntityId,
        kind: EntityKind,
        name: impl Into<String>,
        detail: EntityDetail,
        host: Host,
    ) -> Self {
        Self {
            id,
            kind,
            detail,
            name: RwLock::new(name.into()),
            observed_at: Utc::now(),
            host,
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn detail(&self) -> &EntityDetail {
        &self.detail
    }

    /// Current name. Returns an owned copy because a rename can happen at any
    /// time through another handle.
    pub fn name(&self) -> String {
        self.name
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn has_name(&self, name: &str) -> bool {
        self.name
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .eq_ignore_ascii_case(name)
    }

    /// When this entity was first seen by the mirror.
    pub fn observed_at(&self) -> DateTime<Utc> {
        self.observed_at
    }

    /// Asks the host whether the entity still exists under its current name.
    pub fn exists(&self) -> Result<bool> {
        self.host
            .query_flag(&command::exists(self.kind, &self.name()))
    }

    /// Renames the entity on the host, then locally. The id is unchanged.
    pub fn rename(&self, new_name: &str) -> Result<()> {
        let old_name = self.name();
        self.host
            .execute(&[command::rename(self.kind, &old_name, new_name)])?;
        self.set_name(new_name);
        Ok(())
    }

    /// Makes this entity the active one of its kind.
    pub fn activate(&self) -> Result<()> {
        self.host.execute(&[command::activate(self.kind, &self.name())])
    }

    pub fn snapshot(&self) -> EntitySnapshot {
        EntitySnapshot {
            id: self.id,
            kind: self.kind,
            name: self.name(),
            detail: self.detail.clone(),
            observed_at: self.observed_at,
        }
    }

    /// Local-only name update, used when a refresh learns of an external rename.
    pub(crate) fn set_name(&self, name: &str) {
        let mut guard = self.name.write().unwrap_or_else(PoisonError::into_inner);
        *guard = name.to_string();
    }
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.id == other.id
    }
}

impl Eq for Entity {}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("name", &self.name())
            .field("detail", &self.detail)
            .finish()
    }
}

/// Serializable point-in-time view of an [`Entity`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntitySnapshot {
    pub id: EntityId,
    pub kind: EntityKind,
    pub name: String,
    pub detail: EntityDetail,
    pub observed_at: DateTime<Utc>,
}
