pub mod config;

use chrono::{DateTime, Utc};
use log::info;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{event, info_span, Level};
use uuid::Uuid;

use crate::core::{Entity, EntityKind, EntityRef, Result};
use crate::host::{Host, QueryAdapter};
use crate::storage::{EntityFactory, MirrorCollection, Registry};
use crate::sync::{self, CreatedItems, ListingStrategy, RefreshReport, Synchronizer};
use config::SessionConfig;

/// A connection to one host plus the mirror of its entities.
///
/// The registry is built when the session opens and lives as long as the
/// session; dropping the session discards the mirror.
pub struct MirrorSession {
    id: Uuid,
    config: SessionConfig,
    host: Host,
    factory: EntityFactory,
    registry: Registry,
    last_initialised_at: Option<DateTime<Utc>>,
    last_refreshed_at: Option<DateTime<Utc>>,
}

/// Serializable overview of a session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionStats {
    pub session_id: String,
    pub listing: ListingStrategy,
    pub counts: BTreeMap<EntityKind, usize>,
    pub total: usize,
    pub last_initialised_at: Option<DateTime<Utc>>,
    pub last_refreshed_at: Option<DateTime<Utc>>,
}

impl MirrorSession {
    /// Opens a session with the default configuration and mirrors every
    /// kind.
    pub fn open<A>(adapter: A) -> Result<Self>
    where
        A: QueryAdapter + Send + 'static,
    {
        Self::open_with_config(adapter, SessionConfig::default())
    }

    /// Opens a session and runs Initialise over the configured kinds.
    pub fn open_with_config<A>(adapter: A, config: SessionConfig) -> Result<Self>
    where
        A: QueryAdapter + Send + 'static,
    {
        config.validate()?;
        let host = Host::new(adapter).with_error_sentinel(&config.error_sentinel);
        let factory = EntityFactory::new(host.clone());
        let registry = Registry::new(host.clone(), config.no_confirm_deletes);

        let mut session = Self {
            id: Uuid::new_v4(),
            config,
            host,
            factory,
            registry,
            last_initialised_at: None,
            last_refreshed_at: None,
        };
        info!("opening mirror session {}", session.id);
        session.initialise()?;
        Ok(session)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn host(&self) -> &Host {
        &self.host
    }

    pub fn factory(&self) -> &EntityFactory {
        &self.factory
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    pub fn collection(&self, kind: EntityKind) -> &MirrorCollection {
        self.registry.collection(kind)
    }

    pub fn collection_mut(&mut self, kind: EntityKind) -> &mut MirrorCollection {
        self.registry.collection_mut(kind)
    }

    /// Sends host-mutating commands. The mirror is not updated; follow up
    /// with [`refresh`](Self::refresh) or [`resolve_created`](Self::resolve_created).
    pub fn execute(&self, commands: &[String]) -> Result<()> {
        self.host.execute(commands)
    }

    /// Discards the mirror and rebuilds it from the host.
    pub fn initialise(&mut self) -> Result<usize> {
        let span = info_span!(
            "mirror.initialise",
            session = %self.id,
            kinds = self.config.kinds.len()
        );
        let _enter = span.enter();

        self.registry.reset();
        let result = Synchronizer::new(&self.factory, self.config.listing)
            .initialise(&mut self.registry, &self.config.kinds);
        match &result {
            Ok(count) => {
                self.last_initialised_at = Some(Utc::now());
                event!(Level::INFO, entities = count, "mirror initialised");
            }
            Err(err) => event!(Level::ERROR, error = %err, "mirror initialise failed"),
        }
        result
    }

    /// Reconciles every configured kind with the host.
    pub fn refresh(&mut self) -> Result<RefreshReport> {
        let kinds = self.config.kinds.clone();
        self.refresh_kinds(&kinds)
    }

    /// Reconciles only `kinds`, in the order given.
    pub fn refresh_kinds(&mut self, kinds: &[EntityKind]) -> Result<RefreshReport> {
        let span = info_span!("mirror.refresh", session = %self.id, kinds = kinds.len());
        let _enter = span.enter();

        let result = Synchronizer::new(&self.factory, self.config.listing)
            .refresh(&mut self.registry, kinds);
        match &result {
            Ok(report) => {
                self.last_refreshed_at = Some(Utc::now());
                event!(
                    Level::INFO,
                    added = report.added().count(),
                    removed = report.removed().count(),
                    "mirror refreshed"
                );
            }
            Err(err) => event!(Level::ERROR, error = %err, "mirror refresh failed"),
        }
        result
    }

    /// Mirrors whatever the last host operation created among `kinds`.
    pub fn resolve_created(&mut self, kinds: &[EntityKind]) -> Result<CreatedItems> {
        let span = info_span!("mirror.resolve_created", session = %self.id, kinds = kinds.len());
        let _enter = span.enter();

        let result = Synchronizer::new(&self.factory, self.config.listing)
            .resolve_created(&mut self.registry, kinds);
        if let Err(err) = &result {
            event!(Level::ERROR, error = %err, "created-items resolution failed");
        }
        result
    }

    /// Mirrors and returns the one entity of `kind` the last host operation
    /// created.
    pub fn resolve_single_created(&mut self, kind: EntityKind) -> Result<EntityRef> {
        let span = info_span!("mirror.resolve_single_created", session = %self.id, kind = %kind);
        let _enter = span.enter();

        Synchronizer::new(&self.factory, self.config.listing)
            .resolve_single_created(&mut self.registry, kind)
    }

    /// Ordered members of a composite entity.
    pub fn members(&self, owner: &Entity) -> Result<Vec<EntityRef>> {
        sync::resolve_members(&self.host, &self.registry, owner)
    }

    /// Deletes the entity on the host and drops it from the mirror.
    pub fn remove(&mut self, entity: &Entity) -> Result<bool> {
        self.registry.remove(entity)
    }

    /// Blocks until the host reports it is no longer busy, bounded by the
    /// configured timeout.
    pub fn wait_until_idle(&self) -> Result<Duration> {
        sync::wait_until_idle(
            &self.host,
            self.config.busy_poll_interval,
            self.config.busy_timeout,
        )
    }

    pub fn stats(&self) -> SessionStats {
        let counts: BTreeMap<EntityKind, usize> = self
            .registry
            .collections()
            .map(|collection| (collection.kind(), collection.len()))
            .collect();

        SessionStats {
            session_id: self.id.to_string(),
            listing: self.config.listing,
            total: counts.values().sum(),
            counts,
            last_initialised_at: self.last_initialised_at,
            last_refreshed_at: self.last_refreshed_at,
        }
    }
}
