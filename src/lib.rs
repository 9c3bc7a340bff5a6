// ============================================================================
// HostMirror Library
// ============================================================================

pub mod core;
pub mod host;
pub mod storage;
pub mod sync;
pub mod session;

// Re-export main types for convenience
pub use core::{
    BoundaryType, Entity, EntityDetail, EntityId, EntityKind, EntityRecord, EntityRef,
    EntitySnapshot, MirrorError, Result, ToolType, ToolpathStrategy,
};
pub use host::{BulkRow, Host, HostResponse, InMemoryHost, ListingShape, QueryAdapter};
pub use storage::{EntityFactory, MirrorCollection, Registry};
pub use sync::{CreatedItems, KindChanges, ListingStrategy, RefreshReport, Renamed, Synchronizer};

// Re-export session API
pub use session::{config::SessionConfig, MirrorSession, SessionStats};

// ============================================================================
// Quick start
// ============================================================================

/// Opens a mirror session over `adapter` with the default configuration.
///
/// The registry is populated before this returns.
///
/// # Examples
///
/// ```
/// use hostmirror::{EntityKind, InMemoryHost};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let host = InMemoryHost::new();
/// host.insert(EntityKind::Tool, "T1", Some("ball_nosed"));
///
/// let mut session = hostmirror::connect(host.clone())?;
/// assert_eq!(session.collection(EntityKind::Tool).names(), vec!["T1"]);
///
/// // Something outside the mirror creates a tool...
/// host.insert(EntityKind::Tool, "T2", Some("end_mill"));
///
/// // ...and Refresh picks it up without touching T1.
/// let report = session.refresh()?;
/// assert_eq!(report.added().count(), 1);
/// # Ok(())
/// # }
/// ```
pub fn connect<A>(adapter: A) -> Result<MirrorSession>
where
    A: QueryAdapter + Send + 'static,
{
    MirrorSession::open(adapter)
}

/// Opens a mirror session with a custom configuration.
///
/// # Examples
///
/// ```
/// use hostmirror::{EntityKind, InMemoryHost, SessionConfig};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = SessionConfig::new()
///     .bulk_listing()
///     .kinds(&[EntityKind::Toolpath, EntityKind::NcProgram]);
///
/// let session = hostmirror::connect_with_config(InMemoryHost::new(), config)?;
/// assert_eq!(session.registry().total_len(), 0);
/// # Ok(())
/// # }
/// ```
pub fn connect_with_config<A>(adapter: A, config: SessionConfig) -> Result<MirrorSession>
where
    A: QueryAdapter + Send + 'static,
{
    MirrorSession::open_with_config(adapter, config)
}
