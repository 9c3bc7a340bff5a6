pub mod entity;
pub mod error;
pub mod kind;
pub mod types;

pub use entity::{Entity, EntityRef, EntitySnapshot};
pub use error::{MirrorError, Result};
pub use kind::EntityKind;
pub use types::{BoundaryType, EntityDetail, EntityId, EntityRecord, ToolType, ToolpathStrategy};
