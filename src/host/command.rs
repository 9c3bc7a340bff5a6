//! Spelling of every command and query the mirror sends to the host.
//!
//! Names are always single-quoted; the host has no escape for `'` inside a
//! name, so callers never see names containing one.

use crate::core::EntityKind;

/// Modifier that suppresses the host's confirmation dialog on delete.
pub const NO_CONFIRM: &str = "NOQUERY";

pub fn delete(kind: EntityKind, name: &str, no_confirm: bool) -> String {
    if no_confirm {
        format!("DELETE {} '{}' {}", kind, name, NO_CONFIRM)
    } else {
        format!("DELETE {} '{}'", kind, name)
    }
}

pub fn rename(kind: EntityKind, old: &str, new: &str) -> String {
    format!("RENAME {} '{}' '{}'", kind, old, new)
}

pub fn activate(kind: EntityKind, name: &str) -> String {
    format!("ACTIVATE {} '{}'", kind, name)
}

pub fn deactivate(kind: EntityKind) -> String {
    format!("DEACTIVATE {}", kind)
}

pub fn list_names(kind: EntityKind) -> String {
    format!("LIST {}", kind)
}

pub fn list_all() -> String {
    "LIST ALL".to_string()
}

pub fn entity_id(kind: EntityKind, name: &str) -> String {
    format!("PRINT ID {} '{}'", kind, name)
}

pub fn sub_type(kind: EntityKind, name: &str) -> String {
    format!("PRINT TYPE {} '{}'", kind, name)
}

pub fn exists(kind: EntityKind, name: &str) -> String {
    format!("PRINT EXISTS {} '{}'", kind, name)
}

pub fn active_name(kind: EntityKind) -> String {
    format!("PRINT ACTIVE {}", kind)
}

pub fn next_name(kind: EntityKind, prefix: Option<&str>) -> String {
    match prefix {
        Some(prefix) => format!("PRINT NEXTNAME {} '{}'", kind, prefix),
        None => format!("PRINT NEXTNAME {}", kind),
    }
}

pub fn members(kind: EntityKind, name: &str) -> String {
    format!("PRINT MEMBERS {} '{}'", kind, name)
}

pub fn busy() -> String {
    "PRINT BUSY".to_string()
}
