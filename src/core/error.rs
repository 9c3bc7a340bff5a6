use std::time::Duration;
use thiserror::Error;

use super::kind::EntityKind;

#[derive(Error, Debug)]
pub enum MirrorError {
    #[error("Unsupported entity kind: '{0}'")]
    UnsupportedKind(String),

    #[error("Unsupported {kind} sub-type: '{sub_type}'")]
    UnsupportedSubType { kind: EntityKind, sub_type: String },

    #[error("Host reported an error for command '{command}': {response}")]
    HostProtocolError { command: String, response: String },

    #[error("Malformed response to '{command}': {detail}")]
    MalformedResponse { command: String, detail: String },

    #[error("Expected exactly one new {kind}, host created {}: {}", names.len(), names.join(", "))]
    AmbiguousCreationResult { kind: EntityKind, names: Vec<String> },

    #[error("Expected a new {kind}, host created none")]
    CreationNotFound { kind: EntityKind },

    #[error("{kind} '{owner}' references member id {member} which is not mirrored")]
    DanglingMember {
        kind: EntityKind,
        owner: String,
        member: String,
    },

    #[error("{0} has no membership relation")]
    NoRelation(EntityKind),

    #[error("Index {index} out of range for collection of {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Host still busy after {waited:?}")]
    HostBusyTimeout { waited: Duration },

    #[error("Transport unavailable: {0}")]
    TransportUnavailable(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Lock error: {0}")]
    LockError(String),
}

pub type Result<T> = std::result::Result<T, MirrorError>;

impl<T> From<std::sync::PoisonError<T>> for MirrorError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::LockError(err.to_string())
    }
}

impl From<serde_json::Error> for MirrorError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedResponse {
            command: String::new(),
            detail: err.to_string(),
        }
    }
}
