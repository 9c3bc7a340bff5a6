pub mod command;
pub mod memory;
pub mod response;

use log::debug;
use std::fmt;
use std::sync::{Arc, Mutex};

use crate::core::{EntityId, MirrorError, Result};
pub use memory::{InMemoryHost, ListingShape};
pub use response::{BulkRow, HostResponse};

/// Default substring that marks a host reply as a failure.
pub const DEFAULT_ERROR_SENTINEL: &str = "ERROR";

/// Transport to the host application.
///
/// Implementations block until the host answers. The mirror never has more
/// than one call in flight.
pub trait QueryAdapter {
    /// Runs commands without capturing output. Fails only when the transport
    /// itself is unavailable.
    fn execute(&mut self, commands: &[String]) -> Result<()>;

    /// Runs one query and returns its reply.
    fn execute_query(&mut self, command: &str) -> Result<HostResponse>;
}

/// Cloneable handle to the session's [`QueryAdapter`].
///
/// Every reply read through the handle is screened for the error sentinel
/// before it is parsed.
#[derive(Clone)]
pub struct Host {
    adapter: Arc<Mutex<dyn QueryAdapter + Send>>,
    error_sentinel: Arc<str>,
}

impl Host {
    pub fn new<A>(adapter: A) -> Self
    where
        A: QueryAdapter + Send + 'static,
    {
        Self {
            adapter: Arc::new(Mutex::new(adapter)),
            error_sentinel: Arc::from(DEFAULT_ERROR_SENTINEL),
        }
    }

    pub fn with_error_sentinel(mut self, sentinel: &str) -> Self {
        self.error_sentinel = Arc::from(sentinel);
        self
    }

    pub fn error_sentinel(&self) -> &str {
        &self.error_sentinel
    }

    pub fn execute(&self, commands: &[String]) -> Result<()> {
        for command in commands {
            debug!("host execute: {}", command);
        }
        let mut adapter = self.adapter.lock()?;
        adapter.execute(commands)
    }

    /// Runs a query and rejects replies that carry the error sentinel.
    pub fn query(&self, command: &str) -> Result<HostResponse> {
        debug!("host query: {}", command);
        let response = {
            let mut adapter = self.adapter.lock()?;
            adapter.execute_query(command)?
        };

        if let Some(text) = response.error_text(&self.error_sentinel) {
            return Err(MirrorError::HostProtocolError {
                command: command.to_string(),
                response: text,
            });
        }
        Ok(response)
    }

    pub fn query_scalar(&self, command: &str) -> Result<String> {
        self.query(command)?.into_scalar(command)
    }

    pub fn query_optional_name(&self, command: &str) -> Result<Option<String>> {
        self.query(command)?.into_optional_name(command)
    }

    pub fn query_names(&self, command: &str) -> Result<Vec<String>> {
        self.query(command)?.into_names(command)
    }

    pub fn query_id(&self, command: &str) -> Result<EntityId> {
        self.query(command)?.into_id(command)
    }

    pub fn query_ids(&self, command: &str) -> Result<Vec<EntityId>> {
        self.query(command)?.into_ids(command)
    }

    pub fn query_flag(&self, command: &str) -> Result<bool> {
        self.query(command)?.into_flag(command)
    }

    pub fn query_bulk(&self, command: &str) -> Result<Vec<BulkRow>> {
        self.query(command)?.into_bulk_rows(command)
    }
}

impl fmt::Debug for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Host")
            .field("error_sentinel", &self.error_sentinel)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::EntityKind;

    #[test]
    fn test_sentinel_turns_reply_into_protocol_error() {
        let memory = InMemoryHost::new();
        memory.script_reply("PRINT ACTIVE TOOL", HostResponse::Scalar("Error: no project".into()));
        let host = Host::new(memory);

        let err = host.query_scalar("PRINT ACTIVE TOOL").unwrap_err();
        match err {
            MirrorError::HostProtocolError { command, response } => {
                assert_eq!(command, "PRINT ACTIVE TOOL");
                assert_eq!(response, "Error: no project");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_custom_sentinel() {
        let memory = InMemoryHost::new();
        memory.insert(EntityKind::Tool, "error-proofing", Some("drill"));
        let host = Host::new(memory).with_error_sentinel("#FAIL#");

        let names = host.query_names(&command::list_names(EntityKind::Tool)).unwrap();
        assert_eq!(names, vec!["error-proofing"]);
    }
}
