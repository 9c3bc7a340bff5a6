use log::debug;
use std::thread;
use std::time::{Duration, Instant};

use crate::core::{MirrorError, Result};
use crate::host::{command, Host};

/// Polls the host's busy flag every `poll_interval` until it clears.
///
/// Returns how long the wait took, or `HostBusyTimeout` once `timeout` has
/// elapsed with the host still busy.
pub fn wait_until_idle(host: &Host, poll_interval: Duration, timeout: Duration) -> Result<Duration> {
    let started = Instant::now();
    let query = command::busy();

    loop {
        if !host.query_flag(&query)? {
            let waited = started.elapsed();
            debug!("host idle after {:?}", waited);
            return Ok(waited);
        }

        let waited = started.elapsed();
        if waited >= timeout {
            return Err(MirrorError::HostBusyTimeout { waited });
        }
        thread::sleep(poll_interval.min(timeout - waited));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::InMemoryHost;

    #[test]
    fn test_returns_once_idle() {
        let memory = InMemoryHost::new();
        memory.set_busy_for(3);
        let host = Host::new(memory.clone());

        wait_until_idle(&host, Duration::from_millis(1), Duration::from_secs(5)).unwrap();
        assert_eq!(memory.queries().len(), 4);
    }

    #[test]
    fn test_times_out() {
        let memory = InMemoryHost::new();
        memory.set_busy_for(u32::MAX);
        let host = Host::new(memory);

        let err = wait_until_idle(&host, Duration::from_millis(1), Duration::from_millis(20)).unwrap_err();
        match err {
            MirrorError::HostBusyTimeout { waited } => assert!(waited >= Duration::from_millis(20)),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_zero_timeout_still_polls_once() {
        let memory = InMemoryHost::new();
        let host = Host::new(memory.clone());

        wait_until_idle(&host, Duration::from_millis(1), Duration::ZERO).unwrap();
        assert_eq!(memory.queries(), vec!["PRINT BUSY"]);
    }
}
