use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::core::{EntityKind, MirrorError, Result};
use crate::host::DEFAULT_ERROR_SENTINEL;
use crate::sync::ListingStrategy;

/// Mirror session configuration
///
/// Every field has a default; JSON documents only need the fields they
/// override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// How entity lists are read from the host
    pub listing: ListingStrategy,

    /// Kinds a session-wide pass visits, in order
    pub kinds: Vec<EntityKind>,

    /// Delay between busy-flag polls
    pub busy_poll_interval: Duration,

    /// Give up waiting for the host after this long
    pub busy_timeout: Duration,

    /// Reply substring that marks a host failure (case-insensitive)
    pub error_sentinel: String,

    /// Send deletes with the no-confirmation modifier
    pub no_confirm_deletes: bool,
}

impl SessionConfig {
    pub fn new() -> Self {
        Self {
            listing: ListingStrategy::PerKind,
            kinds: EntityKind::ALL.to_vec(),
            busy_poll_interval: Duration::from_millis(500),
            busy_timeout: Duration::from_secs(300), // 5 minutes
            error_sentinel: DEFAULT_ERROR_SENTINEL.to_string(),
            no_confirm_deletes: false,
        }
    }

    /// Set the listing strategy
    pub fn listing(mut self, listing: ListingStrategy) -> Self {
        self.listing = listing;
        self
    }

    /// Use the bulk listing (hosts that support `LIST ALL`)
    pub fn bulk_listing(self) -> Self {
        self.listing(ListingStrategy::Bulk)
    }

    /// Restrict session-wide passes to these kinds
    pub fn kinds(mut self, kinds: &[EntityKind]) -> Self {
        self.kinds = kinds.to_vec();
        self
    }

    /// Set busy poll interval
    pub fn busy_poll_interval(mut self, interval: Duration) -> Self {
        self.busy_poll_interval = interval;
        self
    }

    /// Set busy timeout
    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    /// Set error sentinel
    pub fn error_sentinel(mut self, sentinel: &str) -> Self {
        self.error_sentinel = sentinel.to_string();
        self
    }

    /// Set whether deletes skip host confirmation
    pub fn no_confirm_deletes(mut self, no_confirm: bool) -> Self {
        self.no_confirm_deletes = no_confirm;
        self
    }

    /// Parse from a JSON document
    ///
    /// # Examples
    ///
    /// ```
    /// use hostmirror::{ListingStrategy, SessionConfig};
    ///
    /// let config = SessionConfig::from_json(r#"{ "listing": "bulk" }"#).unwrap();
    /// assert_eq!(config.listing, ListingStrategy::Bulk);
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| MirrorError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.kinds.is_empty() {
            return Err(MirrorError::InvalidConfig("kinds cannot be empty".into()));
        }

        let mut seen = Vec::with_capacity(self.kinds.len());
        for kind in &self.kinds {
            if seen.contains(kind) {
                return Err(MirrorError::InvalidConfig(format!("kind {} listed twice", kind)));
            }
            seen.push(*kind);
        }

        if self.error_sentinel.trim().is_empty() {
            return Err(MirrorError::InvalidConfig("error_sentinel cannot be empty".into()));
        }

        if self.busy_poll_interval.is_zero() {
            return Err(MirrorError::InvalidConfig("busy_poll_interval must be > 0".into()));
        }

        if self.busy_poll_interval > self.busy_timeout {
            return Err(MirrorError::InvalidConfig(
                "busy_poll_interval cannot exceed busy_timeout".into(),
            ));
        }

        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new()
    }
}
