//! # State Sync Configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::StateSyncError;

/// Trust point search configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StateSyncConfig {
    /// Spacing between candidate heights (the remote snapshot interval).
    pub snapshot_interval: u64,

    /// Candidate heights tried before giving up.
    pub max_candidates: usize,

    /// Upper bound for one HTTP request in seconds.
    pub request_timeout_secs: u64,
}

impl Default for StateSyncConfig {
    fn default() -> Self {
        Self {
            snapshot_interval: 1000,
            max_candidates: 10,
            request_timeout_secs: 10,
        }
    }
}

impl StateSyncConfig {
    /// Per-request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Interval, candidate cap and timeout must be non-zero.
    pub fn validate(&self) -> Result<(), StateSyncError> {
        if self.snapshot_interval == 0 {
            return Err(StateSyncError::InvalidConfig(
                "snapshot_interval must be > 0".to_string(),
            ));
        }
        if self.max_candidates == 0 {
            return Err(StateSyncError::InvalidConfig(
                "max_candidates must be > 0".to_string(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(StateSyncError::InvalidConfig(
                "request_timeout_secs must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}
