//! # Broadcaster Configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::BroadcastError;

/// Transaction broadcaster configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BroadcasterConfig {
    /// Polling interval for SIGNED events in seconds.
    pub check_interval_secs: u64,

    /// Events fetched per store query.
    pub batch_size: usize,

    /// Upper bound for one RPC call (nonce query or broadcast) in seconds.
    pub rpc_timeout_secs: u64,
}

impl Default for BroadcasterConfig {
    fn default() -> Self {
        Self {
            check_interval_secs: 15,
            batch_size: 100,
            rpc_timeout_secs: 30,
        }
    }
}

impl BroadcasterConfig {
    /// Create a config for testing.
    pub fn for_testing() -> Self {
        Self {
            check_interval_secs: 1,
            batch_size: 2,
            rpc_timeout_secs: 1,
        }
    }

    /// Polling interval.
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }

    /// Per-call RPC timeout.
    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_secs(self.rpc_timeout_secs)
    }

    /// Interval, batch size and timeout must be non-zero.
    pub fn validate(&self) -> Result<(), BroadcastError> {
        if self.check_interval_secs == 0 {
            return Err(BroadcastError::InvalidConfig(
                "check_interval_secs must be > 0".to_string(),
            ));
        }
        if self.batch_size == 0 {
            return Err(BroadcastError::InvalidConfig(
                "batch_size must be > 0".to_string(),
            ));
        }
        if self.rpc_timeout_secs == 0 {
            return Err(BroadcastError::InvalidConfig(
                "rpc_timeout_secs must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BroadcasterConfig::default();
        assert_eq!(config.check_interval(), Duration::from_secs(15));
        assert_eq!(config.batch_size, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_batch_rejected() {
        let config = BroadcasterConfig {
            batch_size: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
