//! # Chain Sync Configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::ChainSyncError;

/// Chain cache refresh job configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainCacheJobConfig {
    /// Periodic refresh interval in seconds.
    pub interval_secs: u64,

    /// Upper bound for one refresh attempt in seconds.
    pub per_sync_timeout_secs: u64,

    /// Attempts made by the initial sync before giving up.
    pub initial_sync_attempts: u32,

    /// Delay after the first failed initial attempt; doubles per attempt.
    pub initial_backoff_ms: u64,
}

impl Default for ChainCacheJobConfig {
    fn default() -> Self {
        Self {
            interval_secs: 60,
            per_sync_timeout_secs: 8,
            initial_sync_attempts: 3,
            initial_backoff_ms: 1_000,
        }
    }
}

impl ChainCacheJobConfig {
    /// Create a config for testing (short intervals).
    pub fn for_testing() -> Self {
        Self {
            interval_secs: 1,
            per_sync_timeout_secs: 1,
            initial_sync_attempts: 3,
            initial_backoff_ms: 10,
        }
    }

    /// Refresh interval.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Per-attempt timeout.
    pub fn per_sync_timeout(&self) -> Duration {
        Duration::from_secs(self.per_sync_timeout_secs)
    }

    /// First backoff delay.
    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    /// Reject values that would spin or never sync.
    pub fn validate(&self) -> Result<(), ChainSyncError> {
        if self.interval_secs == 0 {
            return Err(ChainSyncError::InvalidConfig(
                "cache interval_secs must be > 0".to_string(),
            ));
        }
        if self.per_sync_timeout_secs == 0 {
            return Err(ChainSyncError::InvalidConfig(
                "cache per_sync_timeout_secs must be > 0".to_string(),
            ));
        }
        if self.initial_sync_attempts == 0 {
            return Err(ChainSyncError::InvalidConfig(
                "initial_sync_attempts must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Chain registry reconciliation job configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainRegistryJobConfig {
    /// Reconciliation interval in seconds.
    pub interval_secs: u64,

    /// Upper bound for adding or updating a single chain client, in seconds.
    pub per_sync_timeout_secs: u64,
}

impl Default for ChainRegistryJobConfig {
    fn default() -> Self {
        Self {
            interval_secs: 60,
            per_sync_timeout_secs: 8,
        }
    }
}

impl ChainRegistryJobConfig {
    /// Create a config for testing (short intervals).
    pub fn for_testing() -> Self {
        Self {
            interval_secs: 1,
            per_sync_timeout_secs: 1,
        }
    }

    /// Reconciliation interval.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Per-chain timeout.
    pub fn per_sync_timeout(&self) -> Duration {
        Duration::from_secs(self.per_sync_timeout_secs)
    }

    /// Reject values that would spin.
    pub fn validate(&self) -> Result<(), ChainSyncError> {
        if self.interval_secs == 0 || self.per_sync_timeout_secs == 0 {
            return Err(ChainSyncError::InvalidConfig(
                "registry interval_secs and per_sync_timeout_secs must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ChainCacheJobConfig::default();
        assert_eq!(config.interval(), Duration::from_secs(60));
        assert_eq!(config.per_sync_timeout(), Duration::from_secs(8));
        assert_eq!(config.initial_backoff(), Duration::from_secs(1));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let config = ChainCacheJobConfig {
            interval_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ChainRegistryJobConfig {
            interval_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_style_defaults() {
        let config: ChainCacheJobConfig =
            serde_json::from_str(r#"{"interval_secs": 30}"#).unwrap();
        assert_eq!(config.interval_secs, 30);
        assert_eq!(config.per_sync_timeout_secs, 8);
    }
}
