//! # Coordinator Configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::CoordinatorError;

/// UV manager configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Address of the local validator.
    pub my_validator_address: String,

    /// Blocks per coordinator epoch.
    pub coordinator_range_size: u64,

    /// Validator set refresh interval in seconds.
    pub refresh_interval_secs: u64,

    /// Upper bound for one validator set query in seconds.
    pub refresh_timeout_secs: u64,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            my_validator_address: String::new(),
            coordinator_range_size: 100,
            refresh_interval_secs: 30,
            refresh_timeout_secs: 10,
        }
    }
}

impl CoordinatorConfig {
    /// Create a config for testing.
    pub fn for_testing(my_validator_address: &str) -> Self {
        Self {
            my_validator_address: my_validator_address.to_string(),
            refresh_interval_secs: 1,
            refresh_timeout_secs: 1,
            ..Default::default()
        }
    }

    /// Refresh interval.
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    /// Query timeout.
    pub fn refresh_timeout(&self) -> Duration {
        Duration::from_secs(self.refresh_timeout_secs)
    }

    /// Range size and intervals must be non-zero.
    pub fn validate(&self) -> Result<(), CoordinatorError> {
        if self.coordinator_range_size == 0 {
            return Err(CoordinatorError::InvalidConfig(
                "coordinator_range_size must be > 0".to_string(),
            ));
        }
        if self.refresh_interval_secs == 0 || self.refresh_timeout_secs == 0 {
            return Err(CoordinatorError::InvalidConfig(
                "refresh intervals must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}
