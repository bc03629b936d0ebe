//! # Transport Configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::TransportError;

/// Default stream protocol id.
pub const DEFAULT_PROTOCOL_ID: &str = "/push/tss/1.0.0";

/// Transport configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Multiaddrs to listen on.
    pub listen_addrs: Vec<String>,

    /// Stream protocol id.
    pub protocol_id: String,

    /// Base64 protobuf-encoded private key. A fresh Ed25519 key is
    /// generated when unset.
    pub private_key_base64: Option<String>,

    /// Dial and stream-open timeout in seconds.
    pub dial_timeout_secs: u64,

    /// Frame read/write timeout in seconds.
    pub io_timeout_secs: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            listen_addrs: vec!["/ip4/0.0.0.0/tcp/0".to_string()],
            protocol_id: DEFAULT_PROTOCOL_ID.to_string(),
            private_key_base64: None,
            dial_timeout_secs: 10,
            io_timeout_secs: 15,
        }
    }
}

impl TransportConfig {
    /// Loopback listener with short timeouts.
    pub fn for_testing() -> Self {
        Self {
            listen_addrs: vec!["/ip4/127.0.0.1/tcp/0".to_string()],
            dial_timeout_secs: 5,
            io_timeout_secs: 5,
            ..Default::default()
        }
    }

    /// Dial timeout.
    pub fn dial_timeout(&self) -> Duration {
        Duration::from_secs(self.dial_timeout_secs)
    }

    /// IO timeout.
    pub fn io_timeout(&self) -> Duration {
        Duration::from_secs(self.io_timeout_secs)
    }

    /// Listen addresses present, protocol id absolute, timeouts non-zero.
    pub fn validate(&self) -> Result<(), TransportError> {
        if self.listen_addrs.is_empty() {
            return Err(TransportError::InvalidConfig(
                "at least one listen address is required".to_string(),
            ));
        }
        if !self.protocol_id.starts_with('/') {
            return Err(TransportError::InvalidConfig(format!(
                "protocol id must start with '/': {}",
                self.protocol_id
            )));
        }
        if self.dial_timeout_secs == 0 || self.io_timeout_secs == 0 {
            return Err(TransportError::InvalidConfig(
                "timeouts must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}
