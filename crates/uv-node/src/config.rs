//! # Node Configuration
//!
//! One TOML document with a table per subsystem. Every field has a default,
//! so an empty file (or no file) yields a runnable single-node setup.
//!
//! ```toml
//! tss_address = "0x5FbDB2315678afecb367f032d93F642f64180aa3"
//!
//! [transport]
//! listen_addrs = ["/ip4/0.0.0.0/tcp/39000"]
//!
//! [coordinator]
//! my_validator_address = "pushvaloper1..."
//!
//! [[chains]]
//! chain = "eip155:11155111"
//! vm_type = "EVM"
//! enabled = { is_inbound_enabled = true, is_outbound_enabled = true }
//! ```

use serde::{Deserialize, Serialize};
use shared_types::{ChainConfig, UniversalValidator};
use std::path::{Path, PathBuf};
use thiserror::Error;

use uv_01_transport::TransportConfig;
use uv_02_chain_sync::{ChainCacheJobConfig, ChainRegistryJobConfig};
use uv_03_coordinator::CoordinatorConfig;
use uv_04_tx_broadcaster::BroadcasterConfig;
use uv_05_state_sync::StateSyncConfig;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file unreadable.
    #[error("failed to read config {path}: {reason}")]
    Read {
        /// File path
        path: String,
        /// IO error
        reason: String,
    },

    /// Config file is not valid TOML for [`NodeConfig`].
    #[error("failed to parse config: {0}")]
    Parse(String),

    /// A subsystem rejected its section.
    #[error("invalid {section} config: {reason}")]
    Invalid {
        /// Section name
        section: &'static str,
        /// Validation message
        reason: String,
    },
}

/// A statically known peer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerEntry {
    /// libp2p peer id.
    pub peer_id: String,
    /// Dialable multiaddrs.
    pub addrs: Vec<String>,
}

/// Complete node configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Peer transport.
    pub transport: TransportConfig,
    /// Chain cache refresh job.
    pub cache_job: ChainCacheJobConfig,
    /// Chain registry reconciliation job.
    pub registry_job: ChainRegistryJobConfig,
    /// UV manager.
    pub coordinator: CoordinatorConfig,
    /// Transaction broadcaster.
    pub broadcaster: BroadcasterConfig,
    /// State-sync trust provider.
    pub state_sync: StateSyncConfig,
    /// TSS signer address used for EVM nonce queries.
    pub tss_address: String,
    /// Tendermint RPC base URL. A trust point is computed at startup when set.
    pub state_sync_rpc: Option<String>,
    /// Chain configs served to the chain cache.
    pub chains: Vec<ChainConfig>,
    /// Validator set served to the UV manager.
    pub validators: Vec<UniversalValidator>,
    /// Peers registered with the transport at startup.
    pub peers: Vec<PeerEntry>,
    /// RocksDB event store directory (`rocksdb` feature). Events stay in
    /// memory when unset.
    pub event_store_path: Option<PathBuf>,
}

impl NodeConfig {
    /// Parse a TOML document.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load from `path`, or defaults when `None`.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                })?;
                Self::from_toml(&text)
            }
            None => Ok(Self::default()),
        }
    }

    /// Apply `UV_*` overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from `lookup`. Empty values are ignored.
    ///
    /// | Variable | Field |
    /// |----------|-------|
    /// | `UV_LISTEN_ADDRS` | `transport.listen_addrs` (comma separated) |
    /// | `UV_PRIVATE_KEY` | `transport.private_key_base64` |
    /// | `UV_VALIDATOR_ADDRESS` | `coordinator.my_validator_address` |
    /// | `UV_TSS_ADDRESS` | `tss_address` |
    /// | `UV_STATE_SYNC_RPC` | `state_sync_rpc` |
    /// | `UV_EVENT_STORE_PATH` | `event_store_path` |
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(addrs) = get("UV_LISTEN_ADDRS") {
            self.transport.listen_addrs = addrs
                .split(',')
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(key) = get("UV_PRIVATE_KEY") {
            self.transport.private_key_base64 = Some(key);
        }
        if let Some(address) = get("UV_VALIDATOR_ADDRESS") {
            self.coordinator.my_validator_address = address;
        }
        if let Some(address) = get("UV_TSS_ADDRESS") {
            self.tss_address = address;
        }
        if let Some(url) = get("UV_STATE_SYNC_RPC") {
            self.state_sync_rpc = Some(url);
        }
        if let Some(path) = get("UV_EVENT_STORE_PATH") {
            self.event_store_path = Some(PathBuf::from(path));
        }
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn section<E: std::fmt::Display>(
            name: &'static str,
            result: Result<(), E>,
        ) -> Result<(), ConfigError> {
            result.map_err(|e| ConfigError::Invalid {
                section: name,
                reason: e.to_string(),
            })
        }

        section("transport", self.transport.validate())?;
        section("cache_job", self.cache_job.validate())?;
        section("registry_job", self.registry_job.validate())?;
        section("coordinator", self.coordinator.validate())?;
        section("broadcaster", self.broadcaster.validate())?;
        section("state_sync", self.state_sync.validate())?;

        if let Some(chain) = self.chains.iter().find(|c| c.chain.trim().is_empty()) {
            return Err(ConfigError::Invalid {
                section: "chains",
                reason: format!("chain id must not be empty (vm {})", chain.vm_type),
            });
        }
        if self.event_store_path.is_some() && !cfg!(feature = "rocksdb") {
            return Err(ConfigError::Invalid {
                section: "event_store_path",
                reason: "persistent event store requires the rocksdb feature".to_string(),
            });
        }
        Ok(())
    }
}
