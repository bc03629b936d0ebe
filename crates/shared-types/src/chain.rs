//! # Chain Configuration
//!
//! External chain configuration as published by the on-chain chain registry.
//! Values are immutable once read; the cache replaces them wholesale.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::SharedError;

/// Virtual machine family of an external chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VmType {
    /// Not set by the registry. No client can be built for it.
    #[default]
    Unspecified,
    /// Account-nonce based EVM chain.
    Evm,
    /// Solana-style chain, nonce tracked in a program-derived account.
    Svm,
}

impl TryFrom<i32> for VmType {
    type Error = SharedError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(VmType::Unspecified),
            1 => Ok(VmType::Evm),
            2 => Ok(VmType::Svm),
            other => Err(SharedError::UnknownVmType(other)),
        }
    }
}

impl fmt::Display for VmType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VmType::Unspecified => write!(f, "UNSPECIFIED"),
            VmType::Evm => write!(f, "EVM"),
            VmType::Svm => write!(f, "SVM"),
        }
    }
}

/// Inbound/outbound switches for a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChainEnabled {
    /// Observe deposits coming from the chain.
    pub is_inbound_enabled: bool,
    /// Broadcast outbound transactions to the chain.
    pub is_outbound_enabled: bool,
}

/// A gateway contract method the client watches or calls.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GatewayMethod {
    /// Human readable name.
    pub name: String,
    /// Selector or instruction discriminator.
    pub identifier: String,
    /// Event topic emitted by the method.
    #[serde(default)]
    pub event_identifier: String,
}

/// Configuration of one external chain.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChainConfig {
    /// CAIP-2 chain identifier (e.g. `eip155:11155111`).
    pub chain: String,
    /// VM family.
    #[serde(default)]
    pub vm_type: VmType,
    /// Gateway contract address.
    #[serde(default)]
    pub gateway_address: String,
    /// Gateway methods.
    #[serde(default)]
    pub gateway_methods: Vec<GatewayMethod>,
    /// RPC endpoints, tried in order.
    #[serde(default)]
    pub rpc_urls: Vec<String>,
    /// Confirmations required before an inbound event is final.
    #[serde(default)]
    pub confirmation_depth: u64,
    /// Client-side polling interval in seconds.
    #[serde(default)]
    pub refresh_interval_secs: u64,
    /// Inbound/outbound switches. Absent means disabled.
    #[serde(default)]
    pub enabled: Option<ChainEnabled>,
}

impl ChainConfig {
    /// Create a config with the given id and VM type, both directions enabled.
    pub fn new(chain: impl Into<String>, vm_type: VmType) -> Self {
        Self {
            chain: chain.into(),
            vm_type,
            enabled: Some(ChainEnabled {
                is_inbound_enabled: true,
                is_outbound_enabled: true,
            }),
            ..Default::default()
        }
    }

    /// True when at least one direction is switched on.
    pub fn is_active(&self) -> bool {
        self.enabled
            .map(|e| e.is_inbound_enabled || e.is_outbound_enabled)
            .unwrap_or(false)
    }

    /// Compares the fields that require a client rebuild when changed:
    /// chain id, VM type, gateway address and enabled switches.
    pub fn is_equivalent(&self, other: &ChainConfig) -> bool {
        self.chain == other.chain
            && self.vm_type == other.vm_type
            && self.gateway_address == other.gateway_address
            && self.enabled == other.enabled
    }
}
