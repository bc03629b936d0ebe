//! # Error Types
//!
//! Errors shared across subsystems.

use thiserror::Error;

use crate::chain::VmType;

/// Construction errors for the closed enumerations in this crate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SharedError {
    /// Raw VM type value outside the known set.
    #[error("Unknown VM type: {0}")]
    UnknownVmType(i32),

    /// Raw validator status value outside the known set.
    #[error("Unknown validator status: {0}")]
    UnknownValidatorStatus(i32),
}

/// Errors raised by per-chain clients and the registry that owns them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainClientError {
    /// No client registered for the chain.
    #[error("Chain client not found: {0}")]
    NotFound(String),

    /// Chain config rejected (empty id, missing fields).
    #[error("Invalid chain config: {0}")]
    InvalidConfig(String),

    /// No client implementation for this VM family.
    #[error("Unsupported VM type: {0}")]
    UnsupportedVm(VmType),

    /// The chain has no outbound transaction builder.
    #[error("Tx builder not supported for chain {0}")]
    TxBuilderUnsupported(String),

    /// Remote RPC failed. Retryable.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// Transaction could not be assembled from the supplied data.
    #[error("Invalid transaction data: {0}")]
    InvalidTxData(String),

    /// Client lifecycle failure (start/stop).
    #[error("Client lifecycle error: {0}")]
    Lifecycle(String),
}

impl ChainClientError {
    /// RPC-facing errors are worth retrying on the next tick.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ChainClientError::Rpc(_))
    }
}
