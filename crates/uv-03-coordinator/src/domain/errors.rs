//! # Domain Errors

use thiserror::Error;

/// Coordinator error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordinatorError {
    /// Negative block number.
    #[error("invalid block number: {0}")]
    InvalidBlockNumber(i64),

    /// No Active or PendingJoin validator in the cached set.
    #[error("no eligible validators for coordinator selection")]
    NoEligibleValidators,

    /// Invalid manager configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Validator set query failed.
    #[error("Validator set source error: {0}")]
    Source(String),
}
