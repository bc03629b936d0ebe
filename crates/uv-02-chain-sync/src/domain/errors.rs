//! # Domain Errors

use shared_types::{ChainClientError, ContextError};
use thiserror::Error;

/// Chain sync error types.
#[derive(Debug, Error)]
pub enum ChainSyncError {
    /// A required collaborator was not supplied before `start`.
    #[error("Missing dependency: {0}")]
    MissingDependency(&'static str),

    /// Invalid job configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The upstream config source failed.
    #[error("Chain config source error: {0}")]
    Source(String),

    /// The upstream returned no chains; the previous cache is kept.
    #[error("fetched zero chain configs")]
    EmptySnapshot,

    /// The initial sync gave up after all attempts.
    #[error("Initial sync failed after {attempts} attempts: {last_error}")]
    InitialSyncFailed {
        /// Attempts made
        attempts: u32,
        /// Last error seen
        last_error: String,
    },

    /// Chain client creation, start or lookup failed.
    #[error("Chain client error: {0}")]
    Client(#[from] ChainClientError),

    /// Timed out or cancelled.
    #[error("Sync interrupted: {0}")]
    Interrupted(#[from] ContextError),
}
