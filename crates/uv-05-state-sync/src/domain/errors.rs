//! # Domain Errors

use shared_types::ContextError;
use thiserror::Error;

/// State sync error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateSyncError {
    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The request could not be sent or the body not read.
    #[error("HTTP request to {url} failed: {reason}")]
    Http {
        /// Request URL
        url: String,
        /// Transport error
        reason: String,
    },

    /// Non-success HTTP status (404 means pruned).
    #[error("HTTP {status} from {url}")]
    Status {
        /// Request URL
        url: String,
        /// Status code
        status: u16,
    },

    /// Body is not JSON or lacks the expected field.
    #[error("Malformed response from {url}: {reason}")]
    Malformed {
        /// Request URL
        url: String,
        /// What was wrong
        reason: String,
    },

    /// Latest height is below one snapshot interval.
    #[error("No candidate heights below latest height {latest} with interval {interval}")]
    NoCandidates {
        /// Latest height reported by /status
        latest: u64,
        /// Snapshot interval
        interval: u64,
    },

    /// Every candidate failed on both endpoints.
    #[error("No trust point found after {tried} candidate heights (last error: {last_error})")]
    Exhausted {
        /// Candidates tried
        tried: usize,
        /// Last error seen
        last_error: String,
    },

    /// Timed out or cancelled.
    #[error("Trust search interrupted: {0}")]
    Interrupted(#[from] ContextError),
}

impl StateSyncError {
    /// True when the endpoint reported the height as pruned.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StateSyncError::Status { status: 404, .. })
    }
}
