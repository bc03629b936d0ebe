//! # Domain Errors

use shared_types::{ChainClientError, ContextError, VmType};
use thiserror::Error;

use super::event::EventStatus;

/// Broadcaster error types.
///
/// Data errors (`InvalidEventData`, `MissingSigningData`, `InvalidHex`,
/// `InvalidGasPrice`, `InvalidSignatureLength`) are permanent: retrying the
/// same event cannot change the outcome.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BroadcastError {
    /// Event data is not valid JSON of the expected shape.
    #[error("Invalid event data: {0}")]
    InvalidEventData(String),

    /// Event data has no `signing_data` section.
    #[error("signing_data missing from event data")]
    MissingSigningData,

    /// A hex field failed to decode.
    #[error("Invalid hex in {field}: {reason}")]
    InvalidHex {
        /// Field name
        field: &'static str,
        /// Decoder message
        reason: String,
    },

    /// Gas price is not a decimal integer.
    #[error("Invalid gas_price: {0}")]
    InvalidGasPrice(String),

    /// Signature length does not match what the destination accepts.
    #[error("Invalid signature length: expected {expected} bytes, got {actual}")]
    InvalidSignatureLength {
        /// Accepted length
        expected: usize,
        /// Supplied length
        actual: usize,
    },

    /// Destination VM type has no broadcast flow.
    #[error("Unsupported VM type for broadcast: {0}")]
    UnsupportedVm(VmType),

    /// Chain client lookup or builder error.
    #[error("Chain client error: {0}")]
    Client(#[from] ChainClientError),

    /// The builder failed before a transaction existed (no hash returned).
    #[error("Transaction could not be assembled: {0}")]
    Unassembled(ChainClientError),

    /// TSS address lookup failed.
    #[error("TSS address unavailable: {0}")]
    TssAddress(String),

    /// Timed out or cancelled.
    #[error("Broadcast interrupted: {0}")]
    Interrupted(#[from] ContextError),

    /// Event store failure.
    #[error("Event store error: {0}")]
    Store(String),

    /// Unknown event id.
    #[error("Event not found: {0}")]
    EventNotFound(String),

    /// Status change that would move an event backwards.
    #[error("Invalid status transition for {event_id}: {from} -> {to}")]
    InvalidTransition {
        /// Event id
        event_id: String,
        /// Current status
        from: EventStatus,
        /// Requested status
        to: EventStatus,
    },

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl BroadcastError {
    /// True for errors caused by the event's own data.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            BroadcastError::InvalidEventData(_)
                | BroadcastError::MissingSigningData
                | BroadcastError::InvalidHex { .. }
                | BroadcastError::InvalidGasPrice(_)
                | BroadcastError::InvalidSignatureLength { .. }
                | BroadcastError::UnsupportedVm(_)
                | BroadcastError::Unassembled(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_error_message() {
        let err = BroadcastError::InvalidTransition {
            event_id: "ev-1".to_string(),
            from: EventStatus::Broadcasted,
            to: EventStatus::Signed,
        };
        assert!(err.to_string().contains("BROADCASTED -> SIGNED"));
    }

    #[test]
    fn test_permanence() {
        assert!(BroadcastError::MissingSigningData.is_permanent());
        assert!(BroadcastError::InvalidSignatureLength {
            expected: 64,
            actual: 10
        }
        .is_permanent());
        assert!(BroadcastError::Unassembled(ChainClientError::InvalidTxData("bad".to_string()))
            .is_permanent());
        assert!(!BroadcastError::Store("io".to_string()).is_permanent());
        assert!(!BroadcastError::Interrupted(ContextError::Cancelled).is_permanent());
        assert!(!BroadcastError::Client(ChainClientError::Rpc("down".to_string())).is_permanent());
    }
}
