//! # Domain Errors

use shared_types::ContextError;
use thiserror::Error;

/// Transport error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// `register_handler` called a second time.
    #[error("handler already registered")]
    HandlerAlreadyRegistered,

    /// Empty peer id or empty address list.
    #[error("invalid peer info")]
    InvalidPeerInfo,

    /// Peer id does not parse.
    #[error("invalid peer id {0}")]
    InvalidPeerId(String),

    /// Address does not parse as a multiaddr.
    #[error("invalid multiaddr {addr}: {reason}")]
    InvalidMultiaddr {
        /// Offending address
        addr: String,
        /// Parser message
        reason: String,
    },

    /// Address embeds a different peer id.
    #[error("multiaddr peer mismatch: expected {expected} got {got}")]
    PeerMismatch {
        /// Expected peer id
        expected: String,
        /// Embedded peer id
        got: String,
    },

    /// Every supplied address was blank.
    #[error("no usable addresses provided")]
    NoUsableAddresses,

    /// Peer was never registered with `ensure_peer` (or linked).
    #[error("unknown peer {0}")]
    UnknownPeer(String),

    /// Peer has no handler registered (mock backend).
    #[error("peer {0} has no handler registered")]
    NoHandler(String),

    /// Connection attempt failed.
    #[error("failed to connect to peer {peer}: {reason}")]
    Dial {
        /// Peer id
        peer: String,
        /// Dial error
        reason: String,
    },

    /// Connection attempt did not finish within the dial timeout.
    #[error("dial to peer {0} timed out")]
    DialTimeout(String),

    /// Stream could not be opened.
    #[error("failed to create stream to peer {peer}: {reason}")]
    Stream {
        /// Peer id
        peer: String,
        /// Stream error
        reason: String,
    },

    /// Frame IO failed.
    #[error("frame io error: {0}")]
    Io(String),

    /// Frame length above the limit.
    #[error("frame of {len} bytes exceeds limit of {max}")]
    FrameTooLarge {
        /// Announced or supplied length
        len: usize,
        /// Limit
        max: usize,
    },

    /// Private key could not be decoded.
    #[error("identity error: {0}")]
    Identity(String),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Swarm construction or listen failed.
    #[error("transport init failed: {0}")]
    Init(String),

    /// Transport closed.
    #[error("transport closed")]
    Closed,

    /// Timed out or cancelled.
    #[error("operation interrupted: {0}")]
    Interrupted(#[from] ContextError),
}

impl From<std::io::Error> for TransportError {
    fn from(e: std::io::Error) -> Self {
        TransportError::Io(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(TransportError::InvalidPeerInfo.to_string(), "invalid peer info");
        assert_eq!(
            TransportError::PeerMismatch {
                expected: "A".to_string(),
                got: "B".to_string()
            }
            .to_string(),
            "multiaddr peer mismatch: expected A got B"
        );
        assert_eq!(
            TransportError::NoUsableAddresses.to_string(),
            "no usable addresses provided"
        );
    }

    #[test]
    fn test_from_io() {
        let err: TransportError =
            std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "eof").into();
        assert!(matches!(err, TransportError::Io(_)));
    }
}
