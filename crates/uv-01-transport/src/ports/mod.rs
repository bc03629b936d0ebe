//! # Ports Layer
//!
//! The capability every transport backend implements.

use async_trait::async_trait;
use shared_types::RunContext;
use std::sync::Arc;

use crate::domain::TransportError;

/// Inbound message callback: `(sender id, payload)`. Runs on the blocking
/// pool, never on the accept path, so it may block.
pub type MessageHandler = Arc<dyn Fn(String, Vec<u8>) + Send + Sync>;

/// Peer-to-peer message transport.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Local peer id.
    fn id(&self) -> String;

    /// Addresses other peers can dial, each ending in `/p2p/<id>` where the
    /// backend has peer ids in addresses.
    fn listen_addrs(&self) -> Vec<String>;

    /// Install the inbound handler. Fails on a second call.
    fn register_handler(&self, handler: MessageHandler) -> Result<(), TransportError>;

    /// Record how to reach `peer_id`.
    fn ensure_peer(&self, peer_id: &str, addrs: &[String]) -> Result<(), TransportError>;

    /// Deliver one frame. Returns once written; no reply is awaited.
    async fn send(
        &self,
        ctx: &RunContext,
        peer_id: &str,
        payload: &[u8],
    ) -> Result<(), TransportError>;

    /// Release resources. Idempotent.
    async fn close(&self) -> Result<(), TransportError>;
}
