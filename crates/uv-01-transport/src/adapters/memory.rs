//! # In-Memory Transport
//!
//! Instances deliver straight to each other's handlers. Peers are wired
//! either pairwise with [`MockTransport::link`] or through a shared
//! [`MockNetwork`], where `ensure_peer` resolves ids against every
//! transport created from the network.

use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{ContextError, RunContext};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tracing::debug;

use crate::domain::TransportError;
use crate::ports::{MessageHandler, Transport};

struct Node {
    id: String,
    network: Option<Arc<MockNetwork>>,
    handler: RwLock<Option<MessageHandler>>,
    peers: RwLock<HashMap<String, Weak<Node>>>,
    closed: AtomicBool,
}

/// Directory of in-memory transports.
#[derive(Default)]
pub struct MockNetwork {
    nodes: RwLock<HashMap<String, Weak<Node>>>,
}

impl MockNetwork {
    /// Empty network.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A transport with id `id` reachable through this network.
    pub fn transport(self: &Arc<Self>, id: impl Into<String>) -> MockTransport {
        let transport = MockTransport::build(id.into(), Some(self.clone()));
        self.nodes
            .write()
            .insert(transport.node.id.clone(), Arc::downgrade(&transport.node));
        transport
    }

    fn lookup(&self, id: &str) -> Option<Weak<Node>> {
        self.nodes.read().get(id).cloned()
    }
}

/// In-memory [`Transport`].
#[derive(Clone)]
pub struct MockTransport {
    node: Arc<Node>,
}

impl MockTransport {
    /// Standalone transport; connect it with [`MockTransport::link`].
    pub fn new(id: impl Into<String>) -> Self {
        Self::build(id.into(), None)
    }

    fn build(id: String, network: Option<Arc<MockNetwork>>) -> Self {
        Self {
            node: Arc::new(Node {
                id,
                network,
                handler: RwLock::new(None),
                peers: RwLock::new(HashMap::new()),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Make `a` and `b` reachable from each other.
    pub fn link(a: &MockTransport, b: &MockTransport) {
        a.node
            .peers
            .write()
            .insert(b.node.id.clone(), Arc::downgrade(&b.node));
        b.node
            .peers
            .write()
            .insert(a.node.id.clone(), Arc::downgrade(&a.node));
    }

    /// Whether `close` has been called.
    pub fn is_closed(&self) -> bool {
        self.node.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for MockTransport {
    fn id(&self) -> String {
        self.node.id.clone()
    }

    fn listen_addrs(&self) -> Vec<String> {
        vec![format!("/memory/{}", self.node.id)]
    }

    fn register_handler(&self, handler: MessageHandler) -> Result<(), TransportError> {
        let mut slot = self.node.handler.write();
        if slot.is_some() {
            return Err(TransportError::HandlerAlreadyRegistered);
        }
        *slot = Some(handler);
        Ok(())
    }

    fn ensure_peer(&self, peer_id: &str, addrs: &[String]) -> Result<(), TransportError> {
        if peer_id.is_empty() || addrs.is_empty() {
            return Err(TransportError::InvalidPeerInfo);
        }
        if self.node.peers.read().contains_key(peer_id) {
            return Ok(());
        }
        let found = self
            .node
            .network
            .as_ref()
            .and_then(|network| network.lookup(peer_id))
            .ok_or_else(|| TransportError::UnknownPeer(peer_id.to_string()))?;
        self.node.peers.write().insert(peer_id.to_string(), found);
        Ok(())
    }

    async fn send(
        &self,
        ctx: &RunContext,
        peer_id: &str,
        payload: &[u8],
    ) -> Result<(), TransportError> {
        if self.is_closed() {
            return Err(TransportError::Closed);
        }
        if ctx.is_cancelled() {
            return Err(ContextError::Cancelled.into());
        }

        let peer = self
            .node
            .peers
            .read()
            .get(peer_id)
            .and_then(Weak::upgrade)
            .ok_or_else(|| TransportError::UnknownPeer(peer_id.to_string()))?;
        if peer.closed.load(Ordering::SeqCst) {
            uv_telemetry::SEND_FAILURES.inc();
            return Err(TransportError::Dial {
                peer: peer_id.to_string(),
                reason: "peer closed".to_string(),
            });
        }
        let handler = peer
            .handler
            .read()
            .clone()
            .ok_or_else(|| TransportError::NoHandler(peer_id.to_string()))?;

        let sender = self.node.id.clone();
        let payload = payload.to_vec();
        tokio::task::spawn_blocking(move || handler(sender, payload));
        uv_telemetry::FRAMES_SENT.inc();
        debug!(from = %self.node.id, to = %peer_id, "[uv-01] mock frame delivered");
        Ok(())
    }

    async fn close(&self) -> Result<(), TransportError> {
        if self.node.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        if let Some(network) = &self.node.network {
            network.nodes.write().remove(&self.node.id);
        }
        Ok(())
    }
}
