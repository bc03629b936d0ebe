//! Swarm event loop.
//!
//! The swarm is owned by one task. Callers talk to it through [`Command`]s;
//! dial results come back on oneshot channels once the connection is
//! established or fails.

use futures::StreamExt;
use libp2p::swarm::dial_opts::{DialOpts, PeerCondition};
use libp2p::swarm::{DialError, NetworkBehaviour, SwarmEvent};
use libp2p::{Multiaddr, PeerId, Swarm};
use parking_lot::RwLock;
use shared_types::RunContext;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, warn};

type BehaviourEvent = <libp2p_stream::Behaviour as NetworkBehaviour>::ToSwarm;

/// Dial outcome; the error carries the swarm's message.
pub(crate) type DialReply = oneshot::Sender<Result<(), String>>;

/// Requests handled on the swarm task.
pub(crate) enum Command {
    /// Teach the swarm another way to reach `peer`.
    AddAddresses {
        peer: PeerId,
        addrs: Vec<Multiaddr>,
    },
    /// Connect to `peer` unless already connected.
    Dial {
        peer: PeerId,
        addrs: Vec<Multiaddr>,
        reply: DialReply,
    },
}

pub(crate) struct SwarmLoop {
    pub(crate) swarm: Swarm<libp2p_stream::Behaviour>,
    pub(crate) commands: mpsc::UnboundedReceiver<Command>,
    pub(crate) listen_addrs: Arc<RwLock<Vec<Multiaddr>>>,
    pub(crate) listening: watch::Sender<usize>,
    pub(crate) pending_dials: HashMap<PeerId, Vec<DialReply>>,
}

impl SwarmLoop {
    pub(crate) async fn run(mut self, stop: RunContext) {
        loop {
            tokio::select! {
                _ = stop.cancelled() => break,
                command = self.commands.recv() => match command {
                    Some(command) => self.on_command(command),
                    None => break,
                },
                event = self.swarm.select_next_some() => self.on_event(event),
            }
        }

        for (_, waiters) in self.pending_dials.drain() {
            for waiter in waiters {
                let _ = waiter.send(Err("transport closed".to_string()));
            }
        }
        debug!("[uv-01] swarm loop exited");
    }

    fn on_command(&mut self, command: Command) {
        match command {
            Command::AddAddresses { peer, addrs } => {
                for addr in addrs {
                    self.swarm.add_peer_address(peer, addr);
                }
            }
            Command::Dial { peer, addrs, reply } => {
                if self.swarm.is_connected(&peer) {
                    let _ = reply.send(Ok(()));
                    return;
                }
                let opts = DialOpts::peer_id(peer)
                    .addresses(addrs)
                    .condition(PeerCondition::DisconnectedAndNotDialing)
                    .build();
                match self.swarm.dial(opts) {
                    // A dial already in flight resolves every waiter.
                    Ok(()) | Err(DialError::DialPeerConditionFalse(_)) => {
                        self.pending_dials.entry(peer).or_default().push(reply);
                    }
                    Err(e) => {
                        let _ = reply.send(Err(e.to_string()));
                    }
                }
            }
        }
    }

    fn on_event(&mut self, event: SwarmEvent<BehaviourEvent>) {
        match event {
            SwarmEvent::NewListenAddr { address, .. } => {
                info!(addr = %address, "[uv-01] listening");
                let count = {
                    let mut addrs = self.listen_addrs.write();
                    addrs.push(address);
                    addrs.len()
                };
                self.listening.send_replace(count);
            }
            SwarmEvent::ExpiredListenAddr { address, .. } => {
                let count = {
                    let mut addrs = self.listen_addrs.write();
                    addrs.retain(|a| a != &address);
                    addrs.len()
                };
                self.listening.send_replace(count);
            }
            SwarmEvent::ConnectionEstablished { peer_id, .. } => {
                debug!(peer = %peer_id, "[uv-01] connection established");
                self.resolve(peer_id, Ok(()));
            }
            SwarmEvent::OutgoingConnectionError {
                peer_id: Some(peer_id),
                error,
                ..
            } => {
                debug!(peer = %peer_id, error = %error, "[uv-01] outgoing connection failed");
                self.resolve(peer_id, Err(error.to_string()));
            }
            SwarmEvent::ConnectionClosed { peer_id, cause, .. } => {
                debug!(peer = %peer_id, cause = ?cause, "[uv-01] connection closed");
            }
            SwarmEvent::ListenerError { error, .. } => {
                warn!(error = %error, "[uv-01] listener error");
            }
            _ => {}
        }
    }

    fn resolve(&mut self, peer: PeerId, result: Result<(), String>) {
        if let Some(waiters) = self.pending_dials.remove(&peer) {
            for waiter in waiters {
                let _ = waiter.send(result.clone());
            }
        }
    }
}
