//! # libp2p Transport
//!
//! TCP + Noise + Yamux. Each message travels on its own stream opened with
//! the configured protocol id: the sender writes one frame and closes, the
//! receiver reads one frame and hands it to the registered handler.

mod swarm;

use async_trait::async_trait;
use futures::{AsyncWriteExt, StreamExt};
use libp2p::multiaddr::Protocol;
use libp2p::{noise, tcp, yamux, Multiaddr, PeerId, StreamProtocol, SwarmBuilder};
use parking_lot::{Mutex, RwLock};
use shared_types::{ContextError, RunContext, RunHandle};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use self::swarm::{Command, SwarmLoop};
use super::codec::{read_frame, write_frame};
use super::identity::load_keypair;
use crate::config::TransportConfig;
use crate::domain::{is_unspecified, normalize_addrs, TransportError};
use crate::ports::{MessageHandler, Transport};

const IDLE_CONNECTION_TIMEOUT: Duration = Duration::from_secs(60);
const LISTEN_WAIT: Duration = Duration::from_secs(5);

/// libp2p-backed [`Transport`].
pub struct Libp2pTransport {
    local_peer_id: PeerId,
    config: TransportConfig,
    protocol: StreamProtocol,
    control: libp2p_stream::Control,
    commands: mpsc::UnboundedSender<Command>,
    peers: RwLock<HashMap<PeerId, Vec<Multiaddr>>>,
    handler: Arc<RwLock<Option<MessageHandler>>>,
    listen_addrs: Arc<RwLock<Vec<Multiaddr>>>,
    stop: RunHandle,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    closed: AtomicBool,
}

impl Libp2pTransport {
    /// Build the swarm, start listening and spawn the swarm and accept
    /// tasks. Returns once at least one listen address is bound.
    pub async fn new(config: TransportConfig) -> Result<Self, TransportError> {
        config.validate()?;
        let keypair = load_keypair(config.private_key_base64.as_deref())?;
        let local_peer_id = keypair.public().to_peer_id();
        let protocol = StreamProtocol::try_from_owned(config.protocol_id.clone())
            .map_err(|e| TransportError::InvalidConfig(e.to_string()))?;

        let mut swarm = SwarmBuilder::with_existing_identity(keypair)
            .with_tokio()
            .with_tcp(
                tcp::Config::default(),
                noise::Config::new,
                yamux::Config::default,
            )
            .map_err(|e| TransportError::Init(e.to_string()))?
            .with_behaviour(|_| libp2p_stream::Behaviour::new())
            .map_err(|e| TransportError::Init(e.to_string()))?
            .with_swarm_config(|c| c.with_idle_connection_timeout(IDLE_CONNECTION_TIMEOUT))
            .build();

        for addr in &config.listen_addrs {
            let maddr: Multiaddr =
                addr.parse()
                    .map_err(|e: libp2p::multiaddr::Error| TransportError::InvalidMultiaddr {
                        addr: addr.clone(),
                        reason: e.to_string(),
                    })?;
            swarm
                .listen_on(maddr)
                .map_err(|e| TransportError::Init(format!("listen on {}: {}", addr, e)))?;
        }

        let control = swarm.behaviour().new_control();
        let incoming = control
            .clone()
            .accept(protocol.clone())
            .map_err(|e| TransportError::Init(e.to_string()))?;

        let (stop, stop_ctx) = RunContext::new();
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (listening_tx, mut listening_rx) = watch::channel(0usize);
        let listen_addrs = Arc::new(RwLock::new(Vec::new()));
        let handler: Arc<RwLock<Option<MessageHandler>>> = Arc::new(RwLock::new(None));

        let swarm_task = tokio::spawn(
            SwarmLoop {
                swarm,
                commands: command_rx,
                listen_addrs: listen_addrs.clone(),
                listening: listening_tx,
                pending_dials: HashMap::new(),
            }
            .run(stop_ctx.clone()),
        );
        let accept_task = tokio::spawn(accept_loop(
            incoming,
            handler.clone(),
            config.io_timeout(),
            stop_ctx,
        ));

        let transport = Self {
            local_peer_id,
            protocol,
            control,
            commands: command_tx,
            peers: RwLock::new(HashMap::new()),
            handler,
            listen_addrs,
            stop,
            tasks: Mutex::new(vec![swarm_task, accept_task]),
            closed: AtomicBool::new(false),
            config,
        };

        match tokio::time::timeout(LISTEN_WAIT, listening_rx.wait_for(|n| *n > 0)).await {
            Ok(Ok(_)) => {}
            _ => {
                let _ = transport.close().await;
                return Err(TransportError::Init(
                    "no listen address bound".to_string(),
                ));
            }
        }

        info!(
            peer_id = %transport.local_peer_id,
            protocol = %transport.protocol,
            "[uv-01] libp2p transport started"
        );
        Ok(transport)
    }

    /// Local peer id.
    pub fn peer_id(&self) -> PeerId {
        self.local_peer_id
    }

    async fn deliver(
        &self,
        ctx: &RunContext,
        peer: PeerId,
        addrs: Vec<Multiaddr>,
        payload: &[u8],
    ) -> Result<(), TransportError> {
        let dial_timeout = self.config.dial_timeout();

        let (reply, dialed) = oneshot::channel();
        self.commands
            .send(Command::Dial { peer, addrs, reply })
            .map_err(|_| TransportError::Closed)?;
        match ctx.run(dial_timeout, dialed).await {
            Ok(Ok(Ok(()))) => {}
            Ok(Ok(Err(reason))) => {
                return Err(TransportError::Dial {
                    peer: peer.to_string(),
                    reason,
                })
            }
            Ok(Err(_)) => return Err(TransportError::Closed),
            Err(ContextError::DeadlineExceeded) => {
                return Err(TransportError::DialTimeout(peer.to_string()))
            }
            Err(e) => return Err(e.into()),
        }

        let mut control = self.control.clone();
        let mut stream = ctx
            .run(dial_timeout, control.open_stream(peer, self.protocol.clone()))
            .await?
            .map_err(|e| TransportError::Stream {
                peer: peer.to_string(),
                reason: e.to_string(),
            })?;

        ctx.run(self.config.io_timeout(), async {
            write_frame(&mut stream, payload).await?;
            stream.close().await?;
            Ok::<(), TransportError>(())
        })
        .await?
    }
}

#[async_trait]
impl Transport for Libp2pTransport {
    fn id(&self) -> String {
        self.local_peer_id.to_string()
    }

    fn listen_addrs(&self) -> Vec<String> {
        let addrs = self.listen_addrs.read().clone();
        let with_id =
            |a: &Multiaddr| a.clone().with(Protocol::P2p(self.local_peer_id)).to_string();
        let routable: Vec<String> = addrs
            .iter()
            .filter(|a| !is_unspecified(a))
            .map(with_id)
            .collect();
        if routable.is_empty() {
            addrs.iter().map(with_id).collect()
        } else {
            routable
        }
    }

    fn register_handler(&self, handler: MessageHandler) -> Result<(), TransportError> {
        let mut slot = self.handler.write();
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
        let peer: PeerId = peer_id
            .parse()
            .map_err(|_| TransportError::InvalidPeerId(peer_id.to_string()))?;
        let addrs = normalize_addrs(addrs, &peer)?;

        self.peers.write().insert(peer, addrs.clone());
        let _ = self.commands.send(Command::AddAddresses { peer, addrs });
        Ok(())
    }

    async fn send(
        &self,
        ctx: &RunContext,
        peer_id: &str,
        payload: &[u8],
    ) -> Result<(), TransportError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(TransportError::Closed);
        }
        let peer: PeerId = peer_id
            .parse()
            .map_err(|_| TransportError::InvalidPeerId(peer_id.to_string()))?;
        let addrs = self
            .peers
            .read()
            .get(&peer)
            .cloned()
            .ok_or_else(|| TransportError::UnknownPeer(peer_id.to_string()))?;

        let result = self.deliver(ctx, peer, addrs, payload).await;
        match &result {
            Ok(()) => uv_telemetry::FRAMES_SENT.inc(),
            Err(e) => {
                uv_telemetry::SEND_FAILURES.inc();
                debug!(peer = %peer, error = %e, "[uv-01] send failed");
            }
        }
        result
    }

    async fn close(&self) -> Result<(), TransportError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.stop.cancel();
        let tasks = std::mem::take(&mut *self.tasks.lock());
        for task in tasks {
            let _ = task.await;
        }
        info!(peer_id = %self.local_peer_id, "[uv-01] libp2p transport closed");
        Ok(())
    }
}

async fn accept_loop(
    mut incoming: libp2p_stream::IncomingStreams,
    handler: Arc<RwLock<Option<MessageHandler>>>,
    io_timeout: Duration,
    stop: RunContext,
) {
    loop {
        let (peer, mut stream) = tokio::select! {
            _ = stop.cancelled() => return,
            next = incoming.next() => match next {
                Some(next) => next,
                None => return,
            },
        };

        let handler = handler.clone();
        let stop = stop.clone();
        tokio::spawn(async move {
            let payload = match stop.run(io_timeout, read_frame(&mut stream)).await {
                Ok(Ok(payload)) => payload,
                Ok(Err(e)) => {
                    warn!(peer = %peer, error = %e, "[uv-01] failed to read frame");
                    return;
                }
                Err(e) => {
                    warn!(peer = %peer, error = %e, "[uv-01] frame read interrupted");
                    return;
                }
            };
            let _ = stream.close().await;
            uv_telemetry::FRAMES_RECEIVED.inc();

            let current = handler.read().clone();
            match current {
                Some(handler) => {
                    let sender = peer.to_string();
                    tokio::task::spawn_blocking(move || handler(sender, payload));
                }
                None => debug!(peer = %peer, "[uv-01] no handler registered, dropping frame"),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::identity::generate_private_key_base64;

    #[tokio::test]
    async fn test_listen_addrs_carry_peer_id() {
        let transport = Libp2pTransport::new(TransportConfig::for_testing())
            .await
            .unwrap();
        let addrs = transport.listen_addrs();
        assert!(!addrs.is_empty());
        let suffix = format!("/p2p/{}", transport.id());
        assert!(addrs.iter().all(|a| a.ends_with(&suffix)));
        assert!(addrs.iter().all(|a| a.starts_with("/ip4/127.0.0.1/tcp/")));
        transport.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_unspecified_listener_falls_back() {
        let config = TransportConfig {
            listen_addrs: vec!["/ip4/0.0.0.0/tcp/0".to_string()],
            ..TransportConfig::for_testing()
        };
        let transport = Libp2pTransport::new(config).await.unwrap();
        // The wildcard listener expands to concrete interfaces; either way
        // at least one address is advertised.
        assert!(!transport.listen_addrs().is_empty());
        transport.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_configured_key_fixes_identity() {
        let key = generate_private_key_base64().unwrap();
        let config = TransportConfig {
            private_key_base64: Some(key.clone()),
            ..TransportConfig::for_testing()
        };
        let a = Libp2pTransport::new(config.clone()).await.unwrap();
        let id = a.id();
        a.close().await.unwrap();

        let b = Libp2pTransport::new(config).await.unwrap();
        assert_eq!(b.id(), id);
        b.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_handler_registers_once() {
        let transport = Libp2pTransport::new(TransportConfig::for_testing())
            .await
            .unwrap();
        let handler: MessageHandler = Arc::new(|_, _| {});
        transport.register_handler(handler.clone()).unwrap();
        assert_eq!(
            transport.register_handler(handler),
            Err(TransportError::HandlerAlreadyRegistered)
        );
        transport.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_ensure_peer_validation() {
        let transport = Libp2pTransport::new(TransportConfig::for_testing())
            .await
            .unwrap();
        let other = PeerId::random().to_string();

        assert_eq!(
            transport.ensure_peer("", &["/ip4/127.0.0.1/tcp/1".to_string()]),
            Err(TransportError::InvalidPeerInfo)
        );
        assert_eq!(
            transport.ensure_peer(&other, &[]),
            Err(TransportError::InvalidPeerInfo)
        );
        assert!(matches!(
            transport.ensure_peer("not-a-peer", &["/ip4/127.0.0.1/tcp/1".to_string()]),
            Err(TransportError::InvalidPeerId(_))
        ));
        assert!(transport
            .ensure_peer(&other, &["/ip4/127.0.0.1/tcp/1".to_string()])
            .is_ok());
        transport.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_send_to_unknown_peer() {
        let transport = Libp2pTransport::new(TransportConfig::for_testing())
            .await
            .unwrap();
        let peer = PeerId::random().to_string();
        let err = transport
            .send(&RunContext::background(), &peer, b"hi")
            .await
            .unwrap_err();
        assert_eq!(err, TransportError::UnknownPeer(peer));
        transport.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let transport = Libp2pTransport::new(TransportConfig::for_testing())
            .await
            .unwrap();
        transport.close().await.unwrap();
        transport.close().await.unwrap();
        let peer = PeerId::random().to_string();
        assert_eq!(
            transport
                .send(&RunContext::background(), &peer, b"hi")
                .await,
            Err(TransportError::Closed)
        );
    }
}
