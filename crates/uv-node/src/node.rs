//! # Node Wiring
//!
//! Owns one instance of every subsystem and the run context their
//! background loops share.

use anyhow::{Context, Result};
use shared_types::{RunContext, RunHandle};
use std::sync::Arc;
use tracing::{debug, info, warn};

use uv_01_transport::{Libp2pTransport, MessageHandler, Transport};
use uv_02_chain_sync::{
    ChainCache, ChainCacheJob, ChainClientFactory, ChainConfigSource, ChainRegistry,
    ChainRegistryJob,
};
use uv_03_coordinator::{StaticValidatorSet, UvManager, ValidatorSetSource};
use uv_04_tx_broadcaster::{EventStore, InMemoryEventStore, StaticTssAddress, TxBroadcaster};
use uv_05_state_sync::{ReqwestFetcher, TrustPoint, TrustProvider};

use crate::adapters::{PassiveClientFactory, StaticChainSource};
use crate::config::NodeConfig;

/// Upstream integrations the node is built on.
pub struct NodeDependencies {
    /// Chain config source for the cache job.
    pub chain_source: Arc<dyn ChainConfigSource>,
    /// Validator set source for the UV manager.
    pub validator_source: Arc<dyn ValidatorSetSource>,
    /// Chain client factory for the registry.
    pub client_factory: Arc<dyn ChainClientFactory>,
    /// Event store for the broadcaster.
    pub event_store: Arc<dyn EventStore>,
    /// Transport; a libp2p transport is built from config when `None`.
    pub transport: Option<Arc<dyn Transport>>,
}

impl NodeDependencies {
    /// Static sources and passive clients taken from `config`, with the
    /// event store opened at `event_store_path` when one is configured.
    pub fn from_config(config: &NodeConfig) -> Result<Self> {
        Ok(Self {
            chain_source: Arc::new(StaticChainSource::new(config.chains.clone())),
            validator_source: Arc::new(StaticValidatorSet::new(config.validators.clone())),
            client_factory: Arc::new(PassiveClientFactory),
            event_store: open_event_store(config)?,
            transport: None,
        })
    }
}

#[cfg(feature = "rocksdb")]
fn open_event_store(config: &NodeConfig) -> Result<Arc<dyn EventStore>> {
    use uv_04_tx_broadcaster::{RocksDbEventStore, RocksDbEventStoreConfig};

    let Some(path) = &config.event_store_path else {
        return Ok(Arc::new(InMemoryEventStore::new()));
    };
    let store = RocksDbEventStore::open(RocksDbEventStoreConfig {
        path: path.clone(),
        ..Default::default()
    })
    .with_context(|| format!("failed to open event store at {}", path.display()))?;
    info!(path = %path.display(), "[uv-node] persistent event store opened");
    Ok(Arc::new(store))
}

#[cfg(not(feature = "rocksdb"))]
fn open_event_store(config: &NodeConfig) -> Result<Arc<dyn EventStore>> {
    if let Some(path) = &config.event_store_path {
        anyhow::bail!(
            "event_store_path {} requires the rocksdb feature",
            path.display()
        );
    }
    Ok(Arc::new(InMemoryEventStore::new()))
}

/// A wired Universal Validator.
pub struct UniversalValidatorNode {
    config: NodeConfig,
    transport: Arc<dyn Transport>,
    cache: Arc<ChainCache>,
    cache_job: ChainCacheJob,
    registry: Arc<ChainRegistry>,
    registry_job: ChainRegistryJob,
    uv_manager: Arc<UvManager>,
    event_store: Arc<dyn EventStore>,
    broadcaster: Arc<TxBroadcaster>,
    run: RunHandle,
    ctx: RunContext,
}

impl UniversalValidatorNode {
    /// Build with the standalone dependencies from [`NodeDependencies::from_config`].
    pub async fn build(config: NodeConfig) -> Result<Self> {
        let deps = NodeDependencies::from_config(&config)?;
        Self::with_dependencies(config, deps).await
    }

    /// Build every subsystem. Nothing runs until [`start`](Self::start).
    pub async fn with_dependencies(config: NodeConfig, deps: NodeDependencies) -> Result<Self> {
        config.validate().context("invalid node configuration")?;

        let transport: Arc<dyn Transport> = match deps.transport {
            Some(transport) => transport,
            None => Arc::new(
                Libp2pTransport::new(config.transport.clone())
                    .await
                    .context("failed to start libp2p transport")?,
            ),
        };

        let cache = Arc::new(ChainCache::new());
        let cache_job =
            ChainCacheJob::new(cache.clone(), deps.chain_source, config.cache_job.clone());

        let registry = Arc::new(ChainRegistry::new(deps.client_factory));
        let registry_job =
            ChainRegistryJob::new(cache.clone(), registry.clone(), config.registry_job.clone());

        let uv_manager = Arc::new(
            UvManager::new(config.coordinator.clone(), deps.validator_source)
                .context("failed to create UV manager")?,
        );

        let broadcaster = Arc::new(
            TxBroadcaster::new(
                deps.event_store.clone(),
                registry.clone(),
                Arc::new(StaticTssAddress(config.tss_address.clone())),
                config.broadcaster.clone(),
            )
            .context("failed to create tx broadcaster")?,
        );

        let (run, ctx) = RunContext::new();
        Ok(Self {
            config,
            transport,
            cache,
            cache_job,
            registry,
            registry_job,
            uv_manager,
            event_store: deps.event_store,
            broadcaster,
            run,
            ctx,
        })
    }

    /// Register peers, start every background loop and, when configured,
    /// compute a state-sync trust point.
    pub async fn start(&self) -> Result<()> {
        info!("===========================================");
        info!("  Universal Validator v{}", env!("CARGO_PKG_VERSION"));
        info!("===========================================");

        let handler: MessageHandler = Arc::new(|from: String, payload: Vec<u8>| {
            debug!(peer = %from, len = payload.len(), "[uv-node] frame received");
        });
        self.transport
            .register_handler(handler)
            .context("failed to register transport handler")?;

        for peer in &self.config.peers {
            if let Err(e) = self.transport.ensure_peer(&peer.peer_id, &peer.addrs) {
                warn!(peer = %peer.peer_id, error = %e, "[uv-node] skipping configured peer");
            }
        }

        self.cache_job
            .start(self.ctx.clone())
            .context("failed to start chain cache job")?;
        self.registry_job
            .start(self.ctx.clone())
            .context("failed to start chain registry job")?;
        self.uv_manager.start(self.ctx.clone());
        self.broadcaster.start(self.ctx.clone());

        info!(
            peer_id = %self.transport.id(),
            addrs = ?self.transport.listen_addrs(),
            validator = %self.uv_manager.my_validator_address(),
            "[uv-node] all subsystems running"
        );

        if let Some(rpc) = &self.config.state_sync_rpc {
            match self.compute_trust_point(rpc).await {
                Ok(point) => {
                    info!(height = point.height, hash = %point.hash, "[uv-node] state-sync trust point")
                }
                Err(e) => warn!(error = %e, "[uv-node] state-sync trust point unavailable"),
            }
        }
        Ok(())
    }

    async fn compute_trust_point(&self, rpc: &str) -> Result<TrustPoint> {
        let fetcher = ReqwestFetcher::new(self.config.state_sync.request_timeout())?;
        let provider = TrustProvider::new(Arc::new(fetcher), self.config.state_sync.clone())?;
        Ok(provider.compute_trust(&self.ctx, rpc).await?)
    }

    /// Cancel, wait for every loop, stop chain clients, close the transport.
    pub async fn shutdown(&self) {
        info!("[uv-node] shutting down");
        self.run.cancel();

        self.broadcaster.stop().await;
        self.uv_manager.stop().await;
        self.registry_job.stop().await;
        self.cache_job.stop().await;
        self.registry.stop_all().await;

        if let Err(e) = self.transport.close().await {
            warn!(error = %e, "[uv-node] transport close failed");
        }
        info!("[uv-node] shutdown complete");
    }

    /// The transport.
    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// The chain cache.
    pub fn cache(&self) -> &Arc<ChainCache> {
        &self.cache
    }

    /// The live chain registry.
    pub fn registry(&self) -> &Arc<ChainRegistry> {
        &self.registry
    }

    /// The UV manager.
    pub fn uv_manager(&self) -> &Arc<UvManager> {
        &self.uv_manager
    }

    /// The broadcaster's event store.
    pub fn event_store(&self) -> &Arc<dyn EventStore> {
        &self.event_store
    }

    /// The broadcaster.
    pub fn broadcaster(&self) -> &Arc<TxBroadcaster> {
        &self.broadcaster
    }
}
