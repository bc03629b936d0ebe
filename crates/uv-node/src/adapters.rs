//! # Standalone Adapters
//!
//! Stand-ins for the upstream integrations (chain registry queries, RPC
//! chain clients) so the node runs from its config file alone.

use async_trait::async_trait;
use shared_types::{ChainClient, ChainClientError, ChainConfig, OutboundTxBuilder, VmType};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

use uv_02_chain_sync::{ChainClientFactory, ChainConfigSource, ChainSyncError};

/// Chain configs read from the node config.
pub struct StaticChainSource {
    configs: Vec<ChainConfig>,
}

impl StaticChainSource {
    /// Source always answering `configs`.
    pub fn new(configs: Vec<ChainConfig>) -> Self {
        Self { configs }
    }
}

#[async_trait]
impl ChainConfigSource for StaticChainSource {
    async fn get_all_chain_configs(&self) -> Result<Vec<ChainConfig>, ChainSyncError> {
        Ok(self.configs.clone())
    }
}

/// A client that tracks lifecycle only. It has no RPC connection and no
/// outbound builder, so the broadcaster leaves its events `SIGNED`.
pub struct PassiveChainClient {
    config: ChainConfig,
    running: AtomicBool,
}

impl PassiveChainClient {
    /// Idle client for `config`.
    pub fn new(config: ChainConfig) -> Self {
        Self {
            config,
            running: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl ChainClient for PassiveChainClient {
    fn config(&self) -> &ChainConfig {
        &self.config
    }

    async fn start(&self) -> Result<(), ChainClientError> {
        self.running.store(true, Ordering::SeqCst);
        info!(chain = %self.config.chain, vm = %self.config.vm_type, "[uv-node] passive chain client started");
        Ok(())
    }

    async fn stop(&self) -> Result<(), ChainClientError> {
        self.running.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_healthy(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn tx_builder(&self) -> Result<Arc<dyn OutboundTxBuilder>, ChainClientError> {
        Err(ChainClientError::TxBuilderUnsupported(
            self.config.chain.clone(),
        ))
    }
}

/// Builds [`PassiveChainClient`]s for EVM and SVM chains.
#[derive(Default)]
pub struct PassiveClientFactory;

#[async_trait]
impl ChainClientFactory for PassiveClientFactory {
    async fn create_client(
        &self,
        config: &ChainConfig,
    ) -> Result<Arc<dyn ChainClient>, ChainClientError> {
        match config.vm_type {
            VmType::Evm | VmType::Svm => Ok(Arc::new(PassiveChainClient::new(config.clone()))),
            other => Err(ChainClientError::UnsupportedVm(other)),
        }
    }
}
