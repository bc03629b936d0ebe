//! # Outbound Ports
//!
//! Traits for the upstream chain-config source, the per-chain client
//! factory and the registry the reconciliation job drives.

use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::{
    ChainClient, ChainClientError, ChainConfig, MockChainClient, MockTxBuilder, VmType,
};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::domain::ChainSyncError;

/// Upstream source of chain configs (the on-chain chain registry query).
#[async_trait]
pub trait ChainConfigSource: Send + Sync {
    /// Every chain config currently published.
    async fn get_all_chain_configs(&self) -> Result<Vec<ChainConfig>, ChainSyncError>;
}

/// Builds a live client for a chain config.
#[async_trait]
pub trait ChainClientFactory: Send + Sync {
    /// Create (but do not start) a client for `config`.
    async fn create_client(
        &self,
        config: &ChainConfig,
    ) -> Result<Arc<dyn ChainClient>, ChainClientError>;
}

/// Registry of live chain clients, driven by the reconciliation job.
#[async_trait]
pub trait ChainClientRegistry: Send + Sync {
    /// Add a client for `config`, or replace the existing one if its config changed.
    async fn add_or_update_chain(&self, config: &ChainConfig) -> Result<(), ChainSyncError>;

    /// Stop and drop the client for `chain_id`. Unknown ids are ignored.
    async fn remove_chain(&self, chain_id: &str);

    /// Every live client keyed by chain id.
    fn get_all_chains(&self) -> HashMap<String, Arc<dyn ChainClient>>;

    /// The client for `chain_id`.
    fn get_client(&self, chain_id: &str) -> Result<Arc<dyn ChainClient>, ChainClientError>;
}

// =============================================================================
// Mock Implementations for Testing
// =============================================================================

/// Mock chain config source.
///
/// Scripted results are consumed first, then the standing config list is
/// returned on every call.
#[derive(Default)]
pub struct MockChainConfigSource {
    configs: Mutex<Vec<ChainConfig>>,
    scripted: Mutex<VecDeque<Result<Vec<ChainConfig>, String>>>,
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl MockChainConfigSource {
    /// Source returning `configs` on every call.
    pub fn new(configs: Vec<ChainConfig>) -> Self {
        Self {
            configs: Mutex::new(configs),
            ..Default::default()
        }
    }

    /// Sleep before answering (for timeout tests).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Replace the standing config list.
    pub fn set_configs(&self, configs: Vec<ChainConfig>) {
        *self.configs.lock() = configs;
    }

    /// Queue a one-shot failure.
    pub fn push_failure(&self, message: &str) {
        self.scripted.lock().push_back(Err(message.to_string()));
    }

    /// Queue a one-shot result.
    pub fn push_result(&self, configs: Vec<ChainConfig>) {
        self.scripted.lock().push_back(Ok(configs));
    }

    /// Number of calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChainConfigSource for MockChainConfigSource {
    async fn get_all_chain_configs(&self) -> Result<Vec<ChainConfig>, ChainSyncError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let scripted = self.scripted.lock().pop_front();
        match scripted {
            Some(Ok(configs)) => Ok(configs),
            Some(Err(msg)) => Err(ChainSyncError::Source(msg)),
            None => Ok(self.configs.lock().clone()),
        }
    }
}

/// Mock client factory producing [`MockChainClient`]s.
///
/// Each chain id shares one [`MockTxBuilder`] across client rebuilds so
/// tests can script nonces before the client exists.
#[derive(Default)]
pub struct MockChainClientFactory {
    builders: Mutex<HashMap<String, Arc<MockTxBuilder>>>,
    created: Mutex<Vec<Arc<MockChainClient>>>,
    failing: Mutex<HashSet<String>>,
}

impl MockChainClientFactory {
    /// Empty factory.
    pub fn new() -> Self {
        Self::default()
    }

    /// The tx builder used by clients of `chain_id`.
    pub fn builder(&self, chain_id: &str) -> Arc<MockTxBuilder> {
        self.builders
            .lock()
            .entry(chain_id.to_string())
            .or_default()
            .clone()
    }

    /// Make client creation for `chain_id` fail.
    pub fn fail_for(&self, chain_id: &str) {
        self.failing.lock().insert(chain_id.to_string());
    }

    /// Every client created for `chain_id`, oldest first.
    pub fn clients_for(&self, chain_id: &str) -> Vec<Arc<MockChainClient>> {
        self.created
            .lock()
            .iter()
            .filter(|c| c.config().chain == chain_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl ChainClientFactory for MockChainClientFactory {
    async fn create_client(
        &self,
        config: &ChainConfig,
    ) -> Result<Arc<dyn ChainClient>, ChainClientError> {
        if self.failing.lock().contains(&config.chain) {
            return Err(ChainClientError::Lifecycle(format!(
                "mock factory refuses {}",
                config.chain
            )));
        }
        match config.vm_type {
            VmType::Evm | VmType::Svm => {}
            VmType::Unspecified => return Err(ChainClientError::UnsupportedVm(config.vm_type)),
        }

        let client = Arc::new(MockChainClient::with_builder(
            config.clone(),
            self.builder(&config.chain),
        ));
        self.created.lock().push(client.clone());
        Ok(client)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_source_scripted_then_standing() {
        let source = MockChainConfigSource::new(vec![ChainConfig::new("a", VmType::Evm)]);
        source.push_failure("boom");

        assert!(source.get_all_chain_configs().await.is_err());
        assert_eq!(source.get_all_chain_configs().await.unwrap().len(), 1);
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_mock_factory_rejects_unspecified_vm() {
        let factory = MockChainClientFactory::new();
        let res = factory
            .create_client(&ChainConfig::new("x", VmType::Unspecified))
            .await;
        assert!(matches!(res, Err(ChainClientError::UnsupportedVm(_))));
    }

    #[tokio::test]
    async fn test_mock_factory_shares_builder_per_chain() {
        let factory = MockChainClientFactory::new();
        factory.builder("a").set_nonce(9);
        let client = factory
            .create_client(&ChainConfig::new("a", VmType::Evm))
            .await
            .unwrap();
        let builder = client.tx_builder().unwrap();
        assert_eq!(builder.get_next_nonce("tss", true).await.unwrap(), 9);
    }
}
