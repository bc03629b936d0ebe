//! # Chain Registry
//!
//! Live per-chain clients keyed by chain id. Clients are created through a
//! [`ChainClientFactory`], started on insertion and stopped on removal or
//! replacement. Mutations are serialized; lookups only take the read lock.

use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{ChainClient, ChainClientError, ChainClientLookup, ChainConfig};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::domain::ChainSyncError;
use crate::ports::{ChainClientFactory, ChainClientRegistry};

/// Registry of live chain clients.
pub struct ChainRegistry {
    factory: Arc<dyn ChainClientFactory>,
    chains: RwLock<HashMap<String, Arc<dyn ChainClient>>>,
    update_lock: tokio::sync::Mutex<()>,
}

impl ChainRegistry {
    /// Empty registry building clients with `factory`.
    pub fn new(factory: Arc<dyn ChainClientFactory>) -> Self {
        Self {
            factory,
            chains: RwLock::new(HashMap::new()),
            update_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Registered chain ids.
    pub fn chain_ids(&self) -> Vec<String> {
        self.chains.read().keys().cloned().collect()
    }

    /// Number of live clients.
    pub fn len(&self) -> usize {
        self.chains.read().len()
    }

    /// True when no client is registered.
    pub fn is_empty(&self) -> bool {
        self.chains.read().is_empty()
    }

    /// Stop and drop every client.
    pub async fn stop_all(&self) {
        let _guard = self.update_lock.lock().await;
        let drained: Vec<(String, Arc<dyn ChainClient>)> = self.chains.write().drain().collect();
        for (chain_id, client) in drained {
            stop_client(&chain_id, client.as_ref()).await;
        }
        uv_telemetry::REGISTERED_CHAINS.set(0.0);
    }

    fn publish_size(&self) {
        uv_telemetry::REGISTERED_CHAINS.set(self.len() as f64);
    }
}

async fn stop_client(chain_id: &str, client: &dyn ChainClient) {
    if let Err(e) = client.stop().await {
        error!(chain = %chain_id, error = %e, "[uv-02] failed to stop chain client");
    }
}

#[async_trait]
impl ChainClientRegistry for ChainRegistry {
    async fn add_or_update_chain(&self, config: &ChainConfig) -> Result<(), ChainSyncError> {
        if config.chain.is_empty() {
            return Err(ChainClientError::InvalidConfig("empty chain id".to_string()).into());
        }
        let chain_id = config.chain.clone();
        let _guard = self.update_lock.lock().await;

        let existing = self.chains.read().get(&chain_id).cloned();
        if let Some(existing) = existing {
            if existing.config().is_equivalent(config) {
                debug!(chain = %chain_id, "[uv-02] chain config unchanged, skipping update");
                return Ok(());
            }
            info!(chain = %chain_id, "[uv-02] stopping existing chain client for update");
            stop_client(&chain_id, existing.as_ref()).await;
            self.chains.write().remove(&chain_id);
            self.publish_size();
        }

        let client = self.factory.create_client(config).await?;
        client.start().await?;

        self.chains.write().insert(chain_id.clone(), client);
        self.publish_size();
        info!(chain = %chain_id, vm = %config.vm_type, "[uv-02] chain client registered");
        Ok(())
    }

    async fn remove_chain(&self, chain_id: &str) {
        let _guard = self.update_lock.lock().await;
        let removed = self.chains.write().remove(chain_id);
        if let Some(client) = removed {
            info!(chain = %chain_id, "[uv-02] removing chain client");
            stop_client(chain_id, client.as_ref()).await;
            self.publish_size();
        }
    }

    fn get_all_chains(&self) -> HashMap<String, Arc<dyn ChainClient>> {
        self.chains.read().clone()
    }

    fn get_client(&self, chain_id: &str) -> Result<Arc<dyn ChainClient>, ChainClientError> {
        self.chains
            .read()
            .get(chain_id)
            .cloned()
            .ok_or_else(|| ChainClientError::NotFound(chain_id.to_string()))
    }
}

impl ChainClientLookup for ChainRegistry {
    fn get_client(&self, chain_id: &str) -> Result<Arc<dyn ChainClient>, ChainClientError> {
        ChainClientRegistry::get_client(self, chain_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::MockChainClientFactory;
    use shared_types::VmType;

    fn setup() -> (Arc<MockChainClientFactory>, ChainRegistry) {
        let factory = Arc::new(MockChainClientFactory::new());
        let registry = ChainRegistry::new(factory.clone());
        (factory, registry)
    }

    #[tokio::test]
    async fn test_add_starts_client() {
        let (factory, registry) = setup();
        registry
            .add_or_update_chain(&ChainConfig::new("eip155:1", VmType::Evm))
            .await
            .unwrap();

        assert_eq!(registry.len(), 1);
        let created = factory.clients_for("eip155:1");
        assert_eq!(created.len(), 1);
        assert!(created[0].is_started());
    }

    #[tokio::test]
    async fn test_unchanged_config_is_noop() {
        let (factory, registry) = setup();
        let cfg = ChainConfig::new("eip155:1", VmType::Evm);
        registry.add_or_update_chain(&cfg).await.unwrap();

        let mut same = cfg.clone();
        same.rpc_urls.push("https://other.rpc".to_string());
        registry.add_or_update_chain(&same).await.unwrap();

        assert_eq!(factory.clients_for("eip155:1").len(), 1);
    }

    #[tokio::test]
    async fn test_changed_config_replaces_and_stops_old() {
        let (factory, registry) = setup();
        let cfg = ChainConfig::new("eip155:1", VmType::Evm);
        registry.add_or_update_chain(&cfg).await.unwrap();

        let mut changed = cfg.clone();
        changed.gateway_address = "0xnew".to_string();
        registry.add_or_update_chain(&changed).await.unwrap();

        let created = factory.clients_for("eip155:1");
        assert_eq!(created.len(), 2);
        assert_eq!(created[0].stop_calls(), 1);
        assert!(created[1].is_started());
        let live = ChainClientRegistry::get_client(&registry, "eip155:1").unwrap();
        assert_eq!(live.config().gateway_address, "0xnew");
    }

    #[tokio::test]
    async fn test_remove_stops_client() {
        let (factory, registry) = setup();
        registry
            .add_or_update_chain(&ChainConfig::new("eip155:1", VmType::Evm))
            .await
            .unwrap();
        registry.remove_chain("eip155:1").await;
        registry.remove_chain("unknown").await;

        assert!(registry.is_empty());
        assert_eq!(factory.clients_for("eip155:1")[0].stop_calls(), 1);
    }

    #[tokio::test]
    async fn test_factory_error_surfaces() {
        let (_factory, registry) = setup();
        let res = registry
            .add_or_update_chain(&ChainConfig::new("x", VmType::Unspecified))
            .await;
        assert!(matches!(
            res,
            Err(ChainSyncError::Client(ChainClientError::UnsupportedVm(_)))
        ));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_lookup_unknown_chain() {
        let (_factory, registry) = setup();
        let lookup: &dyn ChainClientLookup = &registry;
        assert!(matches!(
            lookup.get_client("nope"),
            Err(ChainClientError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_stop_all() {
        let (factory, registry) = setup();
        for id in ["a", "b"] {
            registry
                .add_or_update_chain(&ChainConfig::new(id, VmType::Svm))
                .await
                .unwrap();
        }
        registry.stop_all().await;
        assert!(registry.is_empty());
        assert_eq!(factory.clients_for("a")[0].stop_calls(), 1);
        assert_eq!(factory.clients_for("b")[0].stop_calls(), 1);
    }
}
