//! # Chain Sync Flow
//!
//! The cache job fills the chain cache from the upstream source; the
//! registry job turns the cached snapshot into live clients.
//!
//! ```text
//! MockChainConfigSource ──► ChainCacheJob ──► ChainCache ──► ChainRegistryJob ──► ChainRegistry
//! ```

#[cfg(test)]
mod tests {
    use shared_types::{ChainConfig, ChainEnabled, RunContext, VmType};
    use std::sync::Arc;

    use uv_02_chain_sync::{
        ChainCache, ChainCacheJob, ChainCacheJobConfig, ChainClientRegistry, ChainRegistry,
        ChainRegistryJob, ChainRegistryJobConfig, MockChainClientFactory, MockChainConfigSource,
    };

    use crate::eventually;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    struct Pipeline {
        source: Arc<MockChainConfigSource>,
        factory: Arc<MockChainClientFactory>,
        cache: Arc<ChainCache>,
        registry: Arc<ChainRegistry>,
        cache_job: ChainCacheJob,
        registry_job: ChainRegistryJob,
    }

    fn pipeline(configs: Vec<ChainConfig>) -> Pipeline {
        let source = Arc::new(MockChainConfigSource::new(configs));
        let factory = Arc::new(MockChainClientFactory::new());
        let cache = Arc::new(ChainCache::new());
        let registry = Arc::new(ChainRegistry::new(factory.clone()));
        let cache_job = ChainCacheJob::new(
            cache.clone(),
            source.clone(),
            ChainCacheJobConfig::for_testing(),
        );
        let registry_job = ChainRegistryJob::new(
            cache.clone(),
            registry.clone(),
            ChainRegistryJobConfig::for_testing(),
        );
        Pipeline {
            source,
            factory,
            cache,
            registry,
            cache_job,
            registry_job,
        }
    }

    impl Pipeline {
        async fn stop(&self) {
            self.registry_job.stop().await;
            self.cache_job.stop().await;
            self.registry.stop_all().await;
        }
    }

    // =============================================================================
    // INTEGRATION TESTS
    // =============================================================================

    #[tokio::test]
    async fn test_cache_job_feeds_registry_job() {
        let p = pipeline(vec![
            ChainConfig::new("eip155:11155111", VmType::Evm),
            ChainConfig::new("solana:devnet", VmType::Svm),
        ]);
        let ctx = RunContext::background();
        p.cache_job.start(ctx.clone()).unwrap();
        p.registry_job.start(ctx).unwrap();

        assert!(eventually(|| p.registry.len() == 2).await);
        assert_eq!(p.cache.chain_count(), 2);
        let client = p
            .registry
            .get_client("solana:devnet")
            .unwrap();
        assert!(client.is_healthy());

        p.stop().await;
        assert!(p.registry.is_empty());
        assert_eq!(p.factory.clients_for("solana:devnet")[0].stop_calls(), 1);
    }

    #[tokio::test]
    async fn test_config_change_rebuilds_and_removal_stops() {
        let evm = ChainConfig::new("eip155:1", VmType::Evm);
        let svm = ChainConfig::new("solana:devnet", VmType::Svm);
        let p = pipeline(vec![evm.clone(), svm]);
        let ctx = RunContext::background();
        p.cache_job.start(ctx.clone()).unwrap();
        assert!(eventually(|| p.cache.chain_count() == 2).await);

        let report = p.registry_job.sync_once(&ctx).await;
        assert_eq!(report.upserted, 2);

        // Gateway moves, Solana disappears.
        let mut moved = evm.clone();
        moved.gateway_address = "0xnewgateway".to_string();
        p.source.set_configs(vec![moved]);
        p.cache_job.force_sync();
        assert!(eventually(|| p.cache.chain_count() == 1).await);

        let report = p.registry_job.sync_once(&ctx).await;
        assert_eq!(report.removed, vec!["solana:devnet".to_string()]);
        assert_eq!(p.registry.len(), 1);

        let evm_clients = p.factory.clients_for("eip155:1");
        assert_eq!(evm_clients.len(), 2);
        assert_eq!(evm_clients[0].stop_calls(), 1);
        assert!(evm_clients[1].is_started());
        assert_eq!(p.factory.clients_for("solana:devnet")[0].stop_calls(), 1);

        p.stop().await;
    }

    #[tokio::test]
    async fn test_disabled_chain_never_registered() {
        let mut disabled = ChainConfig::new("eip155:56", VmType::Evm);
        disabled.enabled = Some(ChainEnabled::default());
        let p = pipeline(vec![disabled, ChainConfig::new("eip155:1", VmType::Evm)]);
        let ctx = RunContext::background();
        p.cache_job.start(ctx.clone()).unwrap();
        assert!(eventually(|| p.cache.chain_count() == 2).await);

        p.registry_job.sync_once(&ctx).await;
        assert!(ChainClientRegistry::get_client(p.registry.as_ref(), "eip155:56").is_err());
        assert!(p.factory.clients_for("eip155:56").is_empty());
        assert_eq!(p.registry.len(), 1);

        p.stop().await;
    }

    #[tokio::test]
    async fn test_upstream_outage_keeps_snapshot() {
        let p = pipeline(vec![ChainConfig::new("eip155:1", VmType::Evm)]);
        let ctx = RunContext::background();
        p.cache_job.start(ctx.clone()).unwrap();
        assert!(eventually(|| p.cache.chain_count() == 1).await);

        p.source.push_failure("upstream down");
        p.cache_job.force_sync();
        assert!(eventually(|| p.source.calls() >= 2).await);
        assert_eq!(p.cache.chain_count(), 1);

        let report = p.registry_job.sync_once(&ctx).await;
        assert_eq!(report.upserted, 1);
        p.stop().await;
    }
}
