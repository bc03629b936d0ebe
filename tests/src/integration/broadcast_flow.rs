//! # Broadcast Flow
//!
//! Signed events are broadcast through clients that the registry job built
//! from the chain cache.
//!
//! ```text
//! ChainCache ──► ChainRegistryJob ──► ChainRegistry ──► TxBroadcaster ──► EventStore
//! ```

#[cfg(test)]
mod tests {
    use shared_types::{
        BroadcastFailure, ChainClientError, ChainConfig, OutboundCreatedEvent, RunContext, VmType,
    };
    use std::sync::Arc;

    use uv_02_chain_sync::{
        ChainCache, ChainRegistry, ChainRegistryJob, ChainRegistryJobConfig,
        MockChainClientFactory,
    };
    use uv_04_tx_broadcaster::{
        BroadcasterConfig, Event, EventStatus, EventStore, InMemoryEventStore, SignedEventData,
        SigningData, StaticTssAddress, TxBroadcaster,
    };

    use crate::eventually;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    const EVM: &str = "eip155:11155111";
    const SVM: &str = "solana:devnet";

    struct Fixture {
        factory: Arc<MockChainClientFactory>,
        registry: Arc<ChainRegistry>,
        store: Arc<InMemoryEventStore>,
        broadcaster: Arc<TxBroadcaster>,
    }

    async fn fixture() -> Fixture {
        let cache = Arc::new(ChainCache::new());
        cache.update_chains(vec![
            ChainConfig::new(EVM, VmType::Evm),
            ChainConfig::new(SVM, VmType::Svm),
        ]);

        let factory = Arc::new(MockChainClientFactory::new());
        let registry = Arc::new(ChainRegistry::new(factory.clone()));
        let job = ChainRegistryJob::new(
            cache,
            registry.clone(),
            ChainRegistryJobConfig::for_testing(),
        );
        job.sync_once(&RunContext::background()).await;

        let store = Arc::new(InMemoryEventStore::new());
        let broadcaster = Arc::new(
            TxBroadcaster::new(
                store.clone(),
                registry.clone(),
                Arc::new(StaticTssAddress("0xtss".to_string())),
                BroadcasterConfig::for_testing(),
            )
            .unwrap(),
        );
        Fixture {
            factory,
            registry,
            store,
            broadcaster,
        }
    }

    fn signed_event(id: &str, chain: &str, nonce: u64) -> Event {
        let data = SignedEventData {
            outbound: OutboundCreatedEvent {
                destination_chain: chain.to_string(),
                tx_id: format!("0x{}", id),
                ..Default::default()
            },
            signing_data: Some(SigningData {
                signature: format!("0x{}", "22".repeat(65)),
                signing_hash: "cd".repeat(32),
                nonce,
                gas_price: "7".to_string(),
            }),
        };
        Event::signed(id, 10, &data)
    }

    fn status(f: &Fixture, id: &str) -> Event {
        f.store.get_event(id).unwrap().unwrap()
    }

    // =============================================================================
    // INTEGRATION TESTS
    // =============================================================================

    #[tokio::test]
    async fn test_evm_event_broadcast_through_registry() {
        let f = fixture().await;
        assert_eq!(f.registry.len(), 2);
        f.factory.builder(EVM).set_nonce(3);
        f.store.insert(signed_event("e1", EVM, 3)).unwrap();

        let handled = f.broadcaster.process_signed(&RunContext::background()).await;
        assert_eq!(handled, 1);

        let event = status(&f, "e1");
        assert_eq!(event.status, EventStatus::Broadcasted);
        assert_eq!(
            event.broadcasted_tx_hash.as_deref(),
            Some("eip155:11155111:0xmocktx")
        );

        let sent = f.factory.builder(EVM).broadcasts();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].nonce, 3);
        assert_eq!(sent[0].signature.len(), 64);
        assert_eq!(
            f.factory.builder(EVM).nonce_queries(),
            vec![("0xtss".to_string(), true)]
        );
    }

    #[tokio::test]
    async fn test_svm_events_respect_nonce_order() {
        let f = fixture().await;
        let builder = f.factory.builder(SVM);
        builder.set_nonce(5);
        f.store.insert(signed_event("s4", SVM, 4)).unwrap();
        f.store.insert(signed_event("s5", SVM, 5)).unwrap();
        f.store.insert(signed_event("s6", SVM, 6)).unwrap();

        f.broadcaster.process_signed(&RunContext::background()).await;

        assert_eq!(status(&f, "s4").status, EventStatus::Broadcasted);
        assert_eq!(status(&f, "s4").broadcasted_tx_hash, None);
        assert_eq!(status(&f, "s5").status, EventStatus::Broadcasted);
        assert_eq!(status(&f, "s6").status, EventStatus::Signed);
        assert_eq!(builder.broadcasts().len(), 1);
        assert_eq!(builder.broadcasts()[0].nonce, 5);
    }

    #[tokio::test]
    async fn test_removed_chain_leaves_event_signed() {
        let f = fixture().await;
        f.store.insert(signed_event("x1", "eip155:999", 0)).unwrap();

        f.broadcaster.process_signed(&RunContext::background()).await;
        assert_eq!(status(&f, "x1").status, EventStatus::Signed);
    }

    #[tokio::test]
    async fn test_transient_failure_retried_by_loop() {
        let f = fixture().await;
        let builder = f.factory.builder(EVM);
        builder.set_broadcast_result(Err(BroadcastFailure::submitted(
            "0xpending",
            ChainClientError::Rpc("connection reset".to_string()),
        )));
        f.store.insert(signed_event("r1", EVM, 0)).unwrap();

        f.broadcaster.process_signed(&RunContext::background()).await;
        assert_eq!(status(&f, "r1").status, EventStatus::Signed);

        builder.set_broadcast_result(Ok("0xsecond".to_string()));
        assert!(f.broadcaster.start(RunContext::background()));
        assert!(eventually(|| status(&f, "r1").status == EventStatus::Broadcasted).await);
        f.broadcaster.stop().await;

        assert_eq!(
            status(&f, "r1").broadcasted_tx_hash.as_deref(),
            Some("eip155:11155111:0xsecond")
        );
    }
}
