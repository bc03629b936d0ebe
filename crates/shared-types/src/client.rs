//! # Per-Chain Client Contracts
//!
//! Traits implemented by the concrete EVM/SVM clients and consumed by the
//! chain registry and the transaction broadcaster, plus in-memory mocks.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::chain::ChainConfig;
use crate::errors::ChainClientError;

/// Outbound transfer created on Push chain, to be executed on `destination_chain`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutboundCreatedEvent {
    pub universal_tx_id: String,
    pub outbound_id: String,
    pub tx_id: String,
    pub destination_chain: String,
    pub recipient: String,
    pub amount: String,
    pub asset_addr: String,
    pub sender: String,
    pub payload: String,
    pub gas_limit: String,
    pub tx_type: String,
    pub pc_tx_hash: String,
    pub log_index: String,
    pub revert_msg: String,
}

/// Request handed to the TSS signing round and back to the builder.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UnsignedOutboundTxReq {
    /// Digest signed by the TSS group.
    pub signing_hash: Vec<u8>,
    /// EVM: TSS address nonce. SVM: PDA nonce.
    pub nonce: u64,
    /// EVM: gas price. SVM: prioritization fee.
    pub gas_price: u128,
}

/// Failed broadcast. `tx_hash` is `None` when the transaction could not even
/// be assembled, `Some` when it was built and submission failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastFailure {
    /// Hash of the assembled transaction, if any.
    pub tx_hash: Option<String>,
    /// Underlying failure.
    pub error: ChainClientError,
}

impl BroadcastFailure {
    /// Failure before a transaction existed.
    pub fn unassembled(error: ChainClientError) -> Self {
        Self {
            tx_hash: None,
            error,
        }
    }

    /// Failure after the transaction was assembled and hashed.
    pub fn submitted(tx_hash: impl Into<String>, error: ChainClientError) -> Self {
        Self {
            tx_hash: Some(tx_hash.into()),
            error,
        }
    }
}

/// Builds and broadcasts outbound transactions for one chain.
#[async_trait]
pub trait OutboundTxBuilder: Send + Sync {
    /// Signature length the chain accepts (64 for r||s).
    fn signature_len(&self) -> usize {
        64
    }

    /// Assemble the transaction from the request and signature and submit it.
    /// Returns the transaction hash.
    async fn broadcast_outbound_signing_request(
        &self,
        req: &UnsignedOutboundTxReq,
        event: &OutboundCreatedEvent,
        signature: &[u8],
    ) -> Result<String, BroadcastFailure>;

    /// Next nonce for `address`; `finalized` selects the finalized view.
    async fn get_next_nonce(&self, address: &str, finalized: bool)
        -> Result<u64, ChainClientError>;
}

/// A live client for one external chain.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// The config the client was built from.
    fn config(&self) -> &ChainConfig;

    /// CAIP-2 chain id.
    fn chain_id(&self) -> &str {
        &self.config().chain
    }

    /// Start watchers and RPC pools.
    async fn start(&self) -> Result<(), ChainClientError>;

    /// Release resources. Called once before the client is dropped from the registry.
    async fn stop(&self) -> Result<(), ChainClientError>;

    /// Operational health.
    fn is_healthy(&self) -> bool;

    /// Outbound transaction builder, if the chain supports outbound.
    fn tx_builder(&self) -> Result<Arc<dyn OutboundTxBuilder>, ChainClientError>;
}

/// Lookup of live chain clients by chain id.
pub trait ChainClientLookup: Send + Sync {
    /// The client for `chain_id`, or [`ChainClientError::NotFound`].
    fn get_client(&self, chain_id: &str) -> Result<Arc<dyn ChainClient>, ChainClientError>;
}

// =============================================================================
// Mock Implementations for Testing
// =============================================================================

/// A recorded broadcast attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedBroadcast {
    /// Request nonce.
    pub nonce: u64,
    /// Signature as passed to the builder.
    pub signature: Vec<u8>,
}

struct MockTxBuilderState {
    nonce: u64,
    nonce_after_broadcast: Option<u64>,
    fail_nonce_queries: bool,
    broadcast_result: Result<String, BroadcastFailure>,
    broadcasts: Vec<RecordedBroadcast>,
    nonce_queries: Vec<(String, bool)>,
}

/// Scriptable tx builder.
pub struct MockTxBuilder {
    state: Mutex<MockTxBuilderState>,
}

impl Default for MockTxBuilder {
    fn default() -> Self {
        Self {
            state: Mutex::new(MockTxBuilderState {
                nonce: 0,
                nonce_after_broadcast: None,
                fail_nonce_queries: false,
                broadcast_result: Ok("0xmocktx".to_string()),
                broadcasts: Vec::new(),
                nonce_queries: Vec::new(),
            }),
        }
    }
}

impl MockTxBuilder {
    /// Builder whose chain reports `nonce` as the next nonce.
    pub fn with_nonce(nonce: u64) -> Self {
        let builder = Self::default();
        builder.state.lock().nonce = nonce;
        builder
    }

    /// Set the reported next nonce.
    pub fn set_nonce(&self, nonce: u64) {
        self.state.lock().nonce = nonce;
    }

    /// After the next broadcast attempt the chain reports `nonce`.
    pub fn set_nonce_after_broadcast(&self, nonce: u64) {
        self.state.lock().nonce_after_broadcast = Some(nonce);
    }

    /// Make nonce queries fail with an RPC error.
    pub fn set_fail_nonce_queries(&self, fail: bool) {
        self.state.lock().fail_nonce_queries = fail;
    }

    /// Result returned by every broadcast attempt.
    pub fn set_broadcast_result(&self, result: Result<String, BroadcastFailure>) {
        self.state.lock().broadcast_result = result;
    }

    /// Recorded broadcast attempts.
    pub fn broadcasts(&self) -> Vec<RecordedBroadcast> {
        self.state.lock().broadcasts.clone()
    }

    /// Recorded nonce queries as `(address, finalized)`.
    pub fn nonce_queries(&self) -> Vec<(String, bool)> {
        self.state.lock().nonce_queries.clone()
    }
}

#[async_trait]
impl OutboundTxBuilder for MockTxBuilder {
    async fn broadcast_outbound_signing_request(
        &self,
        req: &UnsignedOutboundTxReq,
        _event: &OutboundCreatedEvent,
        signature: &[u8],
    ) -> Result<String, BroadcastFailure> {
        let mut state = self.state.lock();
        state.broadcasts.push(RecordedBroadcast {
            nonce: req.nonce,
            signature: signature.to_vec(),
        });
        if let Some(next) = state.nonce_after_broadcast.take() {
            state.nonce = next;
        }
        state.broadcast_result.clone()
    }

    async fn get_next_nonce(
        &self,
        address: &str,
        finalized: bool,
    ) -> Result<u64, ChainClientError> {
        let mut state = self.state.lock();
        state.nonce_queries.push((address.to_string(), finalized));
        if state.fail_nonce_queries {
            return Err(ChainClientError::Rpc("mock nonce query failure".to_string()));
        }
        Ok(state.nonce)
    }
}

/// In-memory chain client.
pub struct MockChainClient {
    config: ChainConfig,
    builder: Option<Arc<MockTxBuilder>>,
    started: AtomicBool,
    stop_calls: AtomicUsize,
    fail_stop: bool,
}

impl MockChainClient {
    /// Client without an outbound builder.
    pub fn new(config: ChainConfig) -> Self {
        Self {
            config,
            builder: None,
            started: AtomicBool::new(false),
            stop_calls: AtomicUsize::new(0),
            fail_stop: false,
        }
    }

    /// Client exposing `builder` as its outbound builder.
    pub fn with_builder(config: ChainConfig, builder: Arc<MockTxBuilder>) -> Self {
        Self {
            builder: Some(builder),
            ..Self::new(config)
        }
    }

    /// Make `stop` return an error.
    pub fn failing_stop(mut self) -> Self {
        self.fail_stop = true;
        self
    }

    /// Whether `start` has been called and `stop` has not.
    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    /// Number of `stop` calls.
    pub fn stop_calls(&self) -> usize {
        self.stop_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChainClient for MockChainClient {
    fn config(&self) -> &ChainConfig {
        &self.config
    }

    async fn start(&self) -> Result<(), ChainClientError> {
        self.started.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn stop(&self) -> Result<(), ChainClientError> {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        self.started.store(false, Ordering::SeqCst);
        if self.fail_stop {
            return Err(ChainClientError::Lifecycle("mock stop failure".to_string()));
        }
        Ok(())
    }

    fn is_healthy(&self) -> bool {
        self.is_started()
    }

    fn tx_builder(&self) -> Result<Arc<dyn OutboundTxBuilder>, ChainClientError> {
        match &self.builder {
            Some(builder) => Ok(builder.clone()),
            None => Err(ChainClientError::TxBuilderUnsupported(
                self.config.chain.clone(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::VmType;

    #[tokio::test]
    async fn test_mock_builder_records_broadcasts() {
        let builder = MockTxBuilder::with_nonce(5);
        builder.set_nonce_after_broadcast(6);

        let req = UnsignedOutboundTxReq {
            nonce: 5,
            ..Default::default()
        };
        let hash = builder
            .broadcast_outbound_signing_request(&req, &OutboundCreatedEvent::default(), &[1u8; 64])
            .await
            .unwrap();

        assert_eq!(hash, "0xmocktx");
        assert_eq!(builder.broadcasts().len(), 1);
        assert_eq!(builder.get_next_nonce("0xtss", true).await.unwrap(), 6);
    }

    #[tokio::test]
    async fn test_mock_client_without_builder() {
        let client = MockChainClient::new(ChainConfig::new("eip155:1", VmType::Evm));
        assert!(matches!(
            client.tx_builder(),
            Err(ChainClientError::TxBuilderUnsupported(_))
        ));
        assert_eq!(client.chain_id(), "eip155:1");
    }

    #[tokio::test]
    async fn test_mock_client_lifecycle() {
        let client = MockChainClient::new(ChainConfig::new("eip155:1", VmType::Evm));
        client.start().await.unwrap();
        assert!(client.is_healthy());
        client.stop().await.unwrap();
        assert!(!client.is_healthy());
        assert_eq!(client.stop_calls(), 1);
    }
}
