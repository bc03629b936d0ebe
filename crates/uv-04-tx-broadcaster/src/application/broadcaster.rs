//! # Transaction Broadcaster
//!
//! Per-event flow and the polling loop that drains `SIGNED` events.
//!
//! Correctness does not depend on mutual exclusion between nodes: an event
//! is marked `BROADCASTED` only on evidence that its nonce was consumed,
//! either a successful submission or the destination nonce moving past it.
//! Everything else leaves the event `SIGNED` for the next tick.

use parking_lot::Mutex;
use shared_types::{
    ChainClientLookup, ContextError, OutboundCreatedEvent, OutboundTxBuilder, RunContext,
    RunHandle, UnsignedOutboundTxReq, VmType,
};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::algorithms::{decode_hex, normalize_signature, reconstruct_signing_req};
use crate::config::BroadcasterConfig;
use crate::domain::{BroadcastError, Event, EventStatus, SignedEventData};
use crate::ports::{EventStore, TssAddressProvider};

/// Result of one broadcast attempt for one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BroadcastOutcome {
    /// Submitted; the event is `BROADCASTED`.
    Broadcasted {
        /// Destination tx hash
        tx_hash: String,
    },
    /// Nonce already consumed before submission; no network call made.
    AlreadyConsumed,
    /// Submission failed but the nonce was consumed anyway.
    ConsumedAfterFailure {
        /// Hash of the assembled transaction
        tx_hash: String,
    },
    /// SVM: an earlier nonce has to land first.
    WaitingForEarlierNonce,
    /// Transient failure; the event stays `SIGNED`.
    Retry,
}

impl BroadcastOutcome {
    /// Metric label.
    pub fn as_str(&self) -> &'static str {
        match self {
            BroadcastOutcome::Broadcasted { .. } => "broadcasted",
            BroadcastOutcome::AlreadyConsumed => "already_consumed",
            BroadcastOutcome::ConsumedAfterFailure { .. } => "consumed_after_failure",
            BroadcastOutcome::WaitingForEarlierNonce => "waiting",
            BroadcastOutcome::Retry => "retry",
        }
    }

    /// True when the event left `SIGNED`.
    pub fn is_final(&self) -> bool {
        matches!(
            self,
            BroadcastOutcome::Broadcasted { .. }
                | BroadcastOutcome::AlreadyConsumed
                | BroadcastOutcome::ConsumedAfterFailure { .. }
        )
    }
}

/// Which nonce view gates a VM.
struct NonceGate<'a> {
    builder: &'a dyn OutboundTxBuilder,
    address: Option<String>,
    finalized: bool,
}

/// Decoded, ready-to-submit event.
struct Prepared {
    chain_id: String,
    outbound: OutboundCreatedEvent,
    req: UnsignedOutboundTxReq,
    signature: Vec<u8>,
}

/// Broadcasts signed events to their destination chains.
pub struct TxBroadcaster {
    store: Arc<dyn EventStore>,
    chains: Arc<dyn ChainClientLookup>,
    tss: Arc<dyn TssAddressProvider>,
    config: BroadcasterConfig,
    // event id -> last permanent failure reported at error level
    reported: Mutex<HashMap<String, String>>,
    worker: Mutex<Option<(RunHandle, JoinHandle<()>)>>,
}

impl TxBroadcaster {
    /// New broadcaster. The polling loop starts with [`TxBroadcaster::start`].
    pub fn new(
        store: Arc<dyn EventStore>,
        chains: Arc<dyn ChainClientLookup>,
        tss: Arc<dyn TssAddressProvider>,
        config: BroadcasterConfig,
    ) -> Result<Self, BroadcastError> {
        config.validate()?;
        Ok(Self {
            store,
            chains,
            tss,
            config,
            reported: Mutex::new(HashMap::new()),
            worker: Mutex::new(None),
        })
    }

    /// Run the nonce-gated flow for one event.
    ///
    /// # Errors
    ///
    /// Data errors ([`BroadcastError::is_permanent`]) and lookup/store
    /// failures. The event stays `SIGNED` in every error case.
    pub async fn broadcast_event(
        &self,
        ctx: &RunContext,
        event: &Event,
    ) -> Result<BroadcastOutcome, BroadcastError> {
        if event.status != EventStatus::Signed {
            return Err(BroadcastError::InvalidTransition {
                event_id: event.event_id.clone(),
                from: event.status,
                to: EventStatus::Broadcasted,
            });
        }

        let (outbound, signing) = SignedEventData::parse(&event.event_data)?;
        let req = reconstruct_signing_req(&signing)?;
        let raw_signature = decode_hex("signature", &signing.signature)?;

        let chain_id = outbound.destination_chain.clone();
        let client = self.chains.get_client(&chain_id)?;
        let builder = client.tx_builder()?;
        let signature = normalize_signature(raw_signature, builder.signature_len())?;

        let prepared = Prepared {
            chain_id,
            outbound,
            req,
            signature,
        };
        match client.config().vm_type {
            VmType::Evm => self.broadcast_evm(ctx, event, builder.as_ref(), &prepared).await,
            VmType::Svm => self.broadcast_svm(ctx, event, builder.as_ref(), &prepared).await,
            other => Err(BroadcastError::UnsupportedVm(other)),
        }
    }

    /// EVM: pre-check on the finalized TSS nonce, broadcast, post-check.
    /// A failed pre-check query does not block the broadcast.
    async fn broadcast_evm(
        &self,
        ctx: &RunContext,
        event: &Event,
        builder: &dyn OutboundTxBuilder,
        prepared: &Prepared,
    ) -> Result<BroadcastOutcome, BroadcastError> {
        let address = match self.tss.tss_address().await {
            Ok(address) => Some(address),
            Err(e) => {
                debug!(event_id = %event.event_id, error = %e, "[uv-04] TSS address unavailable");
                None
            }
        };
        let gate = NonceGate {
            builder,
            address,
            finalized: true,
        };
        let nonce = prepared.req.nonce;

        match self.query_nonce(ctx, &gate).await {
            Ok(finalized) if nonce < finalized => {
                info!(
                    event_id = %event.event_id,
                    chain = %prepared.chain_id,
                    event_nonce = nonce,
                    finalized_nonce = finalized,
                    "[uv-04] nonce already consumed, marking BROADCASTED"
                );
                self.mark_broadcasted(event, &prepared.chain_id, None)?;
                return Ok(BroadcastOutcome::AlreadyConsumed);
            }
            Ok(_) => {}
            Err(e @ BroadcastError::Interrupted(ContextError::Cancelled)) => return Err(e),
            Err(e) => {
                debug!(
                    event_id = %event.event_id,
                    chain = %prepared.chain_id,
                    error = %e,
                    "[uv-04] failed to get finalized nonce, will try broadcast anyway"
                );
            }
        }

        self.submit(ctx, event, &gate, prepared).await
    }

    /// SVM: strict nonce order on the current (non-finalized) PDA nonce.
    async fn broadcast_svm(
        &self,
        ctx: &RunContext,
        event: &Event,
        builder: &dyn OutboundTxBuilder,
        prepared: &Prepared,
    ) -> Result<BroadcastOutcome, BroadcastError> {
        // The PDA nonce is program-wide; no account address is needed.
        let gate = NonceGate {
            builder,
            address: Some(String::new()),
            finalized: false,
        };
        let nonce = prepared.req.nonce;

        let on_chain = match self.query_nonce(ctx, &gate).await {
            Ok(n) => n,
            Err(e @ BroadcastError::Interrupted(ContextError::Cancelled)) => return Err(e),
            Err(e) => {
                debug!(
                    event_id = %event.event_id,
                    chain = %prepared.chain_id,
                    error = %e,
                    "[uv-04] failed to get on-chain nonce, will retry next tick"
                );
                return Ok(BroadcastOutcome::Retry);
            }
        };

        if nonce < on_chain {
            info!(
                event_id = %event.event_id,
                chain = %prepared.chain_id,
                event_nonce = nonce,
                on_chain_nonce = on_chain,
                "[uv-04] nonce already consumed, marking BROADCASTED"
            );
            self.mark_broadcasted(event, &prepared.chain_id, None)?;
            return Ok(BroadcastOutcome::AlreadyConsumed);
        }
        if nonce > on_chain {
            debug!(
                event_id = %event.event_id,
                chain = %prepared.chain_id,
                event_nonce = nonce,
                on_chain_nonce = on_chain,
                "[uv-04] waiting for earlier nonce to process first"
            );
            return Ok(BroadcastOutcome::WaitingForEarlierNonce);
        }

        self.submit(ctx, event, &gate, prepared).await
    }

    /// Broadcast and, on failure, decide from the nonce whether it landed.
    async fn submit(
        &self,
        ctx: &RunContext,
        event: &Event,
        gate: &NonceGate<'_>,
        prepared: &Prepared,
    ) -> Result<BroadcastOutcome, BroadcastError> {
        let attempt = ctx
            .run(
                self.config.rpc_timeout(),
                gate.builder.broadcast_outbound_signing_request(
                    &prepared.req,
                    &prepared.outbound,
                    &prepared.signature,
                ),
            )
            .await;

        let (tx_hash, failure) = match attempt {
            Ok(Ok(tx_hash)) => {
                self.mark_broadcasted(event, &prepared.chain_id, Some(&tx_hash))?;
                return Ok(BroadcastOutcome::Broadcasted { tx_hash });
            }
            Ok(Err(failure)) => match failure.tx_hash {
                Some(hash) => (Some(hash), failure.error.to_string()),
                None => return Err(BroadcastError::Unassembled(failure.error)),
            },
            Err(ContextError::Cancelled) => {
                return Err(BroadcastError::Interrupted(ContextError::Cancelled))
            }
            // The submission may still land; the nonce decides.
            Err(ContextError::DeadlineExceeded) => (None, "broadcast timed out".to_string()),
        };

        let nonce = prepared.req.nonce;
        match self.query_nonce(ctx, gate).await {
            Ok(chain_nonce) if nonce < chain_nonce => {
                info!(
                    event_id = %event.event_id,
                    chain = %prepared.chain_id,
                    event_nonce = nonce,
                    chain_nonce,
                    error = %failure,
                    "[uv-04] broadcast failed but nonce already consumed, marking BROADCASTED"
                );
                self.mark_broadcasted(event, &prepared.chain_id, tx_hash.as_deref())?;
                Ok(match tx_hash {
                    Some(tx_hash) => BroadcastOutcome::ConsumedAfterFailure { tx_hash },
                    None => BroadcastOutcome::AlreadyConsumed,
                })
            }
            Err(e @ BroadcastError::Interrupted(ContextError::Cancelled)) => Err(e),
            _ => {
                debug!(
                    event_id = %event.event_id,
                    chain = %prepared.chain_id,
                    nonce,
                    error = %failure,
                    "[uv-04] broadcast failed, will retry next tick"
                );
                Ok(BroadcastOutcome::Retry)
            }
        }
    }

    async fn query_nonce(&self, ctx: &RunContext, gate: &NonceGate<'_>) -> Result<u64, BroadcastError> {
        let address = gate
            .address
            .as_deref()
            .ok_or_else(|| BroadcastError::TssAddress("no TSS address for nonce query".to_string()))?;
        let nonce = ctx
            .run(
                self.config.rpc_timeout(),
                gate.builder.get_next_nonce(address, gate.finalized),
            )
            .await??;
        Ok(nonce)
    }

    fn mark_broadcasted(
        &self,
        event: &Event,
        chain_id: &str,
        tx_hash: Option<&str>,
    ) -> Result<(), BroadcastError> {
        let caip = tx_hash.map(|hash| format!("{}:{}", chain_id, hash));
        self.store.mark_broadcasted(&event.event_id, caip)?;
        self.reported.lock().remove(&event.event_id);
        info!(
            event_id = %event.event_id,
            chain = %chain_id,
            tx_hash = tx_hash.unwrap_or(""),
            "[uv-04] marked BROADCASTED"
        );
        Ok(())
    }

    /// Drain every `SIGNED` event once, page by page. Returns the number of
    /// events attempted.
    pub async fn process_signed(&self, ctx: &RunContext) -> usize {
        let mut cursor: Option<String> = None;
        let mut attempted = 0;
        let mut seen = HashSet::new();

        let complete = loop {
            if ctx.is_cancelled() {
                break false;
            }
            let batch = match self
                .store
                .get_signed_events(cursor.as_deref(), self.config.batch_size)
            {
                Ok(batch) => batch,
                Err(e) => {
                    warn!(error = %e, "[uv-04] failed to get signed events");
                    break false;
                }
            };

            for event in &batch {
                self.handle_event(ctx, event).await;
                seen.insert(event.event_id.clone());
                attempted += 1;
            }
            if batch.len() < self.config.batch_size {
                break true;
            }
            cursor = batch.last().map(|e| e.event_id.clone());
        };

        // Only a full scan proves an event left SIGNED.
        if complete {
            self.reported.lock().retain(|id, _| seen.contains(id));
        }
        attempted
    }

    async fn handle_event(&self, ctx: &RunContext, event: &Event) {
        match self.broadcast_event(ctx, event).await {
            Ok(outcome) => {
                uv_telemetry::BROADCAST_OUTCOMES
                    .with_label_values(&[outcome.as_str()])
                    .inc();
            }
            Err(e) if e.is_permanent() => {
                uv_telemetry::BROADCAST_OUTCOMES
                    .with_label_values(&["permanent_error"])
                    .inc();
                self.report_permanent(&event.event_id, &e);
            }
            Err(e) => {
                uv_telemetry::BROADCAST_OUTCOMES
                    .with_label_values(&["transient_error"])
                    .inc();
                debug!(event_id = %event.event_id, error = %e, "[uv-04] broadcast attempt failed");
            }
        }
    }

    /// Log a permanent failure at error level once per (event, reason).
    fn report_permanent(&self, event_id: &str, err: &BroadcastError) {
        let reason = err.to_string();
        let mut reported = self.reported.lock();
        if reported.get(event_id) == Some(&reason) {
            debug!(event_id = %event_id, error = %reason, "[uv-04] permanent broadcast failure persists");
            return;
        }
        error!(event_id = %event_id, error = %reason, "[uv-04] permanent broadcast failure; event left SIGNED");
        reported.insert(event_id.to_string(), reason);
    }

    /// Spawn the polling loop. Returns `false` when already running.
    pub fn start(self: &Arc<Self>, ctx: RunContext) -> bool {
        let mut worker = self.worker.lock();
        if let Some((_, handle)) = worker.as_ref() {
            if !handle.is_finished() {
                return false;
            }
        }

        let (stop, stop_ctx) = RunContext::new();
        let broadcaster = self.clone();
        let handle = tokio::spawn(async move { broadcaster.run(ctx, stop_ctx).await });
        *worker = Some((stop, handle));
        info!(
            interval_secs = self.config.check_interval_secs,
            "[uv-04] tx broadcaster started"
        );
        true
    }

    /// Stop the polling loop and wait for it to exit.
    pub async fn stop(&self) {
        let running = self.worker.lock().take();
        if let Some((stop, handle)) = running {
            stop.cancel();
            let _ = handle.await;
            info!("[uv-04] tx broadcaster stopped");
        }
    }

    /// True while the polling loop is alive.
    pub fn is_running(&self) -> bool {
        self.worker
            .lock()
            .as_ref()
            .map(|(_, handle)| !handle.is_finished())
            .unwrap_or(false)
    }

    async fn run(&self, parent: RunContext, stop: RunContext) {
        let period = self.config.check_interval();
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = parent.cancelled() => return,
                _ = stop.cancelled() => return,
                _ = ticker.tick() => {}
            }
            tokio::select! {
                _ = stop.cancelled() => return,
                attempted = self.process_signed(&parent) => {
                    if attempted > 0 {
                        debug!(attempted, "[uv-04] processed signed events");
                    }
                }
            }
        }
    }
}
