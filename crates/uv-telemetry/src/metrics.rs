//! Prometheus metrics for the Universal Validator.
//!
//! All metrics follow the naming convention: `uv_<component>_<metric>_<unit>`
//!
//! ## Metric Types
//!
//! - **Counter**: Monotonically increasing value (e.g., cache_syncs_total)
//! - **Gauge**: Value that can go up or down (e.g., cached_chains)
//! - **Histogram**: Distribution of values (e.g., trust_search_duration_seconds)

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, Gauge, Histogram, HistogramOpts, Opts,
    Registry, TextEncoder,
};
use std::sync::Arc;

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // CHAIN CACHE / REGISTRY
    // =========================================================================

    /// Chain cache refreshes by outcome (success, empty, error)
    pub static ref CACHE_SYNCS: CounterVec = CounterVec::new(
        Opts::new("uv_chain_cache_syncs_total", "Chain cache refresh attempts by outcome"),
        &["outcome"]
    ).expect("metric creation failed");

    /// Chains currently held in the cache
    pub static ref CACHED_CHAINS: Gauge = Gauge::new(
        "uv_chain_cache_chains",
        "Number of chains in the current cache snapshot"
    ).expect("metric creation failed");

    /// Registry reconciliation passes
    pub static ref REGISTRY_RECONCILIATIONS: Counter = Counter::new(
        "uv_chain_registry_reconciliations_total",
        "Completed chain registry reconciliation passes"
    ).expect("metric creation failed");

    /// Per-chain add/update failures during reconciliation
    pub static ref REGISTRY_FAILURES: Counter = Counter::new(
        "uv_chain_registry_failures_total",
        "Chain clients that failed to add or update"
    ).expect("metric creation failed");

    /// Live chain clients
    pub static ref REGISTERED_CHAINS: Gauge = Gauge::new(
        "uv_chain_registry_clients",
        "Number of live chain clients"
    ).expect("metric creation failed");

    // =========================================================================
    // COORDINATOR
    // =========================================================================

    /// Coordinator elections computed
    pub static ref COORDINATOR_ELECTIONS: Counter = Counter::new(
        "uv_coordinator_elections_total",
        "Coordinator lookups answered"
    ).expect("metric creation failed");

    /// Validators in the cached set
    pub static ref VALIDATOR_SET_SIZE: Gauge = Gauge::new(
        "uv_coordinator_validator_set_size",
        "Validators in the cached universal validator set"
    ).expect("metric creation failed");

    // =========================================================================
    // BROADCASTER
    // =========================================================================

    /// Broadcast attempts by outcome
    pub static ref BROADCAST_OUTCOMES: CounterVec = CounterVec::new(
        Opts::new("uv_broadcaster_outcomes_total", "Per-event broadcast outcomes"),
        &["outcome"]
    ).expect("metric creation failed");

    // =========================================================================
    // TRANSPORT
    // =========================================================================

    /// Frames written to peers
    pub static ref FRAMES_SENT: Counter = Counter::new(
        "uv_transport_frames_sent_total",
        "Frames written to peers"
    ).expect("metric creation failed");

    /// Frames read from peers
    pub static ref FRAMES_RECEIVED: Counter = Counter::new(
        "uv_transport_frames_received_total",
        "Frames read from peers"
    ).expect("metric creation failed");

    /// Send failures (dial, stream open, write)
    pub static ref SEND_FAILURES: Counter = Counter::new(
        "uv_transport_send_failures_total",
        "Frames that could not be delivered"
    ).expect("metric creation failed");

    // =========================================================================
    // STATE SYNC
    // =========================================================================

    /// Trust point searches by outcome
    pub static ref TRUST_SEARCHES: CounterVec = CounterVec::new(
        Opts::new("uv_state_sync_trust_searches_total", "Trust point searches by outcome"),
        &["outcome"]
    ).expect("metric creation failed");

    /// Trust point search duration
    pub static ref TRUST_SEARCH_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "uv_state_sync_trust_search_duration_seconds",
            "Time spent searching for a trust point"
        ).buckets(exponential_buckets(0.01, 2.0, 12).expect("valid buckets"))
    ).expect("metric creation failed");
}

/// Handle for the registered metrics
pub struct MetricsHandle {
    _registry: Arc<Registry>,
}

/// Register all metrics with the global registry.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Chain cache / registry
        Box::new(CACHE_SYNCS.clone()),
        Box::new(CACHED_CHAINS.clone()),
        Box::new(REGISTRY_RECONCILIATIONS.clone()),
        Box::new(REGISTRY_FAILURES.clone()),
        Box::new(REGISTERED_CHAINS.clone()),
        // Coordinator
        Box::new(COORDINATOR_ELECTIONS.clone()),
        Box::new(VALIDATOR_SET_SIZE.clone()),
        // Broadcaster
        Box::new(BROADCAST_OUTCOMES.clone()),
        // Transport
        Box::new(FRAMES_SENT.clone()),
        Box::new(FRAMES_RECEIVED.clone()),
        Box::new(SEND_FAILURES.clone()),
        // State sync
        Box::new(TRUST_SEARCHES.clone()),
        Box::new(TRUST_SEARCH_DURATION.clone()),
    ];

    for metric in metrics {
        REGISTRY
            .register(metric)
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    }

    Ok(MetricsHandle {
        _registry: Arc::new(REGISTRY.clone()),
    })
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    /// Start a new timer for the given histogram.
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        self.histogram.observe(duration);
    }
}

/// Start timing for a histogram. Observation happens on drop.
#[macro_export]
macro_rules! time_histogram {
    ($histogram:expr) => {
        $crate::metrics::HistogramTimer::new(&$histogram)
    };
}
