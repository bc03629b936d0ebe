//! # UV Telemetry
//!
//! Logging, tracing and metrics for the Universal Validator.
//!
//! ## Components
//!
//! - Structured logs through `tracing-subscriber` (pretty or JSON)
//! - Optional span export through OpenTelemetry OTLP
//! - Prometheus metrics shared by every subsystem crate
//!
//! ## Usage
//!
//! ```rust,ignore
//! use uv_telemetry::{TelemetryConfig, init_telemetry};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = TelemetryConfig::from_env();
//!     let _guard = init_telemetry(config).await.expect("Failed to init telemetry");
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `OTEL_EXPORTER_OTLP_ENDPOINT` | unset | OTLP endpoint, export disabled when unset |
//! | `OTEL_SERVICE_NAME` | `universal-validator` | Service name in traces |
//! | `UV_LOG_LEVEL` | `info` | Log level filter |
//! | `UV_JSON_LOGS` | `false` (`true` in containers) | JSON log lines |
//! | `UV_METRICS_PORT` | `9100` | Prometheus scrape port, `0` disables it |

#![warn(missing_docs)]
#![warn(clippy::all)]

mod config;
pub mod metrics;
mod tracing_setup;

pub use config::TelemetryConfig;
pub use metrics::{
    encode_metrics, register_metrics, MetricsHandle, BROADCAST_OUTCOMES, CACHED_CHAINS,
    CACHE_SYNCS, COORDINATOR_ELECTIONS, FRAMES_RECEIVED, FRAMES_SENT, REGISTERED_CHAINS,
    REGISTRY_FAILURES, REGISTRY_RECONCILIATIONS, SEND_FAILURES, TRUST_SEARCHES,
    TRUST_SEARCH_DURATION, VALIDATOR_SET_SIZE,
};
pub use tracing_setup::TracingGuard;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// Subscriber or OTLP pipeline could not be installed.
    #[error("Failed to initialize tracing: {0}")]
    TracerInit(String),

    /// Metric registration or encoding failed.
    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    /// Invalid filter directive or other configuration problem.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize metrics and the global tracing subscriber.
///
/// Returns a guard that must be held for the lifetime of the application.
/// When dropped, it flushes pending spans.
pub async fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let metrics_handle = register_metrics()?;
    let tracing_guard = tracing_setup::init_tracing(&config).await?;

    Ok(TelemetryGuard {
        _tracing: tracing_guard,
        _metrics: metrics_handle,
    })
}

/// Guard that keeps telemetry active. Drop to flush and shutdown.
pub struct TelemetryGuard {
    _tracing: TracingGuard,
    _metrics: MetricsHandle,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!("Shutting down telemetry...");
    }
}

/// Convenience macro for recording a metric increment.
#[macro_export]
macro_rules! metric_inc {
    ($metric:expr) => {
        $metric.inc()
    };
    ($metric:expr, $labels:expr) => {
        $metric.with_label_values($labels).inc()
    };
}

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_metric_inc_macro() {
        metric_inc!(REGISTRY_RECONCILIATIONS);
        metric_inc!(BROADCAST_OUTCOMES, &["broadcasted"]);
        assert!(REGISTRY_RECONCILIATIONS.get() >= 1.0);
    }
}
