//! # Metrics Endpoint
//!
//! Serves the Prometheus registry from `uv-telemetry` over HTTP.
//!
//! | Route | Response |
//! |-------|----------|
//! | `GET /metrics` | Prometheus text format |
//! | `GET /health` | `ok` |

use anyhow::{Context, Result};
use axum::{http::StatusCode, routing::get, Router};
use shared_types::RunContext;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// A bound, not yet serving, metrics endpoint.
pub struct MetricsServer {
    listener: TcpListener,
    addr: SocketAddr,
}

impl MetricsServer {
    /// Bind `addr`. Port 0 picks a free port.
    pub async fn bind(addr: SocketAddr) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind metrics endpoint on {addr}"))?;
        let addr = listener.local_addr()?;
        Ok(Self { listener, addr })
    }

    /// The bound address.
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Serve until `stop` is cancelled.
    pub fn spawn(self, stop: RunContext) -> JoinHandle<()> {
        let addr = self.addr;
        info!(addr = %addr, "[uv-node] metrics endpoint listening");
        tokio::spawn(async move {
            let shutdown = async move { stop.cancelled().await };
            if let Err(e) = axum::serve(self.listener, router())
                .with_graceful_shutdown(shutdown)
                .await
            {
                warn!(addr = %addr, error = %e, "[uv-node] metrics endpoint failed");
            }
        })
    }
}

fn router() -> Router {
    Router::new()
        .route("/metrics", get(scrape))
        .route("/health", get(|| async { "ok" }))
}

async fn scrape() -> (StatusCode, String) {
    match uv_telemetry::encode_metrics() {
        Ok(text) => (StatusCode::OK, text),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}
