//! # Universal Validator
//!
//! Entry point for the `uv-node` binary.
//!
//! ```text
//! uv-node [config.toml]
//! ```
//!
//! The config path may also come from `UV_CONFIG`. See [`uv_node::NodeConfig`]
//! for the file format and environment overrides.

use anyhow::{Context, Result};
use shared_types::RunContext;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use tracing::info;

use uv_node::{MetricsServer, NodeConfig, UniversalValidatorNode};
use uv_telemetry::{init_telemetry, TelemetryConfig};

fn config_path() -> Option<PathBuf> {
    std::env::args()
        .nth(1)
        .or_else(|| std::env::var("UV_CONFIG").ok())
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from)
}

#[tokio::main]
async fn main() -> Result<()> {
    let telemetry_config = TelemetryConfig::from_env();
    let metrics_port = telemetry_config.metrics_port;
    let _telemetry = init_telemetry(telemetry_config)
        .await
        .context("failed to initialize telemetry")?;

    let path = config_path();
    let mut config = NodeConfig::load(path.as_deref()).context("failed to load configuration")?;
    config.apply_env();

    let node = UniversalValidatorNode::build(config).await?;
    node.start().await?;

    let (metrics_stop, metrics_ctx) = RunContext::new();
    let metrics_task = if metrics_port != 0 {
        let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, metrics_port));
        Some(MetricsServer::bind(addr).await?.spawn(metrics_ctx))
    } else {
        None
    };

    info!("Node is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl+C")?;

    node.shutdown().await;
    metrics_stop.cancel();
    if let Some(task) = metrics_task {
        let _ = task.await;
    }
    Ok(())
}
