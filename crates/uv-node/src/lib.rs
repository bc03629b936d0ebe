//! # Universal Validator Node
//!
//! Library half of the `uv-node` binary, exposed for tests.
//!
//! ## Startup Sequence
//!
//! 1. Load [`NodeConfig`] (TOML file, then environment overrides)
//! 2. Initialize telemetry
//! 3. Build the transport, chain cache, registry, UV manager, broadcaster
//! 4. Start the cache job, registry job, validator refresh and broadcaster loops
//! 5. Optionally compute a state-sync trust point
//! 6. Serve Prometheus metrics on `UV_METRICS_PORT` unless it is 0
//!
//! ## Shutdown
//!
//! Cancel the shared run context, stop every job (each waits for its
//! worker), stop live chain clients, close the transport.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod config;
pub mod metrics_server;
pub mod node;

pub use config::{ConfigError, NodeConfig, PeerEntry};
pub use metrics_server::MetricsServer;
pub use node::UniversalValidatorNode;
