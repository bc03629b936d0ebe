//! # UV-02 Chain Sync
//!
//! Keeps a live view of the external chains the validator serves.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! - [`ChainCache`]: atomically swapped snapshot of chain configs
//! - [`ChainCacheJob`]: refreshes the cache from the upstream config source,
//!   with a retrying initial sync and a force-sync trigger
//! - [`ChainRegistry`]: live per-chain clients built by a [`ChainClientFactory`]
//! - [`ChainRegistryJob`]: reconciles the registry against the cache
//!   (add/update active chains, sweep everything else)
//!
//! ## Module Structure
//!
//! ```text
//! uv-02-chain-sync/
//! ├── domain/          # ChainCache, ChainData, ChainSyncError
//! ├── ports/           # ChainConfigSource, ChainClientFactory, ChainClientRegistry + mocks
//! ├── adapters/        # ChainRegistry
//! ├── application/     # ChainCacheJob, ChainRegistryJob, shared job lifecycle
//! └── config.rs        # Job intervals and timeouts
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

// Re-exports
pub use adapters::ChainRegistry;
pub use application::{ChainCacheJob, ChainCacheJobBuilder, ChainRegistryJob, ReconcileReport};
pub use config::{ChainCacheJobConfig, ChainRegistryJobConfig};
pub use domain::{ChainCache, ChainData, ChainSyncError};
pub use ports::{
    ChainClientFactory, ChainClientRegistry, ChainConfigSource, MockChainClientFactory,
    MockChainConfigSource,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
