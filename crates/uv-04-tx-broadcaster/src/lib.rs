//! # UV-04 Transaction Broadcaster
//!
//! Pushes threshold-signed outbound transactions to their destination chains
//! exactly once, using the destination account nonce as the idempotency
//! oracle instead of cross-node locking.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Nonce Gating
//!
//! | Chain | Before broadcast | After failed broadcast |
//! |-------|------------------|------------------------|
//! | EVM | finalized nonce > event nonce → BROADCASTED, skip | finalized nonce > event nonce → BROADCASTED |
//! | SVM | current nonce > event nonce → BROADCASTED; < → wait | current nonce > event nonce → BROADCASTED |
//!
//! Anything else leaves the event SIGNED for the next tick.
//!
//! ## Module Structure
//!
//! ```text
//! uv-04-tx-broadcaster/
//! ├── domain/          # Event, EventStatus, SigningData, BroadcastError
//! ├── algorithms/      # signature normalisation, request reconstruction
//! ├── ports/           # EventStore, TssAddressProvider
//! ├── adapters/        # InMemoryEventStore, RocksDbEventStore (feature "rocksdb")
//! ├── application/     # TxBroadcaster + polling loop
//! └── config.rs        # BroadcasterConfig
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

// Re-exports
pub use adapters::InMemoryEventStore;
#[cfg(feature = "rocksdb")]
pub use adapters::{RocksDbEventStore, RocksDbEventStoreConfig};
pub use application::{BroadcastOutcome, TxBroadcaster};
pub use config::BroadcasterConfig;
pub use domain::{BroadcastError, Event, EventStatus, SignedEventData, SigningData};
pub use ports::{EventStore, StaticTssAddress, TssAddressProvider};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
