//! # Adapters Layer
//!
//! Event store implementations.

pub mod memory;
#[cfg(feature = "rocksdb")]
pub mod rocksdb_store;

pub use memory::InMemoryEventStore;
#[cfg(feature = "rocksdb")]
pub use rocksdb_store::{RocksDbEventStore, RocksDbEventStoreConfig};
