//! # Ports Layer

pub mod outbound;

pub use outbound::{EventStore, StaticTssAddress, TssAddressProvider};
