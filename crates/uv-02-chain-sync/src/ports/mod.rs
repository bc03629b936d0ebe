//! # Ports Layer
//!
//! Outbound dependencies of the chain sync jobs.

pub mod outbound;

pub use outbound::{
    ChainClientFactory, ChainClientRegistry, ChainConfigSource, MockChainClientFactory,
    MockChainConfigSource,
};
