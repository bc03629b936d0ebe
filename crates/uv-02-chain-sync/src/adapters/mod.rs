//! # Adapters Layer
//!
//! Concrete implementation of the chain client registry.

pub mod registry;

pub use registry::ChainRegistry;
