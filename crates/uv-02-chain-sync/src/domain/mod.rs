//! # Domain Layer
//!
//! The chain config cache and the errors of this subsystem.

pub mod cache;
pub mod errors;

pub use cache::{ChainCache, ChainData};
pub use errors::ChainSyncError;
