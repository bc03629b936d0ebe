//! # Application Layer
//!
//! Background jobs keeping the cache and the registry current.

pub mod cache_job;
mod job;
pub mod registry_job;

pub use cache_job::{ChainCacheJob, ChainCacheJobBuilder};
pub use registry_job::{ChainRegistryJob, ReconcileReport};
