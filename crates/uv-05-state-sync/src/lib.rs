//! # UV-05 State Sync
//!
//! Finds a trusted `(height, hash)` pair on a remote CometBFT-style RPC
//! endpoint for bootstrapping light-client verification.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Search
//!
//! ```text
//! /status ──► latest height L
//!     for H in L-S, L-2S, ... (at most max_candidates):
//!         /block?height=H  ──ok──► TrustPoint{H, HASH}
//!              │ not found / malformed
//!              ▼
//!         /commit?height=H ──ok──► TrustPoint{H, HASH}
//!              │ fail
//!              ▼
//!         next H
//! ```
//!
//! Each candidate is tried once per endpoint. The search is a fallback
//! cascade, not a retry loop.
//!
//! ## Module Structure
//!
//! ```text
//! uv-05-state-sync/
//! ├── domain/          # TrustPoint, StateSyncError
//! ├── algorithms/      # candidate heights, response parsing
//! ├── ports/           # HttpFetcher + mock
//! ├── adapters/        # ReqwestFetcher
//! ├── application/     # TrustProvider
//! └── config.rs        # StateSyncConfig
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
pub use adapters::ReqwestFetcher;
pub use algorithms::candidate_heights;
pub use application::TrustProvider;
pub use config::StateSyncConfig;
pub use domain::{StateSyncError, TrustPoint};
pub use ports::{HttpFetcher, HttpReply, MockHttpFetcher};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    #[test]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
    }
}
