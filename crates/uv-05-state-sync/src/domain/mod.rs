//! # Domain Layer

pub mod errors;

pub use errors::StateSyncError;

use serde::{Deserialize, Serialize};

/// Trusted `(height, hash)` pair. `hash` is uppercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustPoint {
    /// Block height.
    pub height: u64,
    /// Block hash, uppercase hex.
    pub hash: String,
}
