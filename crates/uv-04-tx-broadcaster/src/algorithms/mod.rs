//! # Algorithms
//!
//! Pure decoding of persisted signing data.

pub mod signing;

pub use signing::{decode_hex, normalize_signature, reconstruct_signing_req};
