//! # Domain Layer

pub mod errors;
pub mod peer;

pub use errors::TransportError;
pub use peer::{is_unspecified, normalize_addrs};
