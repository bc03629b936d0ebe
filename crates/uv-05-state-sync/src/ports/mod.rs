//! # Ports Layer

pub mod outbound;

pub use outbound::{HttpFetcher, HttpReply, MockHttpFetcher};
