//! # Application Layer

pub mod provider;

pub use provider::TrustProvider;
