//! # Adapters Layer

pub mod http;

pub use http::ReqwestFetcher;
