//! # Domain Layer
//!
//! Persisted events, their status machine and the broadcaster errors.

pub mod errors;
pub mod event;

pub use errors::BroadcastError;
pub use event::{Event, EventStatus, SignedEventData, SigningData};
