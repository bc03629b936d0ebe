//! # Application Layer

pub mod broadcaster;

pub use broadcaster::{BroadcastOutcome, TxBroadcaster};
