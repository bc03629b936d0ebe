//! # Adapters Layer
//!
//! Concrete transport backends plus the frame codec and identity helpers
//! the libp2p backend needs.

pub mod codec;
pub mod identity;
pub mod libp2p;
pub mod memory;
