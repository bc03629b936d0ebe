//! # Integration Flows

pub mod broadcast_flow;
pub mod chain_sync_flow;
pub mod transport_flow;
