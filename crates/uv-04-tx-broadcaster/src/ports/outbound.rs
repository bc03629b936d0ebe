//! # Outbound Ports
//!
//! Dependencies of the broadcaster: the local event store and the source of
//! the TSS group address used for nonce queries.

use async_trait::async_trait;

use crate::domain::{BroadcastError, Event, EventStatus};

/// Local persistence of signing events.
///
/// Implementations must apply [`Event::transition`] on every status change
/// so a `BROADCASTED` event can never return to `SIGNED`.
pub trait EventStore: Send + Sync {
    /// Store a new event. Fails when the id already exists.
    fn insert(&self, event: Event) -> Result<(), BroadcastError>;

    /// Look up one event.
    fn get_event(&self, event_id: &str) -> Result<Option<Event>, BroadcastError>;

    /// Up to `limit` `SIGNED` events with ids strictly greater than `after`,
    /// in ascending id order.
    fn get_signed_events(
        &self,
        after: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Event>, BroadcastError>;

    /// `SIGNED -> BROADCASTED`, recording the CAIP tx hash when known.
    fn mark_broadcasted(
        &self,
        event_id: &str,
        caip_tx_hash: Option<String>,
    ) -> Result<(), BroadcastError>;

    /// Generic status update, transition-checked.
    fn update_status(&self, event_id: &str, status: EventStatus) -> Result<(), BroadcastError>;
}

/// Resolves the TSS group address whose nonce gates EVM broadcasts.
#[async_trait]
pub trait TssAddressProvider: Send + Sync {
    /// Current TSS address on the destination chains.
    async fn tss_address(&self) -> Result<String, BroadcastError>;
}

/// Fixed TSS address.
#[derive(Debug, Clone)]
pub struct StaticTssAddress(pub String);

#[async_trait]
impl TssAddressProvider for StaticTssAddress {
    async fn tss_address(&self) -> Result<String, BroadcastError> {
        Ok(self.0.clone())
    }
}
