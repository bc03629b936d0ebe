//! # Events
//!
//! Locally persisted signing events. The broadcaster only ever moves an
//! event from `SIGNED` to `BROADCASTED`; other transitions belong to the
//! signing and vote pipelines.

use serde::{Deserialize, Serialize};
use shared_types::OutboundCreatedEvent;
use std::fmt;

use super::errors::BroadcastError;

/// Lifecycle status of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventStatus {
    /// Waiting for a signing round.
    Pending,
    /// Signing round running.
    InProgress,
    /// Signature persisted, not yet on the destination chain.
    Signed,
    /// Transaction sent (or observed consumed) on the destination chain.
    Broadcasted,
    /// Confirmed and voted.
    Completed,
    /// Reverted on the destination chain.
    Reverted,
    /// Expired before completion.
    Expired,
}

impl EventStatus {
    /// No further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            EventStatus::Completed | EventStatus::Reverted | EventStatus::Expired
        )
    }

    /// Whether `self -> next` is allowed. `InProgress -> Pending` is the
    /// restart reset; every other edge moves forward.
    pub fn can_transition_to(self, next: EventStatus) -> bool {
        use EventStatus::*;
        match (self, next) {
            (Pending, InProgress) | (Pending, Expired) => true,
            (InProgress, Pending)
            | (InProgress, Signed)
            | (InProgress, Reverted)
            | (InProgress, Expired) => true,
            (Signed, Broadcasted) | (Signed, Reverted) | (Signed, Expired) => true,
            (Broadcasted, Completed) | (Broadcasted, Reverted) | (Broadcasted, Expired) => true,
            _ => false,
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EventStatus::Pending => "PENDING",
            EventStatus::InProgress => "IN_PROGRESS",
            EventStatus::Signed => "SIGNED",
            EventStatus::Broadcasted => "BROADCASTED",
            EventStatus::Completed => "COMPLETED",
            EventStatus::Reverted => "REVERTED",
            EventStatus::Expired => "EXPIRED",
        };
        f.write_str(s)
    }
}

/// Signing parameters persisted when the event reached `SIGNED`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SigningData {
    /// Hex signature, 64 bytes or 65 with a recovery byte.
    pub signature: String,
    /// Hex digest that was signed.
    pub signing_hash: String,
    /// Destination nonce the transaction consumes.
    pub nonce: u64,
    /// Decimal gas price (EVM) or prioritization fee (SVM). Empty means zero.
    #[serde(default)]
    pub gas_price: String,
}

/// Event payload of a signed outbound: the creation event plus signing data.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SignedEventData {
    /// Outbound creation metadata.
    #[serde(flatten)]
    pub outbound: OutboundCreatedEvent,
    /// Present once signed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signing_data: Option<SigningData>,
}

impl SignedEventData {
    /// Parse `event_data` and require signing data.
    pub fn parse(event_data: &str) -> Result<(OutboundCreatedEvent, SigningData), BroadcastError> {
        let data: SignedEventData = serde_json::from_str(event_data)
            .map_err(|e| BroadcastError::InvalidEventData(e.to_string()))?;
        let signing = data.signing_data.ok_or(BroadcastError::MissingSigningData)?;
        Ok((data.outbound, signing))
    }

    /// Serialize to the stored JSON form.
    pub fn to_json(&self) -> String {
        // Plain structs of strings and integers always serialize.
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// A persisted event record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Unique id.
    pub event_id: String,
    /// Push chain block the event was observed at.
    pub block_height: u64,
    /// Block after which the event expires.
    pub expiry_block_height: u64,
    /// Event kind (`SIGN`, `KEYGEN`, ...).
    pub event_type: String,
    /// Current status.
    pub status: EventStatus,
    /// JSON payload, a [`SignedEventData`] for sign events.
    pub event_data: String,
    /// CAIP-qualified tx hash (`<chain>:<hash>`) once broadcast.
    #[serde(default)]
    pub broadcasted_tx_hash: Option<String>,
}

impl Event {
    /// A `SIGNED` sign event for `data`.
    pub fn signed(event_id: impl Into<String>, block_height: u64, data: &SignedEventData) -> Self {
        Self {
            event_id: event_id.into(),
            block_height,
            expiry_block_height: block_height.saturating_add(1_000),
            event_type: "SIGN".to_string(),
            status: EventStatus::Signed,
            event_data: data.to_json(),
            broadcasted_tx_hash: None,
        }
    }

    /// Move to `next`, rejecting backward or terminal-exit transitions.
    pub fn transition(&mut self, next: EventStatus) -> Result<(), BroadcastError> {
        if !self.status.can_transition_to(next) {
            return Err(BroadcastError::InvalidTransition {
                event_id: self.event_id.clone(),
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SignedEventData {
        SignedEventData {
            outbound: OutboundCreatedEvent {
                destination_chain: "eip155:11155111".to_string(),
                tx_id: "0xabc".to_string(),
                ..Default::default()
            },
            signing_data: Some(SigningData {
                signature: "aa".repeat(64),
                signing_hash: "bb".repeat(32),
                nonce: 7,
                gas_price: "1000000000".to_string(),
            }),
        }
    }

    #[test]
    fn test_transitions_are_monotonic() {
        assert!(EventStatus::Signed.can_transition_to(EventStatus::Broadcasted));
        assert!(!EventStatus::Broadcasted.can_transition_to(EventStatus::Signed));
        assert!(!EventStatus::Completed.can_transition_to(EventStatus::Pending));
        assert!(EventStatus::InProgress.can_transition_to(EventStatus::Pending));
        assert!(!EventStatus::Signed.can_transition_to(EventStatus::Signed));
    }

    #[test]
    fn test_terminal_states_have_no_exits() {
        use EventStatus::*;
        let all = [
            Pending,
            InProgress,
            Signed,
            Broadcasted,
            Completed,
            Reverted,
            Expired,
        ];
        for from in all.iter().filter(|s| s.is_terminal()) {
            assert!(all.iter().all(|to| !from.can_transition_to(*to)));
        }
    }

    #[test]
    fn test_signed_event_data_is_flat_json() {
        let json = sample().to_json();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["destination_chain"], "eip155:11155111");
        assert_eq!(value["signing_data"]["nonce"], 7);
    }

    #[test]
    fn test_parse_requires_signing_data() {
        let mut data = sample();
        data.signing_data = None;
        assert_eq!(
            SignedEventData::parse(&data.to_json()),
            Err(BroadcastError::MissingSigningData)
        );

        assert!(matches!(
            SignedEventData::parse("not json"),
            Err(BroadcastError::InvalidEventData(_))
        ));
    }

    #[test]
    fn test_parse_roundtrip_fields() {
        let (outbound, signing) = SignedEventData::parse(&sample().to_json()).unwrap();
        assert_eq!(outbound.tx_id, "0xabc");
        assert_eq!(signing.nonce, 7);
    }

    #[test]
    fn test_event_transition() {
        let mut event = Event::signed("ev-1", 10, &sample());
        event.transition(EventStatus::Broadcasted).unwrap();
        assert!(matches!(
            event.transition(EventStatus::Signed),
            Err(BroadcastError::InvalidTransition { .. })
        ));
        assert_eq!(event.status, EventStatus::Broadcasted);
    }

    #[test]
    fn test_status_serde_names() {
        let json = serde_json::to_string(&EventStatus::InProgress).unwrap();
        assert_eq!(json, "\"IN_PROGRESS\"");
    }
}
