//! In-memory event store, ordered by event id.

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::ops::Bound;

use crate::domain::{BroadcastError, Event, EventStatus};
use crate::ports::EventStore;

/// Event store backed by a `BTreeMap`.
#[derive(Default)]
pub struct InMemoryEventStore {
    events: RwLock<BTreeMap<String, Event>>,
}

impl InMemoryEventStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored events.
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// True when no events are stored.
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }

    fn update<F>(&self, event_id: &str, f: F) -> Result<(), BroadcastError>
    where
        F: FnOnce(&mut Event) -> Result<(), BroadcastError>,
    {
        let mut events = self.events.write();
        let event = events
            .get_mut(event_id)
            .ok_or_else(|| BroadcastError::EventNotFound(event_id.to_string()))?;
        // Apply on a copy so a rejected transition leaves the record untouched.
        let mut next = event.clone();
        f(&mut next)?;
        *event = next;
        Ok(())
    }
}

impl EventStore for InMemoryEventStore {
    fn insert(&self, event: Event) -> Result<(), BroadcastError> {
        let mut events = self.events.write();
        if events.contains_key(&event.event_id) {
            return Err(BroadcastError::Store(format!(
                "event {} already exists",
                event.event_id
            )));
        }
        events.insert(event.event_id.clone(), event);
        Ok(())
    }

    fn get_event(&self, event_id: &str) -> Result<Option<Event>, BroadcastError> {
        Ok(self.events.read().get(event_id).cloned())
    }

    fn get_signed_events(
        &self,
        after: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Event>, BroadcastError> {
        let events = self.events.read();
        let lower = match after {
            Some(id) => Bound::Excluded(id.to_string()),
            None => Bound::Unbounded,
        };
        Ok(events
            .range((lower, Bound::Unbounded))
            .map(|(_, e)| e)
            .filter(|e| e.status == EventStatus::Signed)
            .take(limit)
            .cloned()
            .collect())
    }

    fn mark_broadcasted(
        &self,
        event_id: &str,
        caip_tx_hash: Option<String>,
    ) -> Result<(), BroadcastError> {
        self.update(event_id, |event| {
            event.transition(EventStatus::Broadcasted)?;
            if caip_tx_hash.is_some() {
                event.broadcasted_tx_hash = caip_tx_hash;
            }
            Ok(())
        })
    }

    fn update_status(&self, event_id: &str, status: EventStatus) -> Result<(), BroadcastError> {
        self.update(event_id, |event| event.transition(status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SignedEventData;

    fn event(id: &str) -> Event {
        Event::signed(id, 1, &SignedEventData::default())
    }

    #[test]
    fn test_signed_events_paginate_by_id() {
        let store = InMemoryEventStore::new();
        for id in ["e1", "e2", "e3", "e4"] {
            store.insert(event(id)).unwrap();
        }
        store.update_status("e2", EventStatus::Broadcasted).unwrap();

        let first = store.get_signed_events(None, 2).unwrap();
        let ids: Vec<_> = first.iter().map(|e| e.event_id.as_str()).collect();
        assert_eq!(ids, vec!["e1", "e3"]);

        let next = store.get_signed_events(Some("e3"), 2).unwrap();
        assert_eq!(next.len(), 1);
        assert_eq!(next[0].event_id, "e4");
    }

    #[test]
    fn test_duplicate_insert_rejected() {
        let store = InMemoryEventStore::new();
        store.insert(event("e1")).unwrap();
        assert!(store.insert(event("e1")).is_err());
    }

    #[test]
    fn test_mark_broadcasted_once() {
        let store = InMemoryEventStore::new();
        store.insert(event("e1")).unwrap();
        store
            .mark_broadcasted("e1", Some("eip155:1:0xabc".to_string()))
            .unwrap();

        let err = store.mark_broadcasted("e1", None).unwrap_err();
        assert!(matches!(err, BroadcastError::InvalidTransition { .. }));

        let stored = store.get_event("e1").unwrap().unwrap();
        assert_eq!(stored.status, EventStatus::Broadcasted);
        assert_eq!(stored.broadcasted_tx_hash.as_deref(), Some("eip155:1:0xabc"));
    }

    #[test]
    fn test_unknown_event() {
        let store = InMemoryEventStore::new();
        assert_eq!(
            store.mark_broadcasted("nope", None),
            Err(BroadcastError::EventNotFound("nope".to_string()))
        );
    }
}
