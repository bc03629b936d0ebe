//! # RocksDB Event Store
//!
//! Durable [`EventStore`] keeping one JSON record per event in the `events`
//! column family, keyed by event id. RocksDB iterates keys in byte order,
//! which gives the ascending-id pagination the port requires.

use parking_lot::Mutex;
use rocksdb::{ColumnFamilyDescriptor, Direction, IteratorMode, Options, WriteOptions, DB};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::domain::{BroadcastError, Event, EventStatus};
use crate::ports::EventStore;

/// Column family holding event records.
pub const CF_EVENTS: &str = "events";

/// RocksDB event store configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RocksDbEventStoreConfig {
    /// Database directory.
    pub path: PathBuf,
    /// fsync every write.
    pub sync_writes: bool,
}

impl Default for RocksDbEventStoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./data/events"),
            sync_writes: true,
        }
    }
}

impl RocksDbEventStoreConfig {
    /// Config for testing (no fsync).
    pub fn for_testing(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            sync_writes: false,
        }
    }
}

/// RocksDB-backed event store.
pub struct RocksDbEventStore {
    db: DB,
    config: RocksDbEventStoreConfig,
    // Serializes read-modify-write cycles.
    write_lock: Mutex<()>,
}

fn store_err(op: &str, e: impl std::fmt::Display) -> BroadcastError {
    BroadcastError::Store(format!("RocksDB {} failed: {}", op, e))
}

impl RocksDbEventStore {
    /// Open or create the database.
    pub fn open(config: RocksDbEventStoreConfig) -> Result<Self, BroadcastError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);
        opts.set_compression_type(rocksdb::DBCompressionType::Snappy);

        let mut cf_opts = Options::default();
        cf_opts.set_compression_type(rocksdb::DBCompressionType::Snappy);
        let cfs = vec![ColumnFamilyDescriptor::new(CF_EVENTS, cf_opts)];

        let db = DB::open_cf_descriptors(&opts, &config.path, cfs).map_err(|e| store_err("open", e))?;
        Ok(Self {
            db,
            config,
            write_lock: Mutex::new(()),
        })
    }

    fn cf(&self) -> Result<&rocksdb::ColumnFamily, BroadcastError> {
        self.db
            .cf_handle(CF_EVENTS)
            .ok_or_else(|| BroadcastError::Store(format!("missing column family {}", CF_EVENTS)))
    }

    fn read(&self, event_id: &str) -> Result<Option<Event>, BroadcastError> {
        let raw = self
            .db
            .get_cf(self.cf()?, event_id.as_bytes())
            .map_err(|e| store_err("get", e))?;
        raw.map(|bytes| decode(&bytes)).transpose()
    }

    fn write(&self, event: &Event) -> Result<(), BroadcastError> {
        let bytes = serde_json::to_vec(event).map_err(|e| store_err("encode", e))?;
        let mut write_opts = WriteOptions::default();
        write_opts.set_sync(self.config.sync_writes);
        self.db
            .put_cf_opt(self.cf()?, event.event_id.as_bytes(), bytes, &write_opts)
            .map_err(|e| store_err("put", e))
    }

    fn update<F>(&self, event_id: &str, f: F) -> Result<(), BroadcastError>
    where
        F: FnOnce(&mut Event) -> Result<(), BroadcastError>,
    {
        let _guard = self.write_lock.lock();
        let mut event = self
            .read(event_id)?
            .ok_or_else(|| BroadcastError::EventNotFound(event_id.to_string()))?;
        f(&mut event)?;
        self.write(&event)
    }
}

fn decode(bytes: &[u8]) -> Result<Event, BroadcastError> {
    serde_json::from_slice(bytes).map_err(|e| store_err("decode", e))
}

impl EventStore for RocksDbEventStore {
    fn insert(&self, event: Event) -> Result<(), BroadcastError> {
        let _guard = self.write_lock.lock();
        if self.read(&event.event_id)?.is_some() {
            return Err(BroadcastError::Store(format!(
                "event {} already exists",
                event.event_id
            )));
        }
        self.write(&event)
    }

    fn get_event(&self, event_id: &str) -> Result<Option<Event>, BroadcastError> {
        self.read(event_id)
    }

    fn get_signed_events(
        &self,
        after: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Event>, BroadcastError> {
        let mode = match after {
            Some(id) => IteratorMode::From(id.as_bytes(), Direction::Forward),
            None => IteratorMode::Start,
        };

        let mut out = Vec::new();
        for item in self.db.iterator_cf(self.cf()?, mode) {
            let (key, value) = item.map_err(|e| store_err("iterate", e))?;
            if after.is_some_and(|id| key.as_ref() == id.as_bytes()) {
                continue;
            }
            let event = decode(&value)?;
            if event.status == EventStatus::Signed {
                out.push(event);
                if out.len() >= limit {
                    break;
                }
            }
        }
        Ok(out)
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
