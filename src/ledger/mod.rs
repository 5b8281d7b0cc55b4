//! Bounded, persisted history of review decisions.
//!
//! Records are kept newest first. Every mutation flushes the whole list to
//! the key-value store as JSON; `load()` reads it back once at startup and
//! treats anything unreadable as an empty history.

use crate::errors::StorageError;
use crate::review::DecisionRecord;
use crate::storage::KeyValueStore;
use std::sync::Arc;
use tracing::{debug, warn};

/// Default number of decisions kept.
pub const DEFAULT_CAPACITY: usize = 50;

/// Default storage key for the serialized history.
pub const DEFAULT_HISTORY_KEY: &str = "gavel.history";

pub struct DecisionLedger {
    store: Arc<dyn KeyValueStore>,
    key: String,
    capacity: usize,
    records: Vec<DecisionRecord>,
}

impl std::fmt::Debug for DecisionLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecisionLedger")
            .field("key", &self.key)
            .field("capacity", &self.capacity)
            .field("len", &self.records.len())
            .finish()
    }
}

impl DecisionLedger {
    /// Create an empty ledger. Capacity is clamped to at least one.
    pub fn new(store: Arc<dyn KeyValueStore>, key: &str, capacity: usize) -> Self {
        Self {
            store,
            key: key.to_string(),
            capacity: capacity.max(1),
            records: Vec::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Replace the in-memory history with what the store holds.
    ///
    /// Never fails: a missing key, unreadable store or malformed JSON all
    /// result in an empty history.
    pub fn load(&mut self) {
        self.records = match self.store.get(&self.key) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<DecisionRecord>>(&raw) {
                Ok(mut records) => {
                    records.truncate(self.capacity);
                    records
                }
                Err(e) => {
                    warn!(key = %self.key, error = %e, "Decision history is corrupt; starting empty");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(key = %self.key, error = %e, "Failed to read decision history; starting empty");
                Vec::new()
            }
        };
        debug!(key = %self.key, records = self.records.len(), "Loaded decision history");
    }

    /// Insert at the front, evict past capacity, then persist.
    ///
    /// The record is kept in memory even if persisting fails.
    pub fn append(&mut self, record: DecisionRecord) -> Result<(), StorageError> {
        self.records.insert(0, record);
        self.records.truncate(self.capacity);
        self.flush()
    }

    /// Newest first.
    pub fn list(&self) -> Vec<DecisionRecord> {
        self.records.clone()
    }

    pub fn latest(&self) -> Option<&DecisionRecord> {
        self.records.first()
    }

    pub fn clear(&mut self) -> Result<(), StorageError> {
        self.records.clear();
        self.flush()
    }

    fn flush(&self) -> Result<(), StorageError> {
        let json = serde_json::to_string(&self.records)
            .map_err(|e| StorageError::Other(anyhow::Error::new(e)))?;
        self.store.set(&self.key, &json)
    }
}
