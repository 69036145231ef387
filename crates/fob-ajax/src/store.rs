//! The recorder store: an append-only list of raw records.
//!
//! # Design Rationale
//!
//! We use Arc<Mutex<Vec<RawRecord>>> instead of channels because:
//! 1. The controller reads the whole history many times
//! 2. Completion order must be preserved
//! 3. There is exactly one writer, the recording transport
//!
//! There is deliberately no `clear` or `remove`. A store only goes away when
//! the context that owns it is reloaded.

use crate::record::RawRecord;
use std::sync::{Arc, Mutex, PoisonError};

/// Thread-safe, append-only accumulator of completed exchanges.
///
/// Cheaply cloneable; every clone observes the same records.
#[derive(Debug, Clone, Default)]
pub struct RecorderStore {
    records: Arc<Mutex<Vec<RawRecord>>>,
}

impl RecorderStore {
    /// Creates a new, empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record. Only the interceptor writes.
    pub(crate) fn push(&self, record: RawRecord) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record);
    }

    /// Returns every record in completion order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<RawRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the record at `index`, if one has been stored.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<RawRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(index)
            .cloned()
    }

    /// Returns the number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns true if nothing has been recorded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true if both handles point at the same underlying store.
    #[must_use]
    pub fn same_store(&self, other: &RecorderStore) -> bool {
        Arc::ptr_eq(&self.records, &other.records)
    }
}
