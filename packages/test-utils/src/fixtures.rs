//! In-memory records for loader tests
//!
//! # Lock Poisoning Recovery
//!
//! Locks are taken with `unwrap_or_else(|e| e.into_inner())` so a test that
//! panics while holding a lock does not cascade into unrelated failures.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use keyfetch_fetching::Entity;
use thiserror::Error;

/// A record with an integer id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub id: i32,
    pub name: String,
}

impl Entity for Record {
    const TYPE_NAME: &'static str = "Record";
}

/// Error returned by failing mocks
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct LoadFailure(pub String);

/// Shared in-memory record store
///
/// Records are stored as `Arc<Record>`; every lookup of the same id returns
/// the same allocation, which is what identity-based deduplication keys on.
///
/// # Example
///
/// ```rust
/// use keyfetch_test_utils::RecordStore;
///
/// let store = RecordStore::with_records(&[(1, "A")]);
/// let a = store.get(1).unwrap();
///
/// assert_eq!(a.name, "A");
/// assert!(std::sync::Arc::ptr_eq(&a, &store.get(1).unwrap()));
/// ```
#[derive(Clone, Default)]
pub struct RecordStore {
    records: Arc<RwLock<HashMap<i32, Arc<Record>>>>,
}

impl RecordStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-filled with `(id, name)` pairs
    pub fn with_records(records: &[(i32, &str)]) -> Self {
        let store = Self::new();
        for (id, name) in records {
            store.insert(*id, name);
        }
        store
    }

    /// Insert or replace a record, returning the stored allocation
    pub fn insert(&self, id: i32, name: &str) -> Arc<Record> {
        let record = Arc::new(Record {
            id,
            name: name.to_string(),
        });
        let mut records = self.records.write().unwrap_or_else(|e| e.into_inner());
        records.insert(id, Arc::clone(&record));
        record
    }

    /// Look up a record by id
    pub fn get(&self, id: i32) -> Option<Arc<Record>> {
        let records = self.records.read().unwrap_or_else(|e| e.into_inner());
        records.get(&id).cloned()
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.records.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_replaces_record() {
        let store = RecordStore::with_records(&[(1, "old")]);
        let replaced = store.insert(1, "new");

        assert_eq!(store.len(), 1);
        assert!(Arc::ptr_eq(&replaced, &store.get(1).unwrap()));
        assert_eq!(store.get(1).unwrap().name, "new");
    }

    #[test]
    fn test_clones_share_storage() {
        let store = RecordStore::new();
        let clone = store.clone();
        clone.insert(7, "seven");

        assert!(!store.is_empty());
        assert_eq!(store.get(7).unwrap().id, 7);
    }
}
