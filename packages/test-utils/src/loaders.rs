//! Mock loaders
//!
//! Every mock records the calls it receives so tests can assert on batching
//! and on whether a loader was reached at all.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_graphql::dataloader::Loader;
use keyfetch_fetching::{async_trait, CancellationToken, FetchError, FetchResult, KeyedLoader};
use tokio::sync::Notify;

use crate::fixtures::{LoadFailure, Record, RecordStore};

/// A call received by a mock loader
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadCall {
    One(i32),
    Many(Vec<i32>),
}

#[derive(Clone, Default)]
struct CallLog {
    calls: Arc<Mutex<Vec<LoadCall>>>,
}

impl CallLog {
    fn push(&self, call: LoadCall) {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(call);
    }

    fn snapshot(&self) -> Vec<LoadCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

// ========== Singular ==========

/// Singular loader over a [`RecordStore`]
#[derive(Clone)]
pub struct MockRecordLoader {
    store: RecordStore,
    log: CallLog,
}

impl MockRecordLoader {
    pub fn new(store: RecordStore) -> Self {
        Self {
            store,
            log: CallLog::default(),
        }
    }

    /// Calls received so far, in order
    pub fn calls(&self) -> Vec<LoadCall> {
        self.log.snapshot()
    }

    pub fn call_count(&self) -> usize {
        self.calls().len()
    }
}

#[async_trait]
impl KeyedLoader for MockRecordLoader {
    type Key = i32;
    type Value = Arc<Record>;

    async fn load_one(
        &self,
        key: i32,
        _cancellation: &CancellationToken,
    ) -> FetchResult<Option<Arc<Record>>> {
        self.log.push(LoadCall::One(key));
        Ok(self.store.get(key))
    }

    async fn load_many(
        &self,
        keys: &[i32],
        _cancellation: &CancellationToken,
    ) -> FetchResult<Vec<Option<Arc<Record>>>> {
        self.log.push(LoadCall::Many(keys.to_vec()));
        Ok(keys.iter().map(|key| self.store.get(*key)).collect())
    }
}

// ========== Grouped ==========

/// Grouped loader mapping each key to a list of shared records
///
/// Groups are built from a [`RecordStore`], so the same record appearing
/// under two keys is the same allocation.
#[derive(Clone)]
pub struct MockGroupedLoader {
    groups: Arc<HashMap<i32, Vec<Arc<Record>>>>,
    log: CallLog,
}

impl MockGroupedLoader {
    /// Create a grouped loader from `(key, record ids)` pairs
    ///
    /// Record ids missing from the store are skipped.
    pub fn new(store: &RecordStore, groups: &[(i32, &[i32])]) -> Self {
        let groups = groups
            .iter()
            .map(|(key, ids)| {
                let records = ids.iter().filter_map(|id| store.get(*id)).collect();
                (*key, records)
            })
            .collect();

        Self {
            groups: Arc::new(groups),
            log: CallLog::default(),
        }
    }

    pub fn calls(&self) -> Vec<LoadCall> {
        self.log.snapshot()
    }
}

#[async_trait]
impl KeyedLoader for MockGroupedLoader {
    type Key = i32;
    type Value = Vec<Arc<Record>>;

    async fn load_one(
        &self,
        key: i32,
        _cancellation: &CancellationToken,
    ) -> FetchResult<Option<Vec<Arc<Record>>>> {
        self.log.push(LoadCall::One(key));
        Ok(self.groups.get(&key).cloned())
    }

    async fn load_many(
        &self,
        keys: &[i32],
        _cancellation: &CancellationToken,
    ) -> FetchResult<Vec<Option<Vec<Arc<Record>>>>> {
        self.log.push(LoadCall::Many(keys.to_vec()));
        Ok(keys.iter().map(|key| self.groups.get(key).cloned()).collect())
    }
}

// ========== Pending ==========

/// Loader that waits until released, ignoring cancellation
///
/// Used to check that a field step gives up on cancellation even when the
/// loader itself does not.
#[derive(Clone)]
pub struct PendingLoader {
    store: RecordStore,
    started: Arc<Notify>,
    release: Arc<Notify>,
    finished: Arc<AtomicUsize>,
}

impl PendingLoader {
    pub fn new(store: RecordStore) -> Self {
        Self {
            store,
            started: Arc::new(Notify::new()),
            release: Arc::new(Notify::new()),
            finished: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Wait until a load has started
    pub async fn wait_started(&self) {
        self.started.notified().await;
    }

    /// Let one waiting load complete
    pub fn release(&self) {
        self.release.notify_one();
    }

    /// Number of loads that ran to completion
    pub fn finished(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }

    async fn wait(&self) {
        self.started.notify_one();
        self.release.notified().await;
        self.finished.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl KeyedLoader for PendingLoader {
    type Key = i32;
    type Value = Arc<Record>;

    async fn load_one(
        &self,
        key: i32,
        _cancellation: &CancellationToken,
    ) -> FetchResult<Option<Arc<Record>>> {
        self.wait().await;
        Ok(self.store.get(key))
    }

    async fn load_many(
        &self,
        keys: &[i32],
        _cancellation: &CancellationToken,
    ) -> FetchResult<Vec<Option<Arc<Record>>>> {
        self.wait().await;
        Ok(keys.iter().map(|key| self.store.get(*key)).collect())
    }
}

// ========== Failing ==========

/// Loader that fails every call with a fixed message
#[derive(Clone)]
pub struct FailingLoader {
    message: String,
}

impl FailingLoader {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    fn failure(&self) -> FetchError {
        FetchError::load("FailingLoader", LoadFailure(self.message.clone()))
    }
}

#[async_trait]
impl KeyedLoader for FailingLoader {
    type Key = i32;
    type Value = Arc<Record>;

    async fn load_one(
        &self,
        _key: i32,
        _cancellation: &CancellationToken,
    ) -> FetchResult<Option<Arc<Record>>> {
        Err(self.failure())
    }

    async fn load_many(
        &self,
        _keys: &[i32],
        _cancellation: &CancellationToken,
    ) -> FetchResult<Vec<Option<Arc<Record>>>> {
        Err(self.failure())
    }
}

// ========== async-graphql ==========

/// async-graphql loader over a [`RecordStore`] that records each batch
#[derive(Clone)]
pub struct RecordBatchLoader {
    store: RecordStore,
    batches: Arc<Mutex<Vec<Vec<i32>>>>,
    failure: Option<String>,
}

impl RecordBatchLoader {
    pub fn new(store: RecordStore) -> Self {
        Self {
            store,
            batches: Arc::new(Mutex::new(Vec::new())),
            failure: None,
        }
    }

    /// A loader whose every batch fails with `message`
    pub fn failing(store: RecordStore, message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::new(store)
        }
    }

    /// Batches received so far, each sorted by key
    ///
    /// The dataloader does not promise an order within a batch.
    pub fn batches(&self) -> Vec<Vec<i32>> {
        self.batches
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl Loader<i32> for RecordBatchLoader {
    type Value = Arc<Record>;
    type Error = LoadFailure;

    async fn load(&self, keys: &[i32]) -> Result<HashMap<i32, Self::Value>, Self::Error> {
        let mut batch = keys.to_vec();
        batch.sort_unstable();
        self.batches
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(batch);

        if let Some(message) = &self.failure {
            return Err(LoadFailure(message.clone()));
        }

        Ok(keys
            .iter()
            .filter_map(|key| self.store.get(*key).map(|record| (*key, record)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_record_loader_records_calls() {
        let store = RecordStore::with_records(&[(1, "A")]);
        let loader = MockRecordLoader::new(store);
        let token = CancellationToken::new();

        assert!(loader.load_one(1, &token).await.unwrap().is_some());
        let many = loader.load_many(&[1, 2], &token).await.unwrap();

        assert!(many[1].is_none());
        assert_eq!(
            loader.calls(),
            vec![LoadCall::One(1), LoadCall::Many(vec![1, 2])]
        );
    }

    #[tokio::test]
    async fn test_grouped_loader_shares_records() {
        let store = RecordStore::with_records(&[(10, "A"), (11, "B")]);
        let loader = MockGroupedLoader::new(&store, &[(1, &[10, 11]), (2, &[11])]);
        let token = CancellationToken::new();

        let groups = loader.load_many(&[1, 2, 3], &token).await.unwrap();

        let first = groups[0].as_ref().unwrap();
        let second = groups[1].as_ref().unwrap();
        assert!(Arc::ptr_eq(&first[1], &second[0]));
        assert!(groups[2].is_none());
    }

    #[tokio::test]
    async fn test_failing_loader() {
        let loader = FailingLoader::new("backend down");
        let err = loader
            .load_one(1, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(err.to_string().contains("backend down"));
    }
}
