//! BatchLoader integration tests
//!
//! Exercises the async-graphql dataloader adapter against a recording loader:
//! - Concurrent loads coalesce into one batch
//! - Duplicate keys are fetched once but answered per position
//! - A full batch is dispatched without waiting for the delay
//! - Loader errors keep their source

mod common;

use std::error::Error as _;
use std::sync::Arc;

use assert_matches::assert_matches;
use common::*;
use keyfetch_fetching::{BatchLoader, CancellationToken, FetchError, KeyedLoader};
use keyfetch_shared_config::BatchingConfig;
use rstest::rstest;

type RecordBatch = BatchLoader<i32, RecordBatchLoader>;

fn store() -> RecordStore {
    RecordStore::with_records(&[(1, "A"), (2, "B"), (3, "C"), (4, "D")])
}

#[tokio::test]
async fn test_concurrent_loads_coalesce() {
    let loader = RecordBatch::new(RecordBatchLoader::new(store()));
    let token = CancellationToken::new();

    let (a, b, many) = tokio::join!(
        loader.load_one(1, &token),
        loader.load_one(2, &token),
        loader.load_many(&[3, 4], &token),
    );

    assert_eq!(a.unwrap().unwrap().name, "A");
    assert_eq!(b.unwrap().unwrap().name, "B");
    assert_eq!(many.unwrap().len(), 2);
    assert_eq!(loader.loader().batches(), vec![vec![1, 2, 3, 4]]);
}

#[tokio::test]
async fn test_duplicate_keys_fetched_once() {
    let loader = RecordBatch::new(RecordBatchLoader::new(store()));
    let token = CancellationToken::new();

    let values = loader.load_many(&[2, 2, 9, 2], &token).await.unwrap();

    assert_eq!(values.len(), 4);
    assert!(values[2].is_none());
    let first = values[0].as_ref().unwrap();
    assert!(Arc::ptr_eq(first, values[3].as_ref().unwrap()));
    assert_eq!(loader.loader().batches(), vec![vec![2, 9]]);
}

#[rstest]
#[case::dispatch_each_key(1, 3)]
#[case::wait_for_delay(10, 1)]
#[tokio::test]
async fn test_batch_size_from_config(#[case] max_batch_size: usize, #[case] batches: usize) {
    let config = BatchingConfig {
        max_batch_size,
        delay_ms: 1,
    };
    let loader = RecordBatch::with_config(RecordBatchLoader::new(store()), &config);
    let token = CancellationToken::new();

    let (a, b, c) = tokio::join!(
        loader.load_one(1, &token),
        loader.load_one(2, &token),
        loader.load_one(3, &token),
    );

    assert!([a, b, c].iter().all(|loaded| matches!(loaded, Ok(Some(_)))));
    assert_eq!(loader.loader().batches().len(), batches);
}

#[tokio::test]
async fn test_batch_failure_keeps_source() {
    let loader = RecordBatch::new(RecordBatchLoader::failing(store(), "database offline"));

    let err = loader
        .load_many(&[1, 2], &CancellationToken::new())
        .await
        .unwrap_err();

    assert_matches!(err, FetchError::Load { ref loader, .. } if loader == "RecordBatchLoader");
    let source = err.source().unwrap();
    assert_eq!(source.to_string(), "database offline");
}
