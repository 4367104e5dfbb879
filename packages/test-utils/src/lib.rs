//! Shared test utilities for keyfetch workspace
//!
//! This crate provides in-memory fixtures and mock loaders for testing field
//! resolution without a real backend.
//!
//! # Mock Loaders
//!
//! - [`MockRecordLoader`] - Singular loader that records every call
//! - [`MockGroupedLoader`] - Grouped loader returning shared records per key
//! - [`PendingLoader`] - Loader that never completes on its own, for cancellation tests
//! - [`FailingLoader`] - Loader that always fails
//! - [`RecordBatchLoader`] - async-graphql `Loader` for `BatchLoader` tests
//!
//! # Example
//!
//! ```rust,ignore
//! use keyfetch_test_utils::{MockRecordLoader, RecordStore};
//!
//! #[tokio::test]
//! async fn test_with_mocks() {
//!     let store = RecordStore::with_records(&[(1, "A"), (2, "B")]);
//!     let loader = MockRecordLoader::new(store);
//!
//!     // Insert the loader into a LoaderScope and execute fields against it
//! }
//! ```

mod fixtures;
mod loaders;

pub use fixtures::{LoadFailure, Record, RecordStore};
pub use loaders::{
    FailingLoader, LoadCall, MockGroupedLoader, MockRecordLoader, PendingLoader,
    RecordBatchLoader,
};
