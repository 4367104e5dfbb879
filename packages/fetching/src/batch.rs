//! async-graphql `DataLoader` as a keyed loader
//!
//! The batching primitive is async-graphql's dataloader: any
//! [`Loader`](async_graphql::dataloader::Loader) written for it can back a
//! field by wrapping it in a [`BatchLoader`].
//!
//! # Example
//!
//! ```rust,ignore
//! let registry = LoaderRegistry::new()
//!     .register_with(move || BatchLoader::with_config(TrackLoader::new(pool.clone()), &batching));
//! ```

use std::collections::HashMap;
use std::error::Error as StdError;
use std::hash::Hash;
use std::marker::PhantomData;

use async_graphql::dataloader::{DataLoader, Loader};
use async_trait::async_trait;
use keyfetch_shared_config::BatchingConfig;
use tokio_util::sync::CancellationToken;

use crate::error::{FetchError, FetchResult};
use crate::loader::{short_type_name, KeyedLoader};
use crate::value::LoadedValue;

/// Keyed loader backed by an async-graphql [`DataLoader`]
pub struct BatchLoader<K, L>
where
    L: Loader<K>,
    K: Send + Sync + Hash + Eq + Clone + 'static,
{
    inner: DataLoader<L>,
    _key: PhantomData<fn(K)>,
}

impl<K, L> BatchLoader<K, L>
where
    L: Loader<K>,
    K: Send + Sync + Hash + Eq + Clone + 'static,
{
    /// Wrap a loader with async-graphql's default batching settings
    pub fn new(loader: L) -> Self {
        Self {
            inner: DataLoader::new(loader, tokio::spawn),
            _key: PhantomData,
        }
    }

    /// Wrap a loader with batch size and delay taken from configuration
    pub fn with_config(loader: L, config: &BatchingConfig) -> Self {
        Self {
            inner: DataLoader::new(loader, tokio::spawn)
                .max_batch_size(config.max_batch_size)
                .delay(config.delay()),
            _key: PhantomData,
        }
    }

    /// The wrapped loader
    pub fn loader(&self) -> &L {
        self.inner.loader()
    }
}

#[async_trait]
impl<K, L> KeyedLoader for BatchLoader<K, L>
where
    L: Loader<K>,
    L::Value: LoadedValue,
    L::Error: StdError + Send + Sync + 'static,
    K: Send + Sync + Hash + Eq + Clone + 'static,
{
    type Key = K;
    type Value = L::Value;

    async fn load_one(
        &self,
        key: K,
        cancellation: &CancellationToken,
    ) -> FetchResult<Option<L::Value>> {
        tokio::select! {
            biased;
            _ = cancellation.cancelled() => Err(FetchError::Cancelled),
            loaded = self.inner.load_one(key) => {
                loaded.map_err(|e| FetchError::load(short_type_name::<L>(), e))
            }
        }
    }

    async fn load_many(
        &self,
        keys: &[K],
        cancellation: &CancellationToken,
    ) -> FetchResult<Vec<Option<L::Value>>> {
        let loaded: HashMap<K, L::Value> = tokio::select! {
            biased;
            _ = cancellation.cancelled() => return Err(FetchError::Cancelled),
            loaded = self.inner.load_many(keys.iter().cloned()) => {
                loaded.map_err(|e| FetchError::load(short_type_name::<L>(), e))?
            }
        };

        // The dataloader answers with a map; re-align it to the key order.
        Ok(keys.iter().map(|key| loaded.get(key).cloned()).collect())
    }
}
