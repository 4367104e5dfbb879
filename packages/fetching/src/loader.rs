//! Keyed loader capability and request-scoped loader instances
//!
//! A [`KeyedLoader`] is the only thing the resolution steps know about the
//! backend: it turns one key into one value, or an ordered slice of keys into
//! values aligned with those keys. How it batches or caches is its own
//! business. Loader instances live in a [`LoaderScope`] created per request,
//! so every field of the request shares the same instance.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::{FetchError, FetchResult};
use crate::value::LoadedValue;

/// A loader that resolves values by key
///
/// Implementations must be safe to call concurrently from many fields of the
/// same request and should stop work once `cancellation` fires.
#[async_trait]
pub trait KeyedLoader: Send + Sync + 'static {
    /// Key produced by the upstream resolver
    type Key: Clone + Eq + Hash + Send + Sync + 'static;

    /// Value loaded for one key; a `Vec` makes the loader grouped
    type Value: LoadedValue;

    /// Load the value for a single key
    async fn load_one(
        &self,
        key: Self::Key,
        cancellation: &CancellationToken,
    ) -> FetchResult<Option<Self::Value>>;

    /// Load values for many keys
    ///
    /// The returned vector has one entry per key, in key order.
    async fn load_many(
        &self,
        keys: &[Self::Key],
        cancellation: &CancellationToken,
    ) -> FetchResult<Vec<Option<Self::Value>>>;
}

/// Short, human-readable name of a type for error messages and logs
pub(crate) fn short_type_name<T: ?Sized>() -> String {
    let full = type_name::<T>();
    match full.split_once('<') {
        Some((head, tail)) => {
            let head = head.rsplit("::").next().unwrap_or(head);
            format!("{}<{}", head, tail)
        }
        None => full.rsplit("::").next().unwrap_or(full).to_string(),
    }
}

/// Loader instances available to one request
#[derive(Clone, Default)]
pub struct LoaderScope {
    loaders: Arc<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
}

impl LoaderScope {
    /// Start building a scope by hand
    pub fn builder() -> LoaderScopeBuilder {
        LoaderScopeBuilder::default()
    }

    /// Get the request's instance of `L`
    pub fn get<L: KeyedLoader>(&self) -> FetchResult<Arc<L>> {
        self.loaders
            .get(&TypeId::of::<L>())
            .and_then(|loader| Arc::clone(loader).downcast::<L>().ok())
            .ok_or_else(|| FetchError::LoaderUnavailable {
                loader: short_type_name::<L>(),
            })
    }

    pub fn contains<L: KeyedLoader>(&self) -> bool {
        self.loaders.contains_key(&TypeId::of::<L>())
    }

    pub fn len(&self) -> usize {
        self.loaders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaders.is_empty()
    }
}

impl std::fmt::Debug for LoaderScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoaderScope")
            .field("loaders", &self.loaders.len())
            .finish()
    }
}

/// Builder for [`LoaderScope`]
#[derive(Default)]
pub struct LoaderScopeBuilder {
    loaders: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl LoaderScopeBuilder {
    /// Add a loader instance, replacing any previous instance of the same type
    pub fn insert<L: KeyedLoader>(mut self, loader: L) -> Self {
        self.loaders.insert(TypeId::of::<L>(), Arc::new(loader));
        self
    }

    /// Add an already shared loader instance
    pub fn insert_shared<L: KeyedLoader>(mut self, loader: Arc<L>) -> Self {
        self.loaders.insert(TypeId::of::<L>(), loader);
        self
    }

    pub(crate) fn insert_erased(&mut self, id: TypeId, loader: Arc<dyn Any + Send + Sync>) {
        self.loaders.insert(id, loader);
    }

    pub fn build(self) -> LoaderScope {
        LoaderScope {
            loaders: Arc::new(self.loaders),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct NumberLoader;

    #[async_trait]
    impl KeyedLoader for NumberLoader {
        type Key = i32;
        type Value = String;

        async fn load_one(
            &self,
            key: i32,
            _cancellation: &CancellationToken,
        ) -> FetchResult<Option<String>> {
            Ok(Some(key.to_string()))
        }

        async fn load_many(
            &self,
            keys: &[i32],
            _cancellation: &CancellationToken,
        ) -> FetchResult<Vec<Option<String>>> {
            Ok(keys.iter().map(|key| Some(key.to_string())).collect())
        }
    }

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name::<NumberLoader>(), "NumberLoader");
        assert_eq!(short_type_name::<Vec<i32>>(), "Vec<i32>");
    }

    #[test]
    fn test_scope_returns_the_inserted_instance() {
        let loader = Arc::new(NumberLoader);
        let scope = LoaderScope::builder()
            .insert_shared(Arc::clone(&loader))
            .build();

        let found = scope.get::<NumberLoader>().unwrap();
        assert!(Arc::ptr_eq(&loader, &found));
        assert_eq!(scope.len(), 1);
    }

    #[test]
    fn test_scope_reports_missing_loader() {
        let scope = LoaderScope::default();
        let err = scope.get::<NumberLoader>().unwrap_err();
        assert!(matches!(
            err,
            FetchError::LoaderUnavailable { loader } if loader == "NumberLoader"
        ));
        assert!(scope.is_empty());
    }
}
