//! Loader registry: resolves a loader type to its key and value types
//!
//! Registration is the only place a loader's concrete types are seen. It
//! captures `L::Key` and `L::Value` into a [`LoaderDescriptor`] together with
//! an erased [`LoaderHandle`] that the resolution steps call at request time,
//! so binding a field never needs to inspect the loader type again.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use tokio_util::sync::CancellationToken;

use crate::error::{ConfigurationError, FetchError, FetchResult};
use crate::loader::{short_type_name, KeyedLoader, LoaderScope};
use crate::value::{FieldValue, LoadedValue, TypeRef};

/// Type-erased access to one registered loader
#[async_trait]
pub(crate) trait ErasedLoader: Send + Sync {
    /// Whether the value is exactly of the loader's key type
    fn accepts(&self, value: &FieldValue) -> bool;

    async fn load_one(
        &self,
        scope: &LoaderScope,
        key: &FieldValue,
        cancellation: &CancellationToken,
    ) -> FetchResult<FieldValue>;

    async fn load_many(
        &self,
        scope: &LoaderScope,
        keys: &[FieldValue],
        cancellation: &CancellationToken,
    ) -> FetchResult<Vec<FieldValue>>;
}

struct TypedLoader<L>(PhantomData<fn() -> L>);

impl<L: KeyedLoader> TypedLoader<L> {
    fn key(value: &FieldValue) -> FetchResult<L::Key> {
        value
            .downcast_ref::<L::Key>()
            .cloned()
            .ok_or_else(|| FetchError::KeyMismatch {
                expected: short_type_name::<L::Key>(),
            })
    }
}

#[async_trait]
impl<L: KeyedLoader> ErasedLoader for TypedLoader<L> {
    fn accepts(&self, value: &FieldValue) -> bool {
        value.downcast_ref::<L::Key>().is_some()
    }

    async fn load_one(
        &self,
        scope: &LoaderScope,
        key: &FieldValue,
        cancellation: &CancellationToken,
    ) -> FetchResult<FieldValue> {
        let key = Self::key(key)?;
        let loader = scope.get::<L>()?;
        let value = loader.load_one(key, cancellation).await?;
        Ok(value.map_or(FieldValue::Null, LoadedValue::into_field_value))
    }

    async fn load_many(
        &self,
        scope: &LoaderScope,
        keys: &[FieldValue],
        cancellation: &CancellationToken,
    ) -> FetchResult<Vec<FieldValue>> {
        let keys = keys.iter().map(Self::key).collect::<FetchResult<Vec<_>>>()?;
        let loader = scope.get::<L>()?;
        let values = loader.load_many(&keys, cancellation).await?;

        if values.len() != keys.len() {
            return Err(FetchError::MisalignedBatch {
                loader: short_type_name::<L>(),
                expected: keys.len(),
                actual: values.len(),
            });
        }

        Ok(values
            .into_iter()
            .map(|value| value.map_or(FieldValue::Null, LoadedValue::into_field_value))
            .collect())
    }
}

/// Shared handle to a registered loader, used by resolution steps
#[derive(Clone)]
pub struct LoaderHandle {
    name: Arc<str>,
    loader: Arc<dyn ErasedLoader>,
}

impl LoaderHandle {
    fn of<L: KeyedLoader>(name: &str) -> Self {
        Self {
            name: Arc::from(name),
            loader: Arc::new(TypedLoader::<L>(PhantomData)),
        }
    }

    /// Name of the loader type
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn accepts(&self, value: &FieldValue) -> bool {
        self.loader.accepts(value)
    }

    pub(crate) async fn load_one(
        &self,
        scope: &LoaderScope,
        key: &FieldValue,
        cancellation: &CancellationToken,
    ) -> FetchResult<FieldValue> {
        self.loader.load_one(scope, key, cancellation).await
    }

    pub(crate) async fn load_many(
        &self,
        scope: &LoaderScope,
        keys: &[FieldValue],
        cancellation: &CancellationToken,
    ) -> FetchResult<Vec<FieldValue>> {
        self.loader.load_many(scope, keys, cancellation).await
    }
}

impl fmt::Debug for LoaderHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("LoaderHandle").field(&self.name).finish()
    }
}

/// Key and value types of a registered loader
#[derive(Debug, Clone)]
pub struct LoaderDescriptor {
    loader_type: String,
    key_type: String,
    value_type: TypeRef,
    handle: LoaderHandle,
}

impl LoaderDescriptor {
    fn of<L: KeyedLoader>() -> Self {
        let loader_type = short_type_name::<L>();
        Self {
            key_type: short_type_name::<L::Key>(),
            value_type: <L::Value as LoadedValue>::output_type(),
            handle: LoaderHandle::of::<L>(&loader_type),
            loader_type,
        }
    }

    /// Name of the loader type
    pub fn loader_type(&self) -> &str {
        &self.loader_type
    }

    /// Name of the key type
    pub fn key_type(&self) -> &str {
        &self.key_type
    }

    /// Output type of one loaded value
    pub fn value_type(&self) -> &TypeRef {
        &self.value_type
    }

    /// Whether each key loads a list of values
    pub fn is_grouped(&self) -> bool {
        self.value_type.is_list()
    }

    pub fn handle(&self) -> &LoaderHandle {
        &self.handle
    }
}

type LoaderFactory = Arc<dyn Fn() -> Arc<dyn Any + Send + Sync> + Send + Sync>;

/// What a short loader name refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RegisteredName {
    Unique(TypeId),
    /// Two distinct types registered under the same name
    Ambiguous,
}

/// Build-time registry of keyed loaders
///
/// Fields resolve loaders against the registry when they are declared; the
/// same registry creates a fresh [`LoaderScope`] for every request from the
/// factories it was given.
#[derive(Clone, Default)]
pub struct LoaderRegistry {
    descriptors: IndexMap<TypeId, Arc<LoaderDescriptor>>,
    names: HashMap<String, RegisteredName>,
    factories: IndexMap<TypeId, LoaderFactory>,
}

impl LoaderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a loader whose instances are supplied per request by the caller
    pub fn register<L: KeyedLoader>(mut self) -> Self {
        self.add::<L>();
        self
    }

    /// Register a loader together with the factory creating its request instances
    pub fn register_with<L, F>(mut self, factory: F) -> Self
    where
        L: KeyedLoader,
        F: Fn() -> L + Send + Sync + 'static,
    {
        self.add::<L>();
        self.factories.insert(
            TypeId::of::<L>(),
            Arc::new(move || Arc::new(factory()) as Arc<dyn Any + Send + Sync>),
        );
        self
    }

    fn add<L: KeyedLoader>(&mut self) {
        let descriptor = LoaderDescriptor::of::<L>();
        tracing::debug!(
            loader = %descriptor.loader_type,
            key = %descriptor.key_type,
            value = %descriptor.value_type,
            "Registered keyed loader"
        );
        let id = TypeId::of::<L>();
        self.names
            .entry(descriptor.loader_type.clone())
            .and_modify(|name| {
                if *name != RegisteredName::Unique(id) {
                    tracing::warn!(
                        loader = %descriptor.loader_type,
                        "Loader name is shared by several types; lookups by name will fail"
                    );
                    *name = RegisteredName::Ambiguous;
                }
            })
            .or_insert(RegisteredName::Unique(id));
        self.descriptors
            .insert(TypeId::of::<L>(), Arc::new(descriptor));
    }

    /// Resolve a loader type to its descriptor
    pub fn resolve<L: 'static>(&self) -> Result<Arc<LoaderDescriptor>, ConfigurationError> {
        self.descriptors
            .get(&TypeId::of::<L>())
            .cloned()
            .ok_or_else(|| ConfigurationError::InvalidLoader {
                loader: short_type_name::<L>(),
            })
    }

    /// Resolve a loader by its registered type name
    pub fn resolve_named(&self, name: &str) -> Result<Arc<LoaderDescriptor>, ConfigurationError> {
        let id = match self.names.get(name) {
            Some(RegisteredName::Unique(id)) => id,
            Some(RegisteredName::Ambiguous) => {
                return Err(ConfigurationError::AmbiguousLoader {
                    loader: name.to_string(),
                })
            }
            None => {
                return Err(ConfigurationError::InvalidLoader {
                    loader: name.to_string(),
                })
            }
        };
        self.descriptors
            .get(id)
            .cloned()
            .ok_or_else(|| ConfigurationError::InvalidLoader {
                loader: name.to_string(),
            })
    }

    /// Registered descriptors, in registration order
    pub fn descriptors(&self) -> impl Iterator<Item = &LoaderDescriptor> {
        self.descriptors.values().map(|descriptor| descriptor.as_ref())
    }

    /// Create the loader instances for one request
    pub fn create_scope(&self) -> LoaderScope {
        let mut builder = LoaderScope::builder();
        for (id, factory) in &self.factories {
            builder.insert_erased(*id, factory());
        }
        builder.build()
    }
}

impl fmt::Debug for LoaderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoaderRegistry")
            .field("loaders", &self.names.keys().collect::<Vec<_>>())
            .field("factories", &self.factories.len())
            .finish()
    }
}
