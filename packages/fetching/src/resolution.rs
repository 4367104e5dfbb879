//! Singular and grouped loader steps
//!
//! Both variants run the rest of the pipeline first and then look at the
//! upstream result:
//!
//! - a single key is loaded with one `load_one` call,
//! - a list of keys is loaded with one `load_many` call; the singular step
//!   keeps the aligned list, the grouped step flattens the per-key values and
//!   drops duplicates by identity,
//! - anything else is left untouched.
//!
//! The result is only written once the load has fully succeeded, so a failed
//! or cancelled load leaves the upstream result in place.

use std::fmt;

use crate::context::MiddlewareContext;
use crate::error::{FetchError, FetchResult};
use crate::identity::EntitySet;
use crate::pipeline::Next;
use crate::registry::LoaderHandle;
use crate::value::FieldValue;

/// A loader step specialized for one field
#[derive(Clone)]
pub enum Resolution {
    /// One key loads one value
    Singular(LoaderHandle),
    /// Keys load collections that are merged into one deduplicated list
    Grouped(LoaderHandle),
}

/// Shape of the upstream result as seen by a loader step
enum Upstream {
    Key(FieldValue),
    Keys(Vec<FieldValue>),
    PassThrough,
}

impl Upstream {
    fn classify(result: &FieldValue, loader: &LoaderHandle) -> Self {
        match result {
            FieldValue::List(items) if items.iter().all(|item| loader.accepts(item)) => {
                Self::Keys(items.clone())
            }
            value @ FieldValue::Any(_) if loader.accepts(value) => Self::Key(value.clone()),
            _ => Self::PassThrough,
        }
    }
}

impl Resolution {
    pub fn loader(&self) -> &LoaderHandle {
        match self {
            Self::Singular(loader) | Self::Grouped(loader) => loader,
        }
    }

    pub fn is_grouped(&self) -> bool {
        matches!(self, Self::Grouped(_))
    }

    pub(crate) async fn invoke(
        &self,
        ctx: &mut MiddlewareContext,
        next: Next<'_>,
    ) -> FetchResult<()> {
        next.run(ctx).await?;

        let loader = self.loader();
        let upstream = Upstream::classify(ctx.result(), loader);

        let resolved = match upstream {
            Upstream::PassThrough => {
                tracing::trace!(
                    field = %ctx.field_name(),
                    loader = %loader.name(),
                    "Upstream result is not a key, passing through"
                );
                return Ok(());
            }
            Upstream::Key(key) => {
                tracing::debug!(
                    field = %ctx.field_name(),
                    loader = %loader.name(),
                    "Loading single key"
                );
                let loading = loader.load_one(ctx.loaders(), &key, ctx.cancellation());
                cancellable(ctx, loading).await?
            }
            Upstream::Keys(keys) if keys.is_empty() => FieldValue::List(Vec::new()),
            Upstream::Keys(keys) => {
                tracing::debug!(
                    field = %ctx.field_name(),
                    loader = %loader.name(),
                    keys = keys.len(),
                    grouped = self.is_grouped(),
                    "Loading key batch"
                );
                let loading = loader.load_many(ctx.loaders(), &keys, ctx.cancellation());
                let values = cancellable(ctx, loading).await?;
                match self {
                    Self::Singular(_) => FieldValue::List(values),
                    Self::Grouped(_) => flatten(values),
                }
            }
        };

        ctx.set_result(resolved);
        Ok(())
    }
}

/// Await a load unless the request is cancelled first
///
/// Loaders are expected to honour the token themselves; racing it here keeps
/// the no-partial-write guarantee for loaders that do not.
async fn cancellable<T>(
    ctx: &MiddlewareContext,
    loading: impl std::future::Future<Output = FetchResult<T>>,
) -> FetchResult<T> {
    let outcome = tokio::select! {
        biased;
        _ = ctx.cancellation().cancelled() => Err(FetchError::Cancelled),
        loaded = loading => loaded,
    };

    if let Err(FetchError::Cancelled) = &outcome {
        tracing::warn!(
            field = %ctx.field_name(),
            "Load cancelled, field result left unchanged"
        );
    }
    outcome
}

/// Merge per-key values into one list, each value once by identity
///
/// A list contributes its items, a missing value contributes nothing and any
/// other value contributes itself.
pub(crate) fn flatten(values: Vec<FieldValue>) -> FieldValue {
    let mut set = EntitySet::new();
    for value in values {
        match value {
            FieldValue::List(items) => set.extend(items),
            FieldValue::Null => {}
            value @ FieldValue::Any(_) => {
                set.insert(value);
            }
        }
    }
    FieldValue::List(set.into_vec())
}

impl fmt::Debug for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Singular(loader) => f.debug_tuple("Singular").field(&loader.name()).finish(),
            Self::Grouped(loader) => f.debug_tuple("Grouped").field(&loader.name()).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(values: &[FieldValue]) -> Vec<i32> {
        values
            .iter()
            .map(|value| *value.downcast_ref::<i32>().unwrap())
            .collect()
    }

    #[test]
    fn test_flatten_shared_values_once() {
        let a = FieldValue::owned_any(1_i32);
        let b = FieldValue::owned_any(2_i32);
        let c = FieldValue::owned_any(3_i32);

        let flattened = flatten(vec![
            FieldValue::list([a.clone()]),
            FieldValue::list([b.clone()]),
            FieldValue::list([b.clone()]),
            FieldValue::list([c.clone(), a.clone()]),
        ]);

        assert_eq!(ints(flattened.as_list().unwrap()), vec![1, 2, 3]);
    }

    #[test]
    fn test_flatten_treats_missing_and_empty_alike() {
        let a = FieldValue::owned_any(1_i32);

        let flattened = flatten(vec![
            FieldValue::Null,
            FieldValue::list([]),
            FieldValue::list([a.clone()]),
        ]);

        assert_eq!(flattened.as_list().unwrap().len(), 1);
    }

    #[test]
    fn test_flatten_single_values_per_key() {
        let a = FieldValue::owned_any(1_i32);
        let b = FieldValue::owned_any(2_i32);

        let flattened = flatten(vec![a.clone(), b.clone(), a.clone()]);

        assert_eq!(ints(flattened.as_list().unwrap()), vec![1, 2]);
    }
}
