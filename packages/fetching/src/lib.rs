//! Batched, deduplicated field resolution for keyfetch
//!
//! This crate sits between a graph-query executor and its data sources. A
//! field's resolver produces a key (or a list of keys); a loader step bound to
//! the field sends those keys through a shared, request-scoped keyed loader
//! and replaces the field result with what was loaded.
//!
//! There are two kinds of loader step:
//! - Singular: one key loads one value
//! - Grouped: many keys load per-key collections, which are flattened and
//!   deduplicated by identity
//!
//! The step kind is chosen once, when the field is finalized, from the
//! loader's value type and the field's declared output type.
//!
//! # Example
//!
//! ```rust,ignore
//! use keyfetch_fetching::{FieldDefinition, LoaderRegistry, ObjectTypeBuilder, SchemaBuilder, TypeRef};
//!
//! let registry = LoaderRegistry::new()
//!     .register_with(|| BatchLoader::new(ArtistLoader::new(catalog.clone())));
//!
//! let album = ObjectTypeBuilder::new("Album").try_field(
//!     FieldDefinition::new("artist", TypeRef::named("ID"))
//!         .resolve_with(|ctx| async move { /* produce the artist id */ })
//!         .use_loader::<BatchLoader<Uuid, ArtistLoader>>(&registry),
//! );
//!
//! let schema = SchemaBuilder::new(registry).object(album).build()?;
//! ```

mod batch;
mod binder;
mod context;
mod error;
mod field;
mod identity;
mod loader;
mod pipeline;
mod registry;
mod resolution;
mod schema;
mod value;

pub use batch::BatchLoader;
pub use binder::LoaderBinding;
pub use context::{MiddlewareContext, RequestContext, ResolverContext};
pub use error::{ConfigurationError, FetchError, FetchResult, SchemaError};
pub use field::{FieldConfiguration, FieldDefinition, ObjectField};
pub use identity::{EntitySet, Identify, IdentityToken};
pub use loader::{KeyedLoader, LoaderScope, LoaderScopeBuilder};
pub use pipeline::{resolver_fn, FieldMiddleware, Next, PipelineStep, Resolver, StepKey};
pub use registry::{LoaderDescriptor, LoaderHandle, LoaderRegistry};
pub use resolution::Resolution;
pub use schema::{ObjectType, ObjectTypeBuilder, Schema, SchemaBuilder};
pub use value::{Entity, FieldValue, LoadedValue, TypeRef};

// Re-exported so loader implementations and callers share one version.
pub use async_trait::async_trait;
pub use tokio_util::sync::CancellationToken;
