//! Error types for field resolution
//!
//! Errors are split by the phase that raises them. [`ConfigurationError`] is
//! returned while a field or schema is being built and prevents the schema from
//! becoming servable. [`FetchError`] is returned while a request executes and
//! is propagated unchanged through every pipeline step.

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// Build-time errors raised while binding loaders to fields
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    // ========== Loader Resolution ==========
    /// The loader type does not expose a keyed loading capability
    #[error("{loader} is not a registered keyed loader")]
    InvalidLoader { loader: String },

    /// More than one registered loader type has this name
    #[error("`{loader}` names more than one registered loader")]
    AmbiguousLoader { loader: String },

    // ========== Pipeline Shape ==========
    /// A step with this key is already part of the field pipeline
    #[error("field `{field}` already has a `{step}` step")]
    DuplicateStep { field: String, step: String },

    /// The placeholder step to specialize is no longer in the pipeline
    #[error("field `{field}` has no `{step}` placeholder to specialize")]
    PlaceholderMissing { field: String, step: String },

    /// The placeholder step was already replaced by a concrete step
    #[error("field `{field}` step `{step}` was already specialized")]
    AlreadySpecialized { field: String, step: String },

    /// A placeholder survived finalization
    #[error("field `{field}` step `{step}` was never specialized")]
    UnresolvedPlaceholder { field: String, step: String },

    /// The loader's key/value types cannot back this field
    #[error("cannot specialize `{loader}` for field `{field}`: {reason}")]
    Specialization {
        field: String,
        loader: String,
        reason: String,
    },

    // ========== Field Definition ==========
    /// The field has no resolver producing the upstream result
    #[error("field `{field}` has no resolver")]
    MissingResolver { field: String },

    /// Two fields with the same name were declared on one type
    #[error("type `{type_name}` declares field `{field}` more than once")]
    DuplicateField { type_name: String, field: String },

    /// Two object types with the same name were added to a schema
    #[error("type `{type_name}` is declared more than once")]
    DuplicateType { type_name: String },
}

/// All configuration errors collected while building a schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaError {
    errors: Vec<ConfigurationError>,
}

impl SchemaError {
    pub(crate) fn new(errors: Vec<ConfigurationError>) -> Self {
        Self { errors }
    }

    /// The individual configuration errors, in declaration order
    pub fn errors(&self) -> &[ConfigurationError] {
        &self.errors
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "schema construction failed with {} error(s)", self.errors.len())?;
        for error in &self.errors {
            write!(f, "\n  - {}", error)?;
        }
        Ok(())
    }
}

impl StdError for SchemaError {}

/// Request-time errors raised while executing a field
#[derive(Error, Debug, Clone)]
pub enum FetchError {
    /// The request was cancelled before the load completed
    #[error("request cancelled")]
    Cancelled,

    /// The loader itself failed
    #[error("loader `{loader}` failed: {source}")]
    Load {
        loader: String,
        #[source]
        source: Arc<dyn StdError + Send + Sync>,
    },

    /// The loader returned a batch not aligned with the requested keys
    #[error("loader `{loader}` returned {actual} values for {expected} keys")]
    MisalignedBatch {
        loader: String,
        expected: usize,
        actual: usize,
    },

    /// No instance of the loader exists in the request scope
    #[error("loader `{loader}` is not available in this request")]
    LoaderUnavailable { loader: String },

    /// The upstream value is not of the loader's key type
    #[error("value is not a `{expected}` key")]
    KeyMismatch { expected: String },

    /// No field with this name exists on the type
    #[error("unknown field `{type_name}.{field}`")]
    UnknownField { type_name: String, field: String },

    /// A resolver reported an error
    #[error("resolver error: {0}")]
    Resolver(String),
}

impl FetchError {
    /// Wrap a loader failure, keeping the original error as the source
    pub fn load<E>(loader: impl Into<String>, error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::Load {
            loader: loader.into(),
            source: Arc::new(error),
        }
    }

    /// Shorthand for resolver failures
    pub fn resolver(message: impl Into<String>) -> Self {
        Self::Resolver(message.into())
    }

    /// Whether this error came from cancellation rather than a failure
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Result type for request-time operations
pub type FetchResult<T> = Result<T, FetchError>;
