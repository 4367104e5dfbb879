//! Error handling for the catalog demo

use keyfetch_fetching::{FetchError, SchemaError};
use thiserror::Error;

/// Catalog error type
#[derive(Error, Debug)]
pub enum CatalogError {
    // ========== Schema Errors ==========
    /// The schema failed to build
    #[error(transparent)]
    Schema(#[from] SchemaError),

    // ========== Execution Errors ==========
    /// A field failed to execute
    #[error("field execution failed: {0}")]
    Fetch(#[from] FetchError),

    /// A field produced a value the renderer does not know
    #[error("cannot render value of field `{0}`")]
    Unrenderable(String),

    // ========== Serialization Errors ==========
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;
