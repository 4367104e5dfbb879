//! JSON rendering of field results

use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use keyfetch_fetching::FieldValue;

use crate::error::{CatalogError, CatalogResult};
use crate::models::{Album, Artist, Playlist, Track};

/// Render the result of `field` as JSON
///
/// Lists render item by item; a value of a type the catalog does not know
/// is an error.
pub fn render(field: &str, value: &FieldValue) -> CatalogResult<Value> {
    match value {
        FieldValue::Null => Ok(Value::Null),
        FieldValue::List(items) => items
            .iter()
            .map(|item| render(field, item))
            .collect::<CatalogResult<Vec<_>>>()
            .map(Value::Array),
        FieldValue::Any(_) => serialize_as::<Artist>(value)
            .or_else(|| serialize_as::<Album>(value))
            .or_else(|| serialize_as::<Track>(value))
            .or_else(|| serialize_as::<Playlist>(value))
            .or_else(|| serialize_as::<String>(value))
            .or_else(|| serialize_as::<i32>(value))
            .or_else(|| serialize_as::<Uuid>(value))
            .ok_or_else(|| CatalogError::Unrenderable(field.to_string()))?
            .map_err(CatalogError::from),
    }
}

fn serialize_as<T: Serialize + 'static>(value: &FieldValue) -> Option<serde_json::Result<Value>> {
    value.downcast_ref::<T>().map(serde_json::to_value)
}
