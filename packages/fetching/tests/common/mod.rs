//! Common helpers for field resolution integration tests

#![allow(dead_code)]

use keyfetch_fetching::{FieldDefinition, FieldValue, TypeRef};

pub use keyfetch_test_utils::*;

/// A field whose resolver always produces `value`
///
/// The same value is handed out on every call, so identity checks against
/// `value` hold for pass-through results.
pub fn field_returning(name: &str, output: TypeRef, value: FieldValue) -> FieldDefinition {
    FieldDefinition::new(name, output).resolve_with(move |_| {
        let value = value.clone();
        async move { Ok(value) }
    })
}

/// A list of integer keys
pub fn int_keys(keys: &[i32]) -> FieldValue {
    FieldValue::list(keys.iter().map(|key| FieldValue::owned_any(*key)))
}

/// Record names of a list result, `None` for nulls
pub fn record_names(value: &FieldValue) -> Vec<Option<String>> {
    value
        .as_list()
        .unwrap_or_default()
        .iter()
        .map(|item| item.downcast_ref::<Record>().map(|record| record.name.clone()))
        .collect()
}
