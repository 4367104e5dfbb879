//! Schema assembly
//!
//! A schema is only produced when every field of every type finalizes. All
//! configuration errors are collected and returned together, so a broken
//! binding is reported at build time and never reaches a request.

use std::sync::Arc;

use indexmap::map::Entry;
use indexmap::IndexMap;
use tokio_util::sync::CancellationToken;

use crate::context::RequestContext;
use crate::error::{ConfigurationError, FetchError, FetchResult, SchemaError};
use crate::field::{FieldDefinition, ObjectField};
use crate::registry::LoaderRegistry;
use crate::value::FieldValue;

/// Builder for one object type
#[derive(Debug)]
pub struct ObjectTypeBuilder {
    name: String,
    fields: Vec<FieldDefinition>,
    errors: Vec<ConfigurationError>,
}

impl ObjectTypeBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Add a field definition
    pub fn field(mut self, field: FieldDefinition) -> Self {
        self.fields.push(field);
        self
    }

    /// Add a field whose declaration may have failed
    ///
    /// Declaration errors are kept and reported by [`SchemaBuilder::build`]
    /// alongside every other error.
    pub fn try_field(mut self, field: Result<FieldDefinition, ConfigurationError>) -> Self {
        match field {
            Ok(field) => self.fields.push(field),
            Err(error) => self.errors.push(error),
        }
        self
    }

    fn build(self, errors: &mut Vec<ConfigurationError>) -> ObjectType {
        errors.extend(self.errors);

        let mut fields = IndexMap::with_capacity(self.fields.len());
        for definition in self.fields {
            let field_name = definition.name().to_string();
            match definition.finalize() {
                Ok(field) => match fields.entry(field_name) {
                    Entry::Vacant(slot) => {
                        slot.insert(field);
                    }
                    Entry::Occupied(slot) => errors.push(ConfigurationError::DuplicateField {
                        type_name: self.name.clone(),
                        field: slot.key().clone(),
                    }),
                },
                Err(error) => errors.push(error),
            }
        }

        ObjectType {
            name: self.name,
            fields,
        }
    }
}

/// An object type whose fields are ready for execution
#[derive(Debug, Clone)]
pub struct ObjectType {
    name: String,
    fields: IndexMap<String, ObjectField>,
}

impl ObjectType {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field(&self, name: &str) -> Option<&ObjectField> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = &ObjectField> {
        self.fields.values()
    }
}

/// Collects object types and finalizes them into a [`Schema`]
#[derive(Debug)]
pub struct SchemaBuilder {
    registry: LoaderRegistry,
    types: Vec<ObjectTypeBuilder>,
}

impl SchemaBuilder {
    /// Create a new schema builder over a loader registry
    pub fn new(registry: LoaderRegistry) -> Self {
        Self {
            registry,
            types: Vec::new(),
        }
    }

    /// Registry fields should bind their loaders against
    pub fn registry(&self) -> &LoaderRegistry {
        &self.registry
    }

    /// Add an object type
    pub fn object(mut self, object: ObjectTypeBuilder) -> Self {
        self.types.push(object);
        self
    }

    /// Finalize every field
    ///
    /// Returns every configuration error found, in declaration order.
    pub fn build(self) -> Result<Schema, SchemaError> {
        let mut errors = Vec::new();
        let mut types: IndexMap<String, ObjectType> = IndexMap::new();

        for builder in self.types {
            let object = builder.build(&mut errors);
            match types.entry(object.name.clone()) {
                Entry::Vacant(slot) => {
                    slot.insert(object);
                }
                Entry::Occupied(slot) => errors.push(ConfigurationError::DuplicateType {
                    type_name: slot.key().clone(),
                }),
            }
        }

        if !errors.is_empty() {
            tracing::error!(errors = errors.len(), "Schema construction failed");
            return Err(SchemaError::new(errors));
        }

        tracing::info!(types = types.len(), "Schema built");

        Ok(Schema {
            inner: Arc::new(SchemaInner {
                registry: self.registry,
                types,
            }),
        })
    }
}

#[derive(Debug)]
struct SchemaInner {
    registry: LoaderRegistry,
    types: IndexMap<String, ObjectType>,
}

/// A servable schema
#[derive(Debug, Clone)]
pub struct Schema {
    inner: Arc<SchemaInner>,
}

impl Schema {
    pub fn object(&self, name: &str) -> Option<&ObjectType> {
        self.inner.types.get(name)
    }

    pub fn field(&self, type_name: &str, field: &str) -> Option<&ObjectField> {
        self.object(type_name).and_then(|object| object.field(field))
    }

    pub fn registry(&self) -> &LoaderRegistry {
        &self.inner.registry
    }

    /// Create the state for one request, with fresh loader instances
    pub fn create_request(&self, cancellation: CancellationToken) -> RequestContext {
        RequestContext::new(self.inner.registry.create_scope(), cancellation)
    }

    /// Execute one field of one type for a parent value
    pub async fn execute_field(
        &self,
        request: &RequestContext,
        type_name: &str,
        field: &str,
        parent: FieldValue,
    ) -> FetchResult<FieldValue> {
        let object_field =
            self.field(type_name, field)
                .ok_or_else(|| FetchError::UnknownField {
                    type_name: type_name.to_string(),
                    field: field.to_string(),
                })?;
        object_field.execute(request, parent).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::TypeRef;

    fn constant(name: &str, value: i32) -> FieldDefinition {
        FieldDefinition::new(name, TypeRef::named("Int"))
            .resolve_with(move |_| async move { Ok(FieldValue::owned_any(value)) })
    }

    #[tokio::test]
    async fn test_build_and_execute() {
        let schema = SchemaBuilder::new(LoaderRegistry::new())
            .object(ObjectTypeBuilder::new("Query").field(constant("answer", 42)))
            .build()
            .unwrap();

        let request = schema.create_request(CancellationToken::new());
        let value = schema
            .execute_field(&request, "Query", "answer", FieldValue::Null)
            .await
            .unwrap();

        assert_eq!(value.downcast_ref::<i32>(), Some(&42));
        assert_eq!(schema.object("Query").unwrap().fields().count(), 1);
    }

    #[tokio::test]
    async fn test_unknown_field() {
        let schema = SchemaBuilder::new(LoaderRegistry::new())
            .object(ObjectTypeBuilder::new("Query"))
            .build()
            .unwrap();

        let request = schema.create_request(CancellationToken::new());
        let err = schema
            .execute_field(&request, "Query", "missing", FieldValue::Null)
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::UnknownField { .. }));
    }

    #[test]
    fn test_all_errors_are_reported() {
        let registry = LoaderRegistry::new();
        let unbound = FieldDefinition::new("author", TypeRef::named("User"))
            .resolve_with(|_| async { Ok(FieldValue::Null) })
            .use_loader::<String>(&registry);

        let err = SchemaBuilder::new(registry)
            .object(
                ObjectTypeBuilder::new("Post")
                    .try_field(unbound)
                    .field(FieldDefinition::new("title", TypeRef::named("String")))
                    .field(constant("likes", 1))
                    .field(constant("likes", 2)),
            )
            .object(ObjectTypeBuilder::new("Post"))
            .build()
            .unwrap_err();

        assert_eq!(
            err.errors(),
            &[
                ConfigurationError::InvalidLoader {
                    loader: "String".to_string()
                },
                ConfigurationError::MissingResolver {
                    field: "title".to_string()
                },
                ConfigurationError::DuplicateField {
                    type_name: "Post".to_string(),
                    field: "likes".to_string()
                },
                ConfigurationError::DuplicateType {
                    type_name: "Post".to_string()
                },
            ]
        );
    }
}
