//! Binding loaders to fields
//!
//! Binding happens in two stages. [`LoaderBinding::declare`] runs while the
//! field is being described: it reserves the loader's slot in the pipeline
//! with an inert placeholder. [`LoaderBinding::apply`] runs when the field is
//! finalized and the declared output type is settled: it picks the singular
//! or grouped variant, rewrites the output type and swaps the placeholder for
//! the concrete step.

use std::sync::Arc;

use crate::error::ConfigurationError;
use crate::field::{FieldConfiguration, FieldDefinition};
use crate::pipeline::{PipelineStep, StepKey, StepKind};
use crate::registry::LoaderDescriptor;
use crate::resolution::Resolution;
use crate::value::TypeRef;

/// A loader bound to one field, pending specialization
#[derive(Debug, Clone)]
pub struct LoaderBinding {
    descriptor: Arc<LoaderDescriptor>,
}

impl LoaderBinding {
    /// Reserve the loader step on a field
    ///
    /// Fails if the field already has a loader step.
    pub fn declare(
        field: &mut FieldDefinition,
        descriptor: Arc<LoaderDescriptor>,
    ) -> Result<Self, ConfigurationError> {
        let key = StepKey::loader();
        field.ensure_unique(&key)?;
        field.steps.push(PipelineStep::placeholder(key));
        Ok(Self { descriptor })
    }

    pub fn descriptor(&self) -> &LoaderDescriptor {
        &self.descriptor
    }

    /// Choose the output type and step variant for a declared output type
    pub fn specialize(
        &self,
        field: &str,
        declared: &TypeRef,
    ) -> Result<(TypeRef, Resolution), ConfigurationError> {
        let value = self.descriptor.value_type();
        let handle = self.descriptor.handle().clone();

        if let Some(element) = value.element_type() {
            if element.is_list() {
                return Err(ConfigurationError::Specialization {
                    field: field.to_string(),
                    loader: self.descriptor.loader_type().to_string(),
                    reason: format!("value type {} nests lists more than one level deep", value),
                });
            }
            return Ok((value.clone(), Resolution::Grouped(handle)));
        }

        if declared.is_list() {
            return Ok((TypeRef::list(value.clone()), Resolution::Grouped(handle)));
        }

        Ok((value.clone(), Resolution::Singular(handle)))
    }
}

impl FieldConfiguration for LoaderBinding {
    fn apply(&self, field: &mut FieldDefinition) -> Result<(), ConfigurationError> {
        let key = StepKey::loader();
        let index = field
            .position(&key)
            .ok_or_else(|| ConfigurationError::PlaceholderMissing {
                field: field.name().to_string(),
                step: key.to_string(),
            })?;

        if !field.steps[index].is_placeholder() {
            return Err(ConfigurationError::AlreadySpecialized {
                field: field.name().to_string(),
                step: key.to_string(),
            });
        }

        let (output, resolution) = self.specialize(field.name(), field.output())?;

        tracing::debug!(
            field = %field.name(),
            loader = %self.descriptor.loader_type(),
            declared = %field.output(),
            output = %output,
            resolution = ?resolution,
            "Specialized loader step"
        );

        field.set_output(output);
        field.steps[index] = PipelineStep {
            key,
            kind: StepKind::Loader(resolution),
        };
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use rstest::rstest;
    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::error::FetchResult;
    use crate::loader::KeyedLoader;
    use crate::registry::LoaderRegistry;
    use crate::value::{Entity, FieldValue};

    struct Post;

    impl Entity for Post {
        const TYPE_NAME: &'static str = "Post";
    }

    struct PostLoader;

    #[async_trait]
    impl KeyedLoader for PostLoader {
        type Key = i32;
        type Value = Arc<Post>;

        async fn load_one(&self, _: i32, _: &CancellationToken) -> FetchResult<Option<Arc<Post>>> {
            Ok(None)
        }

        async fn load_many(
            &self,
            keys: &[i32],
            _: &CancellationToken,
        ) -> FetchResult<Vec<Option<Arc<Post>>>> {
            Ok(vec![None; keys.len()])
        }
    }

    struct PostsByAuthor;

    #[async_trait]
    impl KeyedLoader for PostsByAuthor {
        type Key = i32;
        type Value = Vec<Arc<Post>>;

        async fn load_one(
            &self,
            _: i32,
            _: &CancellationToken,
        ) -> FetchResult<Option<Vec<Arc<Post>>>> {
            Ok(None)
        }

        async fn load_many(
            &self,
            keys: &[i32],
            _: &CancellationToken,
        ) -> FetchResult<Vec<Option<Vec<Arc<Post>>>>> {
            Ok(vec![None; keys.len()])
        }
    }

    struct PostPages;

    #[async_trait]
    impl KeyedLoader for PostPages {
        type Key = i32;
        type Value = Vec<Vec<Arc<Post>>>;

        async fn load_one(
            &self,
            _: i32,
            _: &CancellationToken,
        ) -> FetchResult<Option<Self::Value>> {
            Ok(None)
        }

        async fn load_many(
            &self,
            keys: &[i32],
            _: &CancellationToken,
        ) -> FetchResult<Vec<Option<Self::Value>>> {
            Ok(vec![None; keys.len()])
        }
    }

    fn registry() -> LoaderRegistry {
        LoaderRegistry::new()
            .register::<PostLoader>()
            .register::<PostsByAuthor>()
            .register::<PostPages>()
    }

    fn field(output: TypeRef) -> FieldDefinition {
        FieldDefinition::new("posts", output).resolve_with(|_| async { Ok(FieldValue::Null) })
    }

    #[rstest]
    #[case::single_key(TypeRef::named("Int"), false, "Post", false)]
    #[case::key_list(TypeRef::list(TypeRef::named("Int")), false, "[Post]", true)]
    #[case::non_null_key_list(
        TypeRef::non_null(TypeRef::list(TypeRef::named("Int"))),
        false,
        "[Post]",
        true
    )]
    #[case::grouped_single_key(TypeRef::named("Int"), true, "[Post]", true)]
    #[case::grouped_key_list(TypeRef::list(TypeRef::named("Int")), true, "[Post]", true)]
    fn test_variant_selection(
        #[case] declared: TypeRef,
        #[case] grouped_loader: bool,
        #[case] expected_output: &str,
        #[case] expect_grouped: bool,
    ) {
        let registry = registry();
        let field = field(declared);
        let field = if grouped_loader {
            field.use_loader::<PostsByAuthor>(&registry)
        } else {
            field.use_loader::<PostLoader>(&registry)
        }
        .unwrap()
        .finalize()
        .unwrap();

        assert_eq!(field.output().to_string(), expected_output);
        assert_eq!(field.resolution().unwrap().is_grouped(), expect_grouped);
        assert_eq!(field.step_keys()[0].as_str(), StepKey::LOADER);
    }

    #[test]
    fn test_declare_inserts_placeholder() {
        let registry = registry();
        let mut field = field(TypeRef::named("Int"));

        let binding =
            LoaderBinding::declare(&mut field, registry.resolve::<PostLoader>().unwrap()).unwrap();

        assert_eq!(binding.descriptor().loader_type(), "PostLoader");
        assert_eq!(field.steps().len(), 1);
        assert!(field.steps()[0].is_placeholder());
        assert_eq!(field.output().to_string(), "Int");
    }

    #[test]
    fn test_apply_twice_is_a_defect() {
        let registry = registry();
        let mut field = field(TypeRef::named("Int"));
        let binding =
            LoaderBinding::declare(&mut field, registry.resolve::<PostLoader>().unwrap()).unwrap();

        binding.apply(&mut field).unwrap();
        let err = binding.apply(&mut field).unwrap_err();

        assert_eq!(
            err,
            ConfigurationError::AlreadySpecialized {
                field: "posts".to_string(),
                step: "loader-step".to_string()
            }
        );
        assert!(field.steps()[0].resolution().is_some());
    }

    #[test]
    fn test_apply_without_placeholder() {
        let registry = registry();
        let binding = {
            let mut scratch = field(TypeRef::named("Int"));
            LoaderBinding::declare(&mut scratch, registry.resolve::<PostLoader>().unwrap())
                .unwrap()
        };
        let mut other = field(TypeRef::named("Int"));

        let err = binding.apply(&mut other).unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::PlaceholderMissing {
                field: "posts".to_string(),
                step: "loader-step".to_string()
            }
        );
    }

    #[test]
    fn test_second_loader_on_same_field() {
        let registry = registry();
        let err = field(TypeRef::named("Int"))
            .use_loader::<PostLoader>(&registry)
            .unwrap()
            .use_loader::<PostsByAuthor>(&registry)
            .unwrap_err();

        assert!(matches!(err, ConfigurationError::DuplicateStep { .. }));
    }

    #[test]
    fn test_unregistered_loader_fails_at_declare() {
        let err = field(TypeRef::named("Int"))
            .use_loader::<Post>(&registry())
            .unwrap_err();

        assert_eq!(
            err,
            ConfigurationError::InvalidLoader {
                loader: "Post".to_string()
            }
        );
    }

    #[test]
    fn test_nested_list_values_cannot_be_specialized() {
        let err = field(TypeRef::named("Int"))
            .use_loader::<PostPages>(&registry())
            .unwrap()
            .finalize()
            .unwrap_err();

        assert!(matches!(
            err,
            ConfigurationError::Specialization { ref loader, .. } if loader == "PostPages"
        ));
    }

    #[test]
    fn test_use_loader_named() {
        let field = field(TypeRef::named("Int"))
            .use_loader_named("PostsByAuthor", &registry())
            .unwrap()
            .finalize()
            .unwrap();

        assert_eq!(
            field.resolution().unwrap().loader().name(),
            "PostsByAuthor"
        );
    }
}
