//! Field definitions and their two-stage build
//!
//! A [`FieldDefinition`] is the mutable, build-time form of a field: its
//! declared output type, its resolver, its step list and the deferred
//! configurations that still have to run. [`FieldDefinition::finalize`]
//! consumes it, applies the configurations in order and produces an immutable
//! [`ObjectField`] with a freshly compiled pipeline.

use std::sync::Arc;

use crate::binder::LoaderBinding;
use crate::context::{MiddlewareContext, RequestContext, ResolverContext};
use crate::error::{ConfigurationError, FetchResult};
use crate::pipeline::{
    resolver_fn, CompiledStep, FieldMiddleware, Next, PipelineStep, Resolver, StepKey, StepKind,
};
use crate::registry::LoaderRegistry;
use crate::resolution::Resolution;
use crate::value::{FieldValue, TypeRef};

/// Work deferred until a field is finalized
pub trait FieldConfiguration: Send + Sync {
    fn apply(&self, field: &mut FieldDefinition) -> Result<(), ConfigurationError>;
}

/// Build-time definition of a field
pub struct FieldDefinition {
    name: String,
    output: TypeRef,
    resolver: Option<Resolver>,
    pub(crate) steps: Vec<PipelineStep>,
    configurations: Vec<Box<dyn FieldConfiguration>>,
}

impl FieldDefinition {
    /// Declare a field with the output type its resolver produces
    pub fn new(name: impl Into<String>, output: TypeRef) -> Self {
        Self {
            name: name.into(),
            output,
            resolver: None,
            steps: Vec::new(),
            configurations: Vec::new(),
        }
    }

    /// Set the resolver
    pub fn resolver(mut self, resolver: Resolver) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Set the resolver from an async closure
    pub fn resolve_with<F, Fut>(self, resolve: F) -> Self
    where
        F: Fn(ResolverContext) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = FetchResult<FieldValue>> + Send + 'static,
    {
        self.resolver(resolver_fn(resolve))
    }

    /// Append a middleware step under a stable key
    pub fn use_middleware<M>(
        mut self,
        key: impl Into<Arc<str>>,
        middleware: M,
    ) -> Result<Self, ConfigurationError>
    where
        M: FieldMiddleware + 'static,
    {
        let key = StepKey::new(key);
        self.ensure_unique(&key)?;
        self.steps
            .push(PipelineStep::middleware(key, Arc::new(middleware)));
        Ok(self)
    }

    /// Route the resolver's keys through loader `L`
    pub fn use_loader<L: 'static>(
        mut self,
        registry: &LoaderRegistry,
    ) -> Result<Self, ConfigurationError> {
        let descriptor = registry.resolve::<L>()?;
        let binding = LoaderBinding::declare(&mut self, descriptor)?;
        self.configure(binding);
        Ok(self)
    }

    /// Route the resolver's keys through the loader registered under `name`
    pub fn use_loader_named(
        mut self,
        name: &str,
        registry: &LoaderRegistry,
    ) -> Result<Self, ConfigurationError> {
        let descriptor = registry.resolve_named(name)?;
        let binding = LoaderBinding::declare(&mut self, descriptor)?;
        self.configure(binding);
        Ok(self)
    }

    /// Defer a configuration until [`finalize`](Self::finalize)
    pub fn configure<C: FieldConfiguration + 'static>(&mut self, configuration: C) {
        self.configurations.push(Box::new(configuration));
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current output type
    pub fn output(&self) -> &TypeRef {
        &self.output
    }

    pub fn set_output(&mut self, output: TypeRef) {
        self.output = output;
    }

    /// Current step list, outermost first
    pub fn steps(&self) -> &[PipelineStep] {
        &self.steps
    }

    /// Position of the step with this key
    pub fn position(&self, key: &StepKey) -> Option<usize> {
        self.steps.iter().position(|step| &step.key == key)
    }

    pub(crate) fn ensure_unique(&self, key: &StepKey) -> Result<(), ConfigurationError> {
        match self.position(key) {
            Some(_) => Err(ConfigurationError::DuplicateStep {
                field: self.name.clone(),
                step: key.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Apply deferred configurations and freeze the pipeline
    pub fn finalize(mut self) -> Result<ObjectField, ConfigurationError> {
        for configuration in std::mem::take(&mut self.configurations) {
            configuration.apply(&mut self)?;
        }

        let FieldDefinition {
            name,
            output,
            resolver,
            steps,
            ..
        } = self;

        let resolver = resolver.ok_or_else(|| ConfigurationError::MissingResolver {
            field: name.clone(),
        })?;

        let mut keys = Vec::with_capacity(steps.len());
        let mut compiled = Vec::with_capacity(steps.len());
        for step in steps {
            match step.kind {
                StepKind::Placeholder => {
                    return Err(ConfigurationError::UnresolvedPlaceholder {
                        field: name,
                        step: step.key.to_string(),
                    });
                }
                StepKind::Middleware(middleware) => {
                    compiled.push(CompiledStep::Middleware(middleware))
                }
                StepKind::Loader(resolution) => compiled.push(CompiledStep::Loader(resolution)),
            }
            keys.push(step.key);
        }

        tracing::debug!(field = %name, output = %output, steps = keys.len(), "Finalized field");

        Ok(ObjectField {
            name: Arc::from(name),
            output,
            keys,
            steps: Arc::from(compiled),
            resolver,
        })
    }
}

impl std::fmt::Debug for FieldDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldDefinition")
            .field("name", &self.name)
            .field("output", &self.output)
            .field("steps", &self.steps)
            .field("pending_configurations", &self.configurations.len())
            .finish()
    }
}

/// An executable field with a frozen pipeline
#[derive(Clone)]
pub struct ObjectField {
    name: Arc<str>,
    output: TypeRef,
    keys: Vec<StepKey>,
    steps: Arc<[CompiledStep]>,
    resolver: Resolver,
}

impl ObjectField {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Output type after specialization
    pub fn output(&self) -> &TypeRef {
        &self.output
    }

    /// Keys of the pipeline steps, outermost first
    pub fn step_keys(&self) -> &[StepKey] {
        &self.keys
    }

    /// The loader step of this field, if one was bound
    pub fn resolution(&self) -> Option<&Resolution> {
        self.steps.iter().find_map(|step| match step {
            CompiledStep::Loader(resolution) => Some(resolution),
            CompiledStep::Middleware(_) => None,
        })
    }

    /// Start an invocation context for this field
    pub fn context(&self, request: &RequestContext, parent: FieldValue) -> MiddlewareContext {
        MiddlewareContext::new(Arc::clone(&self.name), parent, request.clone())
    }

    /// Run the pipeline against an existing invocation context
    pub async fn invoke(&self, ctx: &mut MiddlewareContext) -> FetchResult<()> {
        Next::new(&self.steps, &self.resolver).run(ctx).await
    }

    /// Execute the field for one parent value
    pub async fn execute(
        &self,
        request: &RequestContext,
        parent: FieldValue,
    ) -> FetchResult<FieldValue> {
        let mut ctx = self.context(request, parent);
        self.invoke(&mut ctx).await?;
        Ok(ctx.into_result())
    }
}

impl std::fmt::Debug for ObjectField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectField")
            .field("name", &self.name)
            .field("output", &self.output)
            .field("steps", &self.keys)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::loader::LoaderScope;

    /// Wraps the upstream result in a one-element list
    struct Listify;

    #[async_trait]
    impl FieldMiddleware for Listify {
        async fn invoke(&self, ctx: &mut MiddlewareContext, next: Next<'_>) -> FetchResult<()> {
            next.run(ctx).await?;
            let value = ctx.result().clone();
            ctx.set_result(FieldValue::list([value]));
            Ok(())
        }
    }

    fn request() -> RequestContext {
        RequestContext::new(LoaderScope::default(), CancellationToken::new())
    }

    #[tokio::test]
    async fn test_middleware_wraps_resolver() {
        let field = FieldDefinition::new("wrapped", TypeRef::named("Int"))
            .resolve_with(|_| async { Ok(FieldValue::owned_any(3_i32)) })
            .use_middleware("listify", Listify)
            .unwrap()
            .finalize()
            .unwrap();

        let value = field.execute(&request(), FieldValue::Null).await.unwrap();

        let items = value.as_list().unwrap();
        assert_eq!(items[0].downcast_ref::<i32>(), Some(&3));
        assert_eq!(field.step_keys()[0].as_str(), "listify");
        assert!(field.resolution().is_none());
    }

    #[tokio::test]
    async fn test_outer_step_sees_inner_step_result() {
        let field = FieldDefinition::new("nested", TypeRef::named("Int"))
            .resolve_with(|_| async { Ok(FieldValue::Null) })
            .use_middleware("outer", Listify)
            .unwrap()
            .use_middleware("inner", Listify)
            .unwrap()
            .finalize()
            .unwrap();

        let value = field.execute(&request(), FieldValue::Null).await.unwrap();

        let outer = value.as_list().unwrap();
        let inner = outer[0].as_list().unwrap();
        assert!(inner[0].is_null());
    }

    #[tokio::test]
    async fn test_resolver_sees_parent() {
        let field = FieldDefinition::new("echo", TypeRef::named("Int"))
            .resolve_with(|ctx| async move { Ok(ctx.parent().clone()) })
            .finalize()
            .unwrap();

        let parent = FieldValue::owned_any(11_i32);
        let value = field.execute(&request(), parent.clone()).await.unwrap();
        assert!(value.ptr_eq(&parent));
    }

    #[test]
    fn test_duplicate_middleware_key_is_rejected() {
        let err = FieldDefinition::new("twice", TypeRef::named("Int"))
            .use_middleware("listify", Listify)
            .unwrap()
            .use_middleware("listify", Listify)
            .unwrap_err();

        assert_eq!(
            err,
            ConfigurationError::DuplicateStep {
                field: "twice".to_string(),
                step: "listify".to_string()
            }
        );
    }

    #[test]
    fn test_finalize_requires_resolver() {
        let err = FieldDefinition::new("orphan", TypeRef::named("Int"))
            .finalize()
            .unwrap_err();

        assert_eq!(
            err,
            ConfigurationError::MissingResolver {
                field: "orphan".to_string()
            }
        );
    }

    #[test]
    fn test_finalize_rejects_leftover_placeholder() {
        let mut field = FieldDefinition::new("pending", TypeRef::named("Int"))
            .resolve_with(|_| async { Ok(FieldValue::Null) });
        field.steps.push(PipelineStep::placeholder(StepKey::loader()));

        let err = field.finalize().unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::UnresolvedPlaceholder {
                field: "pending".to_string(),
                step: "loader-step".to_string()
            }
        );
    }
}
