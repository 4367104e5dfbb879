//! Field execution pipeline
//!
//! A field runs as an ordered list of steps around its resolver. Each step
//! receives the invocation's [`MiddlewareContext`] and a [`Next`] handle; it
//! decides when to run the remainder of the pipeline and what to do with the
//! result afterwards. The first step is the outermost, the resolver the
//! innermost.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::BoxFuture;

use crate::context::{MiddlewareContext, ResolverContext};
use crate::error::FetchResult;
use crate::resolution::Resolution;
use crate::value::FieldValue;

/// Stable key identifying a step within a field pipeline
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StepKey(Arc<str>);

impl StepKey {
    /// Key of the loader step inserted by the binder
    pub const LOADER: &'static str = "loader-step";

    pub fn new(key: impl Into<Arc<str>>) -> Self {
        Self(key.into())
    }

    pub fn loader() -> Self {
        Self::new(Self::LOADER)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StepKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A step that wraps the rest of a field pipeline
#[async_trait]
pub trait FieldMiddleware: Send + Sync {
    async fn invoke(&self, ctx: &mut MiddlewareContext, next: Next<'_>) -> FetchResult<()>;
}

/// Field resolver producing the upstream result
pub type Resolver =
    Arc<dyn Fn(ResolverContext) -> BoxFuture<'static, FetchResult<FieldValue>> + Send + Sync>;

/// Box an async closure into a [`Resolver`]
pub fn resolver_fn<F, Fut>(resolve: F) -> Resolver
where
    F: Fn(ResolverContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = FetchResult<FieldValue>> + Send + 'static,
{
    Arc::new(move |ctx| Box::pin(resolve(ctx)))
}

/// What a declared step does
#[derive(Clone)]
pub(crate) enum StepKind {
    /// Inert until the binder replaces it
    Placeholder,
    Middleware(Arc<dyn FieldMiddleware>),
    Loader(Resolution),
}

/// An entry of a field's mutable step list
#[derive(Clone)]
pub struct PipelineStep {
    pub(crate) key: StepKey,
    pub(crate) kind: StepKind,
}

impl PipelineStep {
    pub(crate) fn placeholder(key: StepKey) -> Self {
        Self {
            key,
            kind: StepKind::Placeholder,
        }
    }

    pub(crate) fn middleware(key: StepKey, middleware: Arc<dyn FieldMiddleware>) -> Self {
        Self {
            key,
            kind: StepKind::Middleware(middleware),
        }
    }

    pub fn key(&self) -> &StepKey {
        &self.key
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self.kind, StepKind::Placeholder)
    }

    /// The specialized loader step, if this is one
    pub fn resolution(&self) -> Option<&Resolution> {
        match &self.kind {
            StepKind::Loader(resolution) => Some(resolution),
            _ => None,
        }
    }
}

impl fmt::Debug for PipelineStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.kind {
            StepKind::Placeholder => "placeholder".to_string(),
            StepKind::Middleware(_) => "middleware".to_string(),
            StepKind::Loader(resolution) => format!("{:?}", resolution),
        };
        f.debug_struct("PipelineStep")
            .field("key", &self.key)
            .field("kind", &kind)
            .finish()
    }
}

/// A step of a finalized, executable pipeline
#[derive(Clone)]
pub(crate) enum CompiledStep {
    Middleware(Arc<dyn FieldMiddleware>),
    Loader(Resolution),
}

impl CompiledStep {
    fn invoke<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        next: Next<'a>,
    ) -> BoxFuture<'a, FetchResult<()>> {
        match self {
            Self::Middleware(middleware) => middleware.invoke(ctx, next),
            Self::Loader(resolution) => Box::pin(resolution.invoke(ctx, next)),
        }
    }
}

/// The remainder of a pipeline below the current step
#[derive(Clone, Copy)]
pub struct Next<'a> {
    steps: &'a [CompiledStep],
    resolver: &'a Resolver,
}

impl<'a> Next<'a> {
    pub(crate) fn new(steps: &'a [CompiledStep], resolver: &'a Resolver) -> Self {
        Self { steps, resolver }
    }

    /// Run the remaining steps and the resolver
    pub fn run<'b>(self, ctx: &'b mut MiddlewareContext) -> BoxFuture<'b, FetchResult<()>>
    where
        'a: 'b,
    {
        Box::pin(async move {
            match self.steps.split_first() {
                Some((step, rest)) => step.invoke(ctx, Next::new(rest, self.resolver)).await,
                None => {
                    let value = (self.resolver)(ctx.resolver_context()).await?;
                    ctx.set_result(value);
                    Ok(())
                }
            }
        })
    }
}
