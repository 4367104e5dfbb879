//! Per-request and per-invocation execution state

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::loader::LoaderScope;
use crate::value::FieldValue;

/// State shared by every field executed for one request
#[derive(Debug, Clone)]
pub struct RequestContext {
    loaders: LoaderScope,
    cancellation: CancellationToken,
}

impl RequestContext {
    pub fn new(loaders: LoaderScope, cancellation: CancellationToken) -> Self {
        Self {
            loaders,
            cancellation,
        }
    }

    /// Loader instances of this request
    pub fn loaders(&self) -> &LoaderScope {
        &self.loaders
    }

    /// Fires when the request is aborted
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }
}

/// State of one in-flight field execution
///
/// Owned by a single invocation and handed down the pipeline by mutable
/// reference; steps read the result left by the steps below them and may
/// replace it.
#[derive(Debug)]
pub struct MiddlewareContext {
    field: Arc<str>,
    parent: FieldValue,
    result: FieldValue,
    request: RequestContext,
}

impl MiddlewareContext {
    pub fn new(field: Arc<str>, parent: FieldValue, request: RequestContext) -> Self {
        Self {
            field,
            parent,
            result: FieldValue::Null,
            request,
        }
    }

    /// Name of the executing field
    pub fn field_name(&self) -> &str {
        &self.field
    }

    /// Value of the parent object
    pub fn parent(&self) -> &FieldValue {
        &self.parent
    }

    /// Current field result
    pub fn result(&self) -> &FieldValue {
        &self.result
    }

    /// Replace the field result
    pub fn set_result(&mut self, value: FieldValue) {
        self.result = value;
    }

    pub(crate) fn into_result(self) -> FieldValue {
        self.result
    }

    pub fn request(&self) -> &RequestContext {
        &self.request
    }

    pub fn loaders(&self) -> &LoaderScope {
        self.request.loaders()
    }

    pub fn cancellation(&self) -> &CancellationToken {
        self.request.cancellation()
    }

    /// Snapshot handed to the field resolver
    pub(crate) fn resolver_context(&self) -> ResolverContext {
        ResolverContext {
            field: Arc::clone(&self.field),
            parent: self.parent.clone(),
            request: self.request.clone(),
        }
    }
}

/// Input of a field resolver
#[derive(Debug, Clone)]
pub struct ResolverContext {
    field: Arc<str>,
    parent: FieldValue,
    request: RequestContext,
}

impl ResolverContext {
    pub fn field_name(&self) -> &str {
        &self.field
    }

    pub fn parent(&self) -> &FieldValue {
        &self.parent
    }

    /// Downcast the parent value
    pub fn parent_as<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.parent.downcast_arc::<T>()
    }

    pub fn request(&self) -> &RequestContext {
        &self.request
    }
}
