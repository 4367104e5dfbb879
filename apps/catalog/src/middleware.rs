//! Field middleware used by the catalog schema

use std::time::Instant;

use keyfetch_fetching::{async_trait, FetchResult, FieldMiddleware, MiddlewareContext, Next};

/// Logs how long the rest of a field pipeline took
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldTiming;

#[async_trait]
impl FieldMiddleware for FieldTiming {
    async fn invoke(&self, ctx: &mut MiddlewareContext, next: Next<'_>) -> FetchResult<()> {
        let started = Instant::now();
        let outcome = next.run(ctx).await;

        tracing::debug!(
            field = %ctx.field_name(),
            elapsed_us = started.elapsed().as_micros() as u64,
            ok = outcome.is_ok(),
            "Field resolved"
        );
        outcome
    }
}
