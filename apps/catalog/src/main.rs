use keyfetch_catalog::{build_schema, catalog_report, Catalog, Config};
use keyfetch_fetching::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.common.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        environment = %config.common.environment,
        max_batch_size = config.common.batching.max_batch_size,
        delay_ms = config.common.batching.delay_ms,
        "Starting catalog demo"
    );

    let catalog = Catalog::sample();
    let schema = build_schema(catalog.clone(), &config.common.batching)?;

    // Abort the request on Ctrl+C
    let cancellation = CancellationToken::new();
    tokio::spawn({
        let cancellation = cancellation.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupted, cancelling request");
                cancellation.cancel();
            }
        }
    });

    let request = schema.create_request(cancellation);
    let report = catalog_report(&schema, &request).await?;

    tracing::info!(queries = catalog.query_count(), "Catalog report complete");

    let output = if config.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{}", output);

    Ok(())
}
