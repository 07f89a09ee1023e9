use ai_llm_service::telemetry;
use tracing::{Level, warn};
use tracing_subscriber::{Layer, filter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file when present.
    // Deployed environments inject variables directly, so a missing file is fine.
    let dotenv = dotenvy::dotenv();

    let filter = telemetry::env_filter_with_level("info,concierge=info,api=info", Level::INFO);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_filter(filter::filter_fn(|meta| {
                    !meta.target().starts_with(telemetry::TARGET_PREFIX)
                })),
        )
        .with(telemetry::layer())
        .init();

    if let Err(e) = dotenv {
        if !e.not_found() {
            warn!(error = %e, ".env file found but could not be loaded");
        }
    }

    api::start().await?;

    Ok(())
}
