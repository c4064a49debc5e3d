//! Currency Agent - HTTP Server Entry Point
//!
//! Loads configuration, then serves the invocation API.

use currency_agent::{api, config::Config};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine; real environment variables take precedence.
    let dotenv = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "currency_agent=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Ok(path) = dotenv {
        info!("Loaded environment from {}", path.display());
    }

    // Load configuration; missing required settings abort startup
    let config = Config::from_env()?;
    info!(
        "Loaded configuration: model={}, region={}, agent={}",
        config.model_id, config.region, config.identity.name
    );

    api::serve(config).await?;

    Ok(())
}
