use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use portfolio_site::config::Config;
use portfolio_site::db::Database;
use portfolio_site::fetcher::Fetcher;
use portfolio_site::routes::{self, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "portfolio_site=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::load("site.toml")?;
    info!("Loaded {} feeds from configuration", config.feeds.len());

    // Subscriber store is optional; without it signups point at the fallback page
    let database_url = std::env::var("DATABASE_URL")
        .ok()
        .or_else(|| config.newsletter.database_url.clone());
    let subscribers = Database::connect_optional(database_url.as_deref())
        .await
        .map(Arc::new);

    let fetcher = Arc::new(Fetcher::from_config(&config)?);

    // Create app state
    let state = Arc::new(AppState {
        fetcher,
        feeds: config.feeds.clone(),
        newsletter: config.newsletter.clone(),
        subscribers,
    });

    let app = routes::router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
    info!("Server starting on http://localhost:3000");

    axum::serve(listener, app).await?;

    Ok(())
}
