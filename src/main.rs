use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lezelote_api::api;
use lezelote_api::config::Config;
use lezelote_api::db::Database;
use lezelote_api::handlers::AppState;

/// Main entry point for the application.
///
/// Initializes logging, loads configuration, connects to (and migrates) the
/// database, builds the router and serves it.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lezelote_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let db = Database::new(&config.database_url, config.db_max_connections).await?;
    tracing::info!("Database connection pool established");

    tokio::fs::create_dir_all(&config.upload_dir).await?;

    let addr = format!("0.0.0.0:{}", config.port);
    let state = Arc::new(AppState::new(db.pool.clone(), config));
    let app = api::router(state)?;

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    // Peer addresses back the rate limiter when no proxy header is present
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
