use anyhow::{Context, Result};
use personal_info_api::config::Config;
use personal_info_api::db::PgStore;
use personal_info_api::server::{self, AppState};
use personal_info_api::sync::SyncOptions;
use personal_info_api::translation::OpenAiProvider;
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored in production)
    let _ = dotenvy::dotenv();

    // Load configuration from environment
    let config = Config::from_env()?;

    // Initialize logging
    let level = if config.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("personal_info_api={}", level).parse()?)
                .add_directive("tower_http=info".parse()?),
        )
        .init();

    info!("Starting personal info API");

    let directory = Arc::new(config.language_directory()?);
    info!(
        "Supported languages: {}",
        directory
            .iter()
            .map(|l| format!("{} ({})", l.name(), l.code()))
            .collect::<Vec<_>>()
            .join(", ")
    );

    if config.openai_api_key.is_none() {
        warn!("OPENAI_API_KEY not set - translate requests will fail with 502");
    }

    let store = PgStore::connect(&config.database_url, config.database_max_connections).await?;
    store.init_schema().await?;

    let provider = OpenAiProvider::new(&config);
    let state = Arc::new(AppState::new(
        store,
        provider,
        directory,
        SyncOptions::from(&config),
    ));
    let app = server::router(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port))
        .await
        .with_context(|| format!("Failed to bind port {}", config.port))?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
