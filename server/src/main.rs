//! Server binary: loads settings from the environment (and `.env`), opens one pool per schema,
//! and serves the API until ctrl-c.
//!
//! Run from repo root: `cargo run -p scribe-config-server`

use scribe_config_api::{app, validate_tables, AppState, Settings, Stores, ALL_TABLES};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("scribe_config_api=info,tower_http=info")),
        )
        .init();

    let settings = Settings::from_env()?;
    validate_tables(ALL_TABLES)?;
    let stores = Stores::connect(&settings.database)?;
    tracing::info!(
        introspection = settings.column_introspection,
        max_connections = settings.database.max_connections,
        "database pools created"
    );

    let addr = settings.bind_addr();
    let state = AppState::new(stores.clone(), settings);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    stores.close().await;
    tracing::info!("database pools closed");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
    tracing::info!("shutdown requested");
}
