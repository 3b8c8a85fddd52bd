//! dolar-tracker ingest server entry point.
//!
//! Starts the Axum HTTP server that receives price webhooks and serves
//! the stored history.

use std::sync::Arc;
use std::time::Duration;

use dolar_tracker::api;
use dolar_tracker::app_state::AppState;
use dolar_tracker::config::IngestConfig;
use dolar_tracker::persistence::{MemoryStore, PostgresStore, PriceStore};
use dolar_tracker::service::IngestService;
use dolar_tracker::telemetry;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Load configuration
    let config = IngestConfig::from_env()?;

    // Initialize tracing
    telemetry::init(config.log_format);
    tracing::info!(addr = %config.listen_addr, "starting dolar-tracker");

    // Build persistence layer
    let store: Arc<dyn PriceStore> = if config.persistence_enabled {
        let store = PostgresStore::connect(&config).await?;
        if config.run_migrations {
            store.run_migrations().await?;
        }
        Arc::new(store)
    } else {
        tracing::warn!("persistence disabled, prices are kept in memory only");
        Arc::new(MemoryStore::new())
    };

    // Build application state
    let app_state = AppState {
        ingest_service: Arc::new(IngestService::new(store)),
    };

    // Build router
    let app = api::build_app(app_state, Duration::from_secs(config.request_timeout_secs));

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
