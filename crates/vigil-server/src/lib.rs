//! Webhook ingestion and live-delivery server.
//!
//! Serves the HTTP surface (webhook ingestion, recent-alerts query,
//! statistics, health, cleanup) and the WebSocket push channel. All state
//! lives in the webhook store and the subscriber registry; the handlers
//! themselves are stateless between calls.

pub mod routes;
pub mod state;
pub mod ws;

use tokio::net::TcpListener;
use tracing::info;

use vigil_store::WebhookStore;
use vigil_types::{ServerConfig, VigilError};

use crate::state::AppState;

/// Open the store, bind the listener, and serve until ctrl-c.
pub async fn run(config: ServerConfig) -> Result<(), VigilError> {
    let addr = config.listen_addr()?;
    let store = WebhookStore::open(&config.db_path)?;
    let state = AppState::new(config, store);

    let app = routes::router(state);
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| VigilError::TransportError(format!("failed to bind {addr}: {e}")))?;

    info!(%addr, "webhook server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| VigilError::TransportError(format!("server failed: {e}")))?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received");
}
