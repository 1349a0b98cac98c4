//! Relay server execution logic.

use std::sync::Arc;

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::{
    handler::{health_check, websocket_handler},
    relay::Relay,
    signal::shutdown_signal,
};

/// Build the relay router for the given core.
pub fn router(relay: Arc<Relay>) -> Router {
    Router::new()
        .route("/ws", get(websocket_handler))
        .route("/api/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(relay)
}

/// Run the relay until ctrl-c or SIGTERM.
///
/// # Arguments
///
/// * `host` - The host address to bind to (e.g., "127.0.0.1")
/// * `port` - The port number to bind to (e.g., 8080)
pub async fn run_server(host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let relay = Arc::new(Relay::new());
    let app = router(relay);

    let bind_addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    tracing::info!("relay listening on {}", listener.local_addr()?);
    tracing::info!("connect to: ws://{}/ws", bind_addr);
    tracing::info!("press Ctrl+C to shut down gracefully");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("relay shutdown complete");

    Ok(())
}
