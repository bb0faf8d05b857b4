//! HTTP transport for MCP using Axum
//!
//! Stateless JSON-RPC 2.0 over `POST /mcp`. There is no session handshake:
//! every request is answered on its own and all clients share the process
//! registries.

pub mod error;
pub mod handler;
pub mod jsonrpc;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};

use crate::config::HttpConfig;
use crate::tools::ToolContext;
use handler::{handle_jsonrpc, healthz, list_tools, AppState};

/// Builds the router
///
/// # Endpoints
/// - POST /mcp: JSON-RPC 2.0 endpoint
/// - GET /healthz: returns `ok`
/// - GET /tools: tool catalogue
///
/// # CORS
/// Configured to allow all origins (*).
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/mcp", post(handle_jsonrpc))
        .route("/healthz", get(healthz))
        .route("/tools", get(list_tools))
        .layer(ServiceBuilder::new().layer(cors))
        .with_state(state)
}

/// Start HTTP server with MCP JSON-RPC endpoint
///
/// # Arguments
/// * `config` - Bind address
/// * `context` - Shared tool context
///
/// Runs until Ctrl+C, then stops every scheduled job before returning.
pub async fn start_http_server(config: &HttpConfig, context: Arc<ToolContext>) -> anyhow::Result<()> {
    tracing::info!("Initializing HTTP MCP server...");

    let app = router(AppState::new(context.clone()));
    let listener = tokio::net::TcpListener::bind(config.addr).await?;

    tracing::info!("HTTP MCP server listening on {}", config.addr);
    tracing::info!("Endpoint: POST http://{}/mcp", config.addr);

    // Create graceful shutdown handler
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Received shutdown signal (Ctrl+C)");
                let _ = shutdown_tx.send(());
            }
            Err(err) => {
                tracing::error!("Failed to listen for shutdown signal: {}", err);
            }
        }
    });

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async {
            shutdown_rx.await.ok();
            tracing::info!("Shutting down HTTP server...");
        })
        .await;

    context.shutdown();
    served?;

    tracing::info!("Server stopped");
    Ok(())
}
