//! Main HTTP gateway server.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use promptgate_config::AppConfig;
use promptgate_core::CompletionBackend;
use promptgate_template::TemplateStore;
use tokio::net::TcpListener;
use tracing::info;

use crate::completions;

/// Application state shared across routes. Templates are read through
/// per-request snapshots; nothing here is mutated by request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub config: Arc<AppConfig>,
    pub templates: Arc<TemplateStore>,
    pub backend: Arc<dyn CompletionBackend>,
}

/// Build the application router. Any path embedding a target endpoint is
/// served by the completions handler.
pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route("/", get(usage))
        .route("/health", get(health))
        .route("/*target", post(completions::chat_completions))
        .with_state(state)
}

/// Start the Axum HTTP server for the gateway.
pub async fn start_server(addr: SocketAddr, state: GatewayState) -> Result<()> {
    let app = router(state);

    info!("Gateway HTTP server listening on {}", addr);
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    info!("Shutdown signal received; draining connections");
}

/// Root endpoint: how to address the proxy.
async fn usage() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "OpenAI-compatible prompt-injection proxy",
        "usage": "POST /{http(s)://target.host}/v1/chat/completions",
        "example": "/https://api.openai.com/v1/chat/completions",
    }))
}

async fn health(State(state): State<GatewayState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": state.config.app_name.0,
    }))
}
