use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall service status.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Whether an ImaginePro API key is configured.
    pub provider_configured: bool,
    /// Jobs currently being polled.
    pub active_jobs: usize,
    /// Open WebSocket connections.
    pub connections: usize,
}

/// GET /health -- returns service health.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let provider_configured = state.provider.is_configured();

    let status = if provider_configured { "ok" } else { "degraded" };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        provider_configured,
        active_jobs: state.registry.len().await,
        connections: state.gateway.ws_manager().connection_count().await,
    })
}

/// Mount health check routes (root-level, not under `/api`).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
