pub mod gallery;
pub mod generation;
pub mod health;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;
use crate::ws;

/// Build the application route tree (without static file services).
///
/// ```text
/// /health                          service health
/// /ws                              WebSocket (tracked generations)
///
/// /generate                        start a generation (POST)
/// /button                          start an upscale/variation (POST)
/// /status/{job_id}?prompt=         one-shot status check
///
/// /api/generations                 list persisted generations
/// /api/generations/{job_id}        delete a generation (DELETE)
/// /api/gallery/images              flattened image list
/// /api/credits                     account quota
/// ```
pub fn app_routes() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .route("/ws", get(ws::ws_handler))
        .merge(generation::router())
        .nest("/api", gallery::router())
}
