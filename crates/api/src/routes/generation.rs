use axum::routing::{get, post};
use axum::Router;

use crate::handlers::generation;
use crate::state::AppState;

/// Root-level generation routes.
///
/// ```text
/// POST   /generate              -> generate
/// POST   /button                -> button
/// GET    /status/{job_id}       -> status
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/generate", post(generation::generate))
        .route("/button", post(generation::button))
        .route("/status/{job_id}", get(generation::status))
}
