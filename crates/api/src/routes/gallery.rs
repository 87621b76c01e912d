use axum::routing::{delete, get};
use axum::Router;

use crate::handlers::{account, gallery};
use crate::state::AppState;

/// Persisted generation and account routes, mounted under `/api`.
///
/// ```text
/// GET    /generations               -> list_generations
/// DELETE /generations/{job_id}      -> delete_generation
/// GET    /gallery/images            -> list_images
/// GET    /credits                   -> credits
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/generations", get(gallery::list_generations))
        .route("/generations/{job_id}", delete(gallery::delete_generation))
        .route("/gallery/images", get(gallery::list_images))
        .route("/credits", get(account::credits))
}
