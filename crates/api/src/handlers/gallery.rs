//! Handlers for persisted generations.

use axum::extract::{Path, State};
use axum::Json;
use imagine_core::generation::{GalleryImage, GenerationMetadata};
use serde::Serialize;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub job_id: String,
    /// Name of the folder that was removed.
    pub folder: String,
}

/// GET /api/generations -- metadata of every generation, newest first.
pub async fn list_generations(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<GenerationMetadata>>>> {
    let generations = state.gallery.list_generations().await?;
    Ok(Json(DataResponse { data: generations }))
}

/// GET /api/gallery/images -- every saved image, newest generation first.
pub async fn list_images(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<GalleryImage>>>> {
    let images = state.gallery.list_images().await?;
    Ok(Json(DataResponse { data: images }))
}

/// DELETE /api/generations/{job_id}
pub async fn delete_generation(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> AppResult<Json<DataResponse<DeleteResponse>>> {
    let folder = state.gallery.delete(&job_id).await?;
    Ok(Json(DataResponse {
        data: DeleteResponse { job_id, folder },
    }))
}
