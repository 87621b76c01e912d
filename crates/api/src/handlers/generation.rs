//! Request/response generation endpoints.
//!
//! These call the provider directly and leave polling to the client; the
//! WebSocket channel is the tracked alternative.

use axum::extract::{Path, Query, State};
use axum::Json;
use imagine_core::job::{JobStatus, Progress};
use imagine_core::validation::{validate_job_id, validate_prompt, ActionToken};
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub prompt: String,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub job_id: String,
    pub prompt: String,
}

#[derive(Debug, Deserialize)]
pub struct ButtonRequest {
    #[serde(default)]
    pub job_id: String,
    #[serde(default)]
    pub action: String,
    /// Prompt of the job the action applies to.
    #[serde(default)]
    pub prompt: String,
}

#[derive(Debug, Serialize)]
pub struct ButtonResponse {
    pub job_id: String,
    /// Derived label, e.g. `Upscale (U2) of: a red fox`.
    pub prompt: String,
    pub action: String,
    pub original_job_id: String,
}

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    #[serde(default)]
    pub prompt: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: JobStatus,
    pub progress: Progress,
    /// Local paths when the images were saved, else the provider URLs.
    pub images: Vec<String>,
    pub raw_data: serde_json::Value,
}

// ---------------------------------------------------------------------------
// POST /generate
// ---------------------------------------------------------------------------

/// Start a generation and return its job id.
pub async fn generate(
    State(state): State<AppState>,
    Json(input): Json<GenerateRequest>,
) -> AppResult<Json<DataResponse<GenerateResponse>>> {
    let prompt = validate_prompt(&input.prompt)?;
    let job_id = state.provider.imagine(&prompt).await?;

    tracing::info!(job_id = %job_id, "Generation started");

    Ok(Json(DataResponse {
        data: GenerateResponse { job_id, prompt },
    }))
}

// ---------------------------------------------------------------------------
// POST /button
// ---------------------------------------------------------------------------

/// Start an upscale or variation of a finished job.
pub async fn button(
    State(state): State<AppState>,
    Json(input): Json<ButtonRequest>,
) -> AppResult<Json<DataResponse<ButtonResponse>>> {
    let original_job_id = validate_job_id(&input.job_id)?;
    let token = ActionToken::parse(&input.action)?;
    let job_id = state
        .provider
        .button(&original_job_id, &token.to_string())
        .await?;

    tracing::info!(
        job_id = %job_id,
        source_job_id = %original_job_id,
        action = %token,
        "Action started",
    );

    Ok(Json(DataResponse {
        data: ButtonResponse {
            job_id,
            prompt: token.describe(&input.prompt),
            action: token.to_string(),
            original_job_id,
        },
    }))
}

// ---------------------------------------------------------------------------
// GET /status/{job_id}
// ---------------------------------------------------------------------------

/// One status check. On DONE the images are downloaded before returning.
///
/// Nothing is remembered between calls: every check of a DONE job saves
/// the images again into a new `<timestamp>_<job_id>` folder.
pub async fn status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    Query(query): Query<StatusQuery>,
) -> AppResult<Json<DataResponse<StatusResponse>>> {
    let job_id = validate_job_id(&job_id)?;
    let snapshot = state.provider.fetch_status(&job_id).await?;

    let images = if snapshot.status == JobStatus::Done && !snapshot.images.is_empty() {
        let saved = state
            .materializer
            .materialize(&job_id, &snapshot.images, &query.prompt, &snapshot.raw)
            .await;
        if saved.is_empty() {
            snapshot.images
        } else {
            saved
        }
    } else {
        snapshot.images
    };

    Ok(Json(DataResponse {
        data: StatusResponse {
            status: snapshot.status,
            progress: snapshot.progress,
            images,
            raw_data: snapshot.raw,
        },
    }))
}
