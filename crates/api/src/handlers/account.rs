use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// Plan type reported when the provider omits it.
pub const UNKNOWN_PLAN: &str = "UNKNOWN";

/// Account quota with provider omissions filled in.
#[derive(Debug, Serialize)]
pub struct CreditsResponse {
    pub credits_extra: f64,
    pub credits: f64,
    pub credits_quota: f64,
    pub plan_type: String,
    pub email: String,
    pub expired_at: String,
}

/// GET /api/credits
pub async fn credits(State(state): State<AppState>) -> AppResult<Json<DataResponse<CreditsResponse>>> {
    let info = state.provider.account_info().await?;

    Ok(Json(DataResponse {
        data: CreditsResponse {
            credits_extra: info.credits_extra.unwrap_or_default(),
            credits: info.credits.unwrap_or_default(),
            credits_quota: info.credits_quota.unwrap_or_default(),
            plan_type: info.plan_type.unwrap_or_else(|| UNKNOWN_PLAN.to_string()),
            email: info.email.unwrap_or_default(),
            expired_at: info.expired_at.unwrap_or_default(),
        },
    }))
}
