use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use imagine_core::error::CoreError;
use imagine_gallery::GalleryError;
use imagine_provider::ProviderApiError;
use serde_json::json;

/// Application-level error type for HTTP and WebSocket handlers.
///
/// Wraps the domain errors of the lower crates. Implements
/// [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `imagine_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The image provider could not be reached or rejected the call.
    #[error(transparent)]
    Provider(#[from] ProviderApiError),

    /// Reading or deleting persisted generations failed.
    #[error(transparent)]
    Gallery(#[from] GalleryError),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Status, machine-readable code and client-facing message.
    ///
    /// Internal details are logged here and replaced with a generic message.
    pub fn classify(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Core(core) => classify_core(core),

            AppError::Gallery(gallery) => match gallery {
                GalleryError::Core(core) => classify_core(core),
                other => internal(other),
            },

            AppError::Provider(provider) => match provider {
                ProviderApiError::NotConfigured | ProviderApiError::InvalidBaseUrl(_) => {
                    tracing::error!(error = %provider, "Image provider is misconfigured");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "CONFIG_ERROR",
                        provider.to_string(),
                    )
                }
                ProviderApiError::InvalidJobId(_) => (
                    StatusCode::BAD_REQUEST,
                    "VALIDATION_ERROR",
                    provider.to_string(),
                ),
                other => {
                    tracing::warn!(error = %other, "Image provider call failed");
                    (StatusCode::BAD_GATEWAY, "PROVIDER_ERROR", other.to_string())
                }
            },
        }
    }

    /// Message suitable for a WebSocket `error` event.
    pub fn client_message(&self) -> String {
        self.classify().2
    }
}

fn classify_core(core: &CoreError) -> (StatusCode, &'static str, String) {
    match core {
        CoreError::NotFound { entity, id } => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{entity} with id {id} not found"),
        ),
        CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
    }
}

fn internal(err: &dyn std::fmt::Display) -> (StatusCode, &'static str, String) {
    tracing::error!(error = %err, "Internal error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.classify();

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}
