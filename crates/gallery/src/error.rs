use imagine_core::error::CoreError;

/// Errors from listing or deleting persisted generations.
#[derive(Debug, thiserror::Error)]
pub enum GalleryError {
    /// A domain-level error (validation, not found).
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Filesystem error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Metadata error: {0}")]
    Json(#[from] serde_json::Error),
}
