//! On-disk layout of persisted generations.
//!
//! Each finished job gets one folder `<timestamp>_<job_id>` holding the
//! downloaded `image_N.<ext>` files and a `metadata.json` document.

use serde::{Deserialize, Serialize};

use crate::types::Timestamp;

/// Name of the metadata document inside a generation folder.
pub const METADATA_FILE: &str = "metadata.json";

/// URL prefix under which the output directory is served.
pub const OUTPUT_URL_PREFIX: &str = "/output";

/// Extension used when the image URL does not carry one.
pub const DEFAULT_IMAGE_EXTENSION: &str = "png";

/// `strftime` format of the folder timestamp, e.g. `20250101_120000`.
pub const FOLDER_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Metadata written next to the downloaded images.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationMetadata {
    /// Older folders used `message_id`.
    #[serde(alias = "message_id")]
    pub job_id: String,
    pub timestamp: String,
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub image_count: usize,
    /// Public paths (`/output/<folder>/<file>`) of saved images.
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub original_urls: Vec<String>,
    /// Follow-up action tokens offered by the provider.
    #[serde(default)]
    pub buttons: Vec<serde_json::Value>,
    #[serde(default)]
    pub raw_response: serde_json::Value,
}

/// One image in the flattened gallery view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GalleryImage {
    pub url: String,
    pub timestamp: String,
    pub prompt: String,
    pub job_id: String,
}

impl GenerationMetadata {
    /// Flatten into one [`GalleryImage`] per saved image.
    pub fn gallery_images(&self) -> impl Iterator<Item = GalleryImage> + '_ {
        self.images.iter().map(move |url| GalleryImage {
            url: url.clone(),
            timestamp: self.timestamp.clone(),
            prompt: self.prompt.clone(),
            job_id: self.job_id.clone(),
        })
    }
}

/// Format the folder timestamp.
pub fn folder_timestamp(at: Timestamp) -> String {
    at.format(FOLDER_TIMESTAMP_FORMAT).to_string()
}

/// Folder name for a job: `<timestamp>_<job_id>`.
pub fn folder_name(timestamp: &str, job_id: &str) -> String {
    format!("{timestamp}_{job_id}")
}

/// Whether a folder name belongs to `job_id`.
pub fn folder_matches(folder: &str, job_id: &str) -> bool {
    folder
        .strip_suffix(job_id)
        .is_some_and(|rest| rest.ends_with('_'))
}

/// Extension of the last path segment of `url`, ignoring any query string.
pub fn image_extension(url: &str) -> String {
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    let last_segment = without_query.rsplit('/').next().unwrap_or(without_query);
    match last_segment.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty()
                && !ext.is_empty()
                && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            ext.to_ascii_lowercase()
        }
        _ => DEFAULT_IMAGE_EXTENSION.to_string(),
    }
}

/// File name of the image at zero-based `index`: `image_<index+1>.<ext>`.
pub fn image_file_name(index: usize, url: &str) -> String {
    format!("image_{}.{}", index + 1, image_extension(url))
}

/// Public path of a saved file.
pub fn public_path(folder: &str, file_name: &str) -> String {
    format!("{OUTPUT_URL_PREFIX}/{folder}/{file_name}")
}
