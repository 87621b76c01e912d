//! Downloads result images of a finished job to local storage.
//!
//! Every URL is fetched independently with its own timeout; a failed or
//! slow download only drops that one image. The materializer never
//! returns an error: callers fall back to the remote URLs when nothing was
//! saved.

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures::future::join_all;
use imagine_core::generation::{
    folder_name, folder_timestamp, image_file_name, public_path, GenerationMetadata,
    METADATA_FILE,
};
use imagine_core::payload::extract_buttons;

/// Default ceiling for a single image download.
pub const DEFAULT_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Saves provider images under `<output_dir>/<timestamp>_<job_id>/`.
#[derive(Clone)]
pub struct ImageMaterializer {
    client: reqwest::Client,
    output_dir: PathBuf,
    download_timeout: Duration,
}

impl ImageMaterializer {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            client: reqwest::Client::new(),
            output_dir: output_dir.into(),
            download_timeout: DEFAULT_DOWNLOAD_TIMEOUT,
        }
    }

    /// Override the per-image download timeout.
    pub fn with_download_timeout(mut self, timeout: Duration) -> Self {
        self.download_timeout = timeout;
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Download `urls`, write `metadata.json`, and return the public paths
    /// of the images actually saved (possibly fewer than `urls`).
    pub async fn materialize(
        &self,
        job_id: &str,
        urls: &[String],
        prompt: &str,
        raw: &serde_json::Value,
    ) -> Vec<String> {
        if job_id.is_empty() || job_id.contains(['/', '\\']) || job_id.contains("..") {
            tracing::error!(job_id, "Refusing to materialize job with unsafe id");
            return Vec::new();
        }

        let timestamp = folder_timestamp(chrono::Utc::now());
        let folder = folder_name(&timestamp, job_id);
        let folder_path = self.output_dir.join(&folder);

        if let Err(e) = tokio::fs::create_dir_all(&folder_path).await {
            tracing::error!(
                job_id,
                path = %folder_path.display(),
                error = %e,
                "Failed to create generation folder",
            );
            return Vec::new();
        }

        let downloads = urls.iter().enumerate().map(|(index, url)| {
            let file_name = image_file_name(index, url);
            let target = folder_path.join(&file_name);
            async move {
                match self.download(url, &target).await {
                    Ok(()) => Some(file_name),
                    Err(e) => {
                        tracing::warn!(
                            job_id,
                            image = index + 1,
                            url = %url,
                            error = %e,
                            "Failed to download image",
                        );
                        None
                    }
                }
            }
        });

        let saved: Vec<String> = join_all(downloads)
            .await
            .into_iter()
            .flatten()
            .map(|file_name| public_path(&folder, &file_name))
            .collect();

        let metadata = GenerationMetadata {
            job_id: job_id.to_string(),
            timestamp,
            prompt: prompt.to_string(),
            image_count: saved.len(),
            images: saved.clone(),
            original_urls: urls.to_vec(),
            buttons: extract_buttons(raw),
            raw_response: raw.clone(),
        };

        if let Err(e) = write_metadata(&folder_path, &metadata).await {
            tracing::error!(job_id, error = %e, "Failed to write generation metadata");
        }

        tracing::info!(
            job_id,
            folder = %folder,
            requested = urls.len(),
            saved = saved.len(),
            "Images materialized",
        );

        saved
    }

    /// Fetch one URL and write its bytes to `target`.
    async fn download(&self, url: &str, target: &Path) -> Result<(), DownloadError> {
        let bytes = self
            .client
            .get(url)
            .timeout(self.download_timeout)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        tokio::fs::write(target, &bytes).await?;
        Ok(())
    }
}

async fn write_metadata(folder: &Path, metadata: &GenerationMetadata) -> Result<(), DownloadError> {
    let json = serde_json::to_vec_pretty(metadata)?;
    tokio::fs::write(folder.join(METADATA_FILE), json).await?;
    Ok(())
}

/// Failure of a single download or metadata write. Never leaves this module.
#[derive(Debug, thiserror::Error)]
enum DownloadError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
