//! Listing and deletion of persisted generation folders.

use std::path::PathBuf;

use imagine_core::error::CoreError;
use imagine_core::generation::{folder_matches, GalleryImage, GenerationMetadata, METADATA_FILE};
use imagine_core::validation::validate_generation_id;

use crate::error::GalleryError;

/// Read/delete access to the output directory.
#[derive(Debug, Clone)]
pub struct GalleryStore {
    output_dir: PathBuf,
}

impl GalleryStore {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Create the output directory if it does not exist yet.
    pub async fn ensure_output_dir(&self) -> Result<(), GalleryError> {
        tokio::fs::create_dir_all(&self.output_dir).await?;
        Ok(())
    }

    /// Metadata of every generation, newest folder first.
    ///
    /// Folders without a readable `metadata.json` are skipped (and logged
    /// when the document exists but does not parse).
    pub async fn list_generations(&self) -> Result<Vec<GenerationMetadata>, GalleryError> {
        let mut folders = self.folder_names().await?;
        folders.sort_unstable_by(|a, b| b.cmp(a));

        let mut generations = Vec::with_capacity(folders.len());
        for folder in folders {
            let path = self.output_dir.join(&folder).join(METADATA_FILE);
            let bytes = match tokio::fs::read(&path).await {
                Ok(bytes) => bytes,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => {
                    tracing::warn!(folder = %folder, error = %e, "Failed to read metadata");
                    continue;
                }
            };
            match serde_json::from_slice::<GenerationMetadata>(&bytes) {
                Ok(metadata) => generations.push(metadata),
                Err(e) => {
                    tracing::warn!(folder = %folder, error = %e, "Failed to parse metadata");
                }
            }
        }

        Ok(generations)
    }

    /// Every saved image across all generations, newest first.
    pub async fn list_images(&self) -> Result<Vec<GalleryImage>, GalleryError> {
        let generations = self.list_generations().await?;
        Ok(generations
            .iter()
            .flat_map(GenerationMetadata::gallery_images)
            .collect())
    }

    /// Delete the folder of `job_id` wholesale.
    ///
    /// The id is validated before the filesystem is touched. Returns the
    /// name of the deleted folder.
    pub async fn delete(&self, job_id: &str) -> Result<String, GalleryError> {
        validate_generation_id(job_id)?;

        let not_found = || {
            GalleryError::Core(CoreError::NotFound {
                entity: "Generation",
                id: job_id.to_string(),
            })
        };

        let folder = self
            .folder_names()
            .await?
            .into_iter()
            .find(|name| folder_matches(name, job_id))
            .ok_or_else(not_found)?;

        tokio::fs::remove_dir_all(self.output_dir.join(&folder)).await?;
        tracing::info!(job_id, folder = %folder, "Deleted generation folder");
        Ok(folder)
    }

    /// Names of the sub-directories of the output directory. A missing
    /// output directory is treated as empty.
    async fn folder_names(&self) -> Result<Vec<String>, GalleryError> {
        let mut entries = match tokio::fs::read_dir(&self.output_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        Ok(names)
    }
}
