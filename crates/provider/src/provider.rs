use async_trait::async_trait;
use imagine_core::payload::StatusSnapshot;

use crate::api::{AccountInfo, ImagineProApi, ProviderApiError};

/// Operations the relay needs from an image-generation provider.
#[async_trait]
pub trait ImageProvider: Send + Sync {
    /// Start a generation and return the provider job id.
    async fn imagine(&self, prompt: &str) -> Result<String, ProviderApiError>;

    /// Start a follow-up action on `job_id` and return the new job id.
    async fn button(&self, job_id: &str, action: &str) -> Result<String, ProviderApiError>;

    /// One status check. Transport and non-2xx failures are errors;
    /// provider-reported FAILED/ERROR are not.
    async fn fetch_status(&self, job_id: &str) -> Result<StatusSnapshot, ProviderApiError>;

    async fn account_info(&self) -> Result<AccountInfo, ProviderApiError>;

    /// Whether credentials are present.
    fn is_configured(&self) -> bool {
        true
    }
}

#[async_trait]
impl ImageProvider for ImagineProApi {
    async fn imagine(&self, prompt: &str) -> Result<String, ProviderApiError> {
        ImagineProApi::imagine(self, prompt).await
    }

    async fn button(&self, job_id: &str, action: &str) -> Result<String, ProviderApiError> {
        ImagineProApi::button(self, job_id, action).await
    }

    async fn fetch_status(&self, job_id: &str) -> Result<StatusSnapshot, ProviderApiError> {
        ImagineProApi::fetch_status(self, job_id).await
    }

    async fn account_info(&self) -> Result<AccountInfo, ProviderApiError> {
        ImagineProApi::account_info(self).await
    }

    fn is_configured(&self) -> bool {
        ImagineProApi::is_configured(self)
    }
}
