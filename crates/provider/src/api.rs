//! REST client for the ImaginePro HTTP endpoints.
//!
//! Wraps job submission (`/nova/imagine`), follow-up actions
//! (`/nova/button`), status retrieval (`/message/fetch/{id}`) and account
//! information using [`reqwest`].

use std::time::Duration;

use imagine_core::payload::{extract_job_id, StatusSnapshot};
use serde::{Deserialize, Serialize};

/// Production API root.
pub const DEFAULT_BASE_URL: &str = "https://api.imaginepro.ai/api/v1";

/// Server-side generation timeout requested with every `imagine` call.
const PROVIDER_JOB_TIMEOUT_SECS: u64 = 900;

/// Default ceiling for a single provider request.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Ceiling for the account-info request.
const ACCOUNT_INFO_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client for the provider API.
#[derive(Clone)]
pub struct ImagineProApi {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    request_timeout: Duration,
}

/// Account quota as reported by `/subscription/account-info`.
///
/// Every field is optional because the provider omits whatever does not
/// apply to the plan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountInfo {
    #[serde(default, rename(deserialize = "creditsExtra"))]
    pub credits_extra: Option<f64>,
    #[serde(default)]
    pub credits: Option<f64>,
    #[serde(default, rename(deserialize = "creditsQuota"))]
    pub credits_quota: Option<f64>,
    #[serde(default, rename(deserialize = "type"))]
    pub plan_type: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, rename(deserialize = "expiredAt"))]
    pub expired_at: Option<String>,
}

/// Errors from the provider REST layer.
#[derive(Debug, thiserror::Error)]
pub enum ProviderApiError {
    /// No API key was configured.
    #[error("API key not configured. Set the IMAGINEPRO_API_KEY environment variable.")]
    NotConfigured,

    /// The HTTP request itself failed (network, DNS, TLS, timeout, bad JSON).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider returned a non-2xx status code.
    #[error("Provider API error ({status}): {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// A start/button call succeeded but carried no job id.
    #[error("Provider response did not contain a job id")]
    MissingJobId,

    /// The job id cannot be used as a URL path segment.
    #[error("Invalid job id: '{0}'")]
    InvalidJobId(String),

    /// The configured base URL cannot be extended with a path segment.
    #[error("Invalid provider base URL: {0}")]
    InvalidBaseUrl(String),
}

impl ImagineProApi {
    /// Create a client for the given API root and key.
    ///
    /// * `base_url` - API root, e.g. [`DEFAULT_BASE_URL`].
    /// * `api_key`  - bearer token; an empty key makes every call fail with
    ///   [`ProviderApiError::NotConfigured`].
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, api_key)
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(
        client: reqwest::Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Override the per-request timeout (status checks and submissions).
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Whether an API key is present.
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    /// Start a generation. Returns the provider job id.
    pub async fn imagine(&self, prompt: &str) -> Result<String, ProviderApiError> {
        let body = serde_json::json!({
            "prompt": prompt,
            "timeout": PROVIDER_JOB_TIMEOUT_SECS,
        });
        let raw = self.post_json("nova/imagine", &body).await?;
        extract_job_id(&raw).ok_or(ProviderApiError::MissingJobId)
    }

    /// Apply an action token (`U1`..`V4`) to a finished job. Returns the
    /// id of the new job.
    pub async fn button(&self, job_id: &str, action: &str) -> Result<String, ProviderApiError> {
        let body = serde_json::json!({
            "messageId": job_id,
            "button": action,
        });
        let raw = self.post_json("nova/button", &body).await?;
        extract_job_id(&raw).ok_or(ProviderApiError::MissingJobId)
    }

    /// Fetch the raw status payload of a job.
    pub async fn fetch_raw_status(
        &self,
        job_id: &str,
    ) -> Result<serde_json::Value, ProviderApiError> {
        self.ensure_configured()?;

        let response = self
            .client
            .get(self.segment_url("message/fetch", job_id)?)
            .bearer_auth(&self.api_key)
            .timeout(self.request_timeout)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Fetch and normalize the status of a job.
    pub async fn fetch_status(&self, job_id: &str) -> Result<StatusSnapshot, ProviderApiError> {
        let raw = self.fetch_raw_status(job_id).await?;
        Ok(StatusSnapshot::from_payload(raw))
    }

    /// Retrieve account credits and plan details.
    pub async fn account_info(&self) -> Result<AccountInfo, ProviderApiError> {
        self.ensure_configured()?;

        let response = self
            .client
            .get(self.url("subscription/account-info"))
            .bearer_auth(&self.api_key)
            .timeout(ACCOUNT_INFO_TIMEOUT)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    // ---- private helpers ----

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// `{base}/{path}/{segment}` with `segment` percent-encoded as a single
    /// path segment.
    fn segment_url(&self, path: &str, segment: &str) -> Result<reqwest::Url, ProviderApiError> {
        if segment.is_empty() || segment == "." || segment == ".." {
            return Err(ProviderApiError::InvalidJobId(segment.to_string()));
        }
        let mut url = reqwest::Url::parse(&self.url(path))
            .map_err(|e| ProviderApiError::InvalidBaseUrl(format!("{}: {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|()| ProviderApiError::InvalidBaseUrl(self.base_url.clone()))?
            .push(segment);
        Ok(url)
    }

    fn ensure_configured(&self) -> Result<(), ProviderApiError> {
        if self.is_configured() {
            Ok(())
        } else {
            Err(ProviderApiError::NotConfigured)
        }
    }

    async fn post_json(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, ProviderApiError> {
        self.ensure_configured()?;

        let response = self
            .client
            .post(self.url(path))
            .bearer_auth(&self.api_key)
            .timeout(self.request_timeout)
            .json(body)
            .send()
            .await?;

        let raw = Self::parse_response(response).await?;
        tracing::debug!(path, "Provider call succeeded");
        Ok(raw)
    }

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or a [`ProviderApiError::ApiError`]
    /// containing the status and body text on failure.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, ProviderApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ProviderApiError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ProviderApiError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}
