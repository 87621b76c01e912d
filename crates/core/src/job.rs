//! Job records tracked while a generation is in flight.
//!
//! A [`JobRecord`] lives in the registry from the moment the provider hands
//! out a job id until the poll loop observes a terminal [`JobStatus`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{JobId, Timestamp};

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Provider job status, upper-cased on ingestion.
///
/// Values the provider invents that we do not know about are kept verbatim
/// in [`JobStatus::Other`] and treated as non-terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JobStatus {
    Starting,
    Queued,
    Processing,
    Done,
    Failed,
    Error,
    Other(String),
}

impl JobStatus {
    /// Normalize a raw provider status string (case-insensitive).
    pub fn parse(raw: &str) -> Self {
        let upper = raw.trim().to_uppercase();
        match upper.as_str() {
            "STARTING" => Self::Starting,
            "QUEUED" => Self::Queued,
            "PROCESSING" => Self::Processing,
            "DONE" => Self::Done,
            "FAILED" => Self::Failed,
            "ERROR" => Self::Error,
            _ => Self::Other(upper),
        }
    }

    /// Canonical upper-case wire form.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Starting => "STARTING",
            Self::Queued => "QUEUED",
            Self::Processing => "PROCESSING",
            Self::Done => "DONE",
            Self::Failed => "FAILED",
            Self::Error => "ERROR",
            Self::Other(s) => s,
        }
    }

    /// DONE, FAILED and ERROR stop polling.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed | Self::Error)
    }

    /// FAILED and ERROR are provider-reported failures (not transport errors).
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed | Self::Error)
    }
}

impl From<String> for JobStatus {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<JobStatus> for String {
    fn from(value: JobStatus) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// Placeholder used when the provider reports no progress at all.
pub const PROGRESS_PLACEHOLDER: &str = "...";

/// Provider progress indicator.
///
/// Some providers report a percentage, others an opaque status string, so
/// both shapes are preserved as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Progress {
    Numeric(serde_json::Number),
    Text(String),
}

impl Progress {
    /// Progress of a job that has just been submitted.
    pub fn zero() -> Self {
        Self::Numeric(0.into())
    }

    /// The `"..."` placeholder.
    pub fn placeholder() -> Self {
        Self::Text(PROGRESS_PLACEHOLDER.to_string())
    }

    /// Convert an arbitrary JSON value. Returns `None` for `null`.
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Null => None,
            serde_json::Value::Number(n) => Some(Self::Numeric(n.clone())),
            serde_json::Value::String(s) => Some(Self::Text(s.clone())),
            other => Some(Self::Text(other.to_string())),
        }
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// One in-flight generation or follow-up action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub job_id: JobId,
    /// Client correlation token, passed through untouched.
    pub display_group_id: Option<String>,
    pub prompt: String,
    pub progress: Progress,
    pub status: JobStatus,
    pub created_at: Timestamp,
}

impl JobRecord {
    /// A freshly submitted job: `STARTING` with zero progress.
    pub fn starting(
        job_id: impl Into<JobId>,
        prompt: impl Into<String>,
        display_group_id: Option<String>,
    ) -> Self {
        Self {
            job_id: job_id.into(),
            display_group_id,
            prompt: prompt.into(),
            progress: Progress::zero(),
            status: JobStatus::Starting,
            created_at: chrono::Utc::now(),
        }
    }
}
