//! WebSocket wire protocol.
//!
//! Every frame is a JSON object tagged by `"type"`. Inbound frames are
//! [`ClientMessage`]s, outbound frames are [`ServerMessage`]s.

use serde::{Deserialize, Serialize};

use crate::job::{JobRecord, JobStatus, Progress};

/// Messages sent by browser clients.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Start a new generation.
    Generate {
        #[serde(default)]
        prompt: String,
        #[serde(default)]
        display_group_id: Option<String>,
    },
    /// Apply an upscale/variation action to a finished job.
    ButtonAction {
        #[serde(default)]
        job_id: String,
        #[serde(default)]
        action_token: String,
        #[serde(default)]
        original_prompt: String,
        #[serde(default)]
        display_group_id: Option<String>,
    },
}

impl ClientMessage {
    /// Parse an inbound text frame.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Correlation token of the message, for scoping error replies.
    pub fn display_group_id(&self) -> Option<&str> {
        match self {
            Self::Generate {
                display_group_id, ..
            }
            | Self::ButtonAction {
                display_group_id, ..
            } => display_group_id.as_deref(),
        }
    }
}

/// Messages pushed to browser clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Snapshot of all tracked jobs, sent once on connect.
    ActiveJobs { jobs: Vec<JobRecord> },

    /// A job was accepted by the provider and is now tracked.
    GenerationStarted {
        #[serde(flatten)]
        job: JobRecord,
    },

    /// One poll tick observed this status.
    Progress {
        job_id: String,
        display_group_id: Option<String>,
        progress: Progress,
        status: JobStatus,
    },

    /// The job finished. `images` are local paths when saved, else the
    /// provider URLs.
    GenerationComplete {
        job_id: String,
        display_group_id: Option<String>,
        images: Vec<String>,
        raw_data: serde_json::Value,
    },

    /// The provider reported FAILED or ERROR.
    GenerationFailed {
        job_id: String,
        display_group_id: Option<String>,
        progress: Progress,
        status: JobStatus,
    },

    /// A request failed or tracking of a job was aborted.
    Error {
        display_group_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        job_id: Option<String>,
        message: String,
    },
}

impl ServerMessage {
    /// Wire name of the message, as used in the `"type"` field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ActiveJobs { .. } => "active_jobs",
            Self::GenerationStarted { .. } => "generation_started",
            Self::Progress { .. } => "progress",
            Self::GenerationComplete { .. } => "generation_complete",
            Self::GenerationFailed { .. } => "generation_failed",
            Self::Error { .. } => "error",
        }
    }

    /// Serialize to a JSON text frame.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
