//! Job submission and per-job status polling.
//!
//! [`JobTracker`] turns a validated prompt or follow-up action into a
//! provider job, records it as STARTING in the [`JobRegistry`], announces
//! it, and spawns one poll loop for it. The loop checks the provider at a
//! fixed interval, broadcasts every observation, and ends on a terminal
//! status, a failed status call, attempt exhaustion, or shutdown.

use std::sync::Arc;
use std::time::Duration;

use imagine_core::job::{JobRecord, JobStatus};
use imagine_core::payload::StatusSnapshot;
use imagine_core::protocol::ServerMessage;
use imagine_core::validation::{validate_job_id, validate_prompt, ActionToken};
use imagine_gallery::ImageMaterializer;
use imagine_provider::ImageProvider;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::engine::JobRegistry;
use crate::error::AppResult;
use crate::ws::BroadcastGateway;

/// Default delay between two status checks of the same job.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);

/// Poll loop tuning.
#[derive(Debug, Clone, Copy)]
pub struct PollSettings {
    pub interval: Duration,
    /// `None` polls until the provider reports a terminal status.
    pub max_attempts: Option<u32>,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: None,
        }
    }
}

/// How a poll loop ended.
enum PollOutcome {
    /// DONE; carries the image references sent to clients.
    Completed { images: Vec<String> },
    /// The provider reported FAILED or ERROR.
    Failed(JobStatus),
    /// A status call failed or the attempt budget ran out.
    Aborted(String),
    /// The tracker shut down.
    Cancelled,
}

/// Owns every running poll loop.
pub struct JobTracker {
    registry: Arc<JobRegistry>,
    gateway: Arc<BroadcastGateway>,
    provider: Arc<dyn ImageProvider>,
    materializer: ImageMaterializer,
    settings: PollSettings,
    cancel: CancellationToken,
    tasks: TaskTracker,
}

impl JobTracker {
    pub fn new(
        registry: Arc<JobRegistry>,
        gateway: Arc<BroadcastGateway>,
        provider: Arc<dyn ImageProvider>,
        materializer: ImageMaterializer,
        settings: PollSettings,
    ) -> Self {
        Self {
            registry,
            gateway,
            provider,
            materializer,
            settings,
            cancel: CancellationToken::new(),
            tasks: TaskTracker::new(),
        }
    }

    /// Validate `prompt`, start a generation and track it.
    pub async fn submit_prompt(
        &self,
        prompt: &str,
        display_group_id: Option<String>,
    ) -> AppResult<JobRecord> {
        let prompt = validate_prompt(prompt)?;
        let job_id = self.provider.imagine(&prompt).await?;
        tracing::info!(job_id = %job_id, "Generation started");

        Ok(self
            .track(JobRecord::starting(job_id, prompt, display_group_id))
            .await)
    }

    /// Validate an upscale/variation request on `job_id`, start it and
    /// track the derived job.
    pub async fn submit_action(
        &self,
        job_id: &str,
        action_token: &str,
        original_prompt: &str,
        display_group_id: Option<String>,
    ) -> AppResult<JobRecord> {
        let source_id = validate_job_id(job_id)?;
        let token = ActionToken::parse(action_token)?;
        let new_id = self.provider.button(&source_id, &token.to_string()).await?;
        tracing::info!(job_id = %new_id, source_job_id = %source_id, action = %token, "Action started");

        let prompt = token.describe(original_prompt);
        Ok(self
            .track(JobRecord::starting(new_id, prompt, display_group_id))
            .await)
    }

    /// Register `record`, announce it and spawn its poll loop.
    ///
    /// A job id that is already tracked keeps its existing loop; the
    /// tracked record is returned instead.
    pub async fn track(&self, record: JobRecord) -> JobRecord {
        if !self.registry.try_insert(record.clone()).await {
            tracing::warn!(job_id = %record.job_id, "Job already tracked, not polling it twice");
            return self.registry.get(&record.job_id).await.unwrap_or(record);
        }

        self.gateway
            .broadcast(&ServerMessage::GenerationStarted {
                job: record.clone(),
            })
            .await;

        let poll = PollLoop {
            job_id: record.job_id.clone(),
            display_group_id: record.display_group_id.clone(),
            prompt: record.prompt.clone(),
            registry: Arc::clone(&self.registry),
            gateway: Arc::clone(&self.gateway),
            provider: Arc::clone(&self.provider),
            materializer: self.materializer.clone(),
            settings: self.settings,
            cancel: self.cancel.child_token(),
        };
        self.tasks.spawn(poll.run());

        record
    }

    /// Number of poll loops still running.
    pub fn active_loops(&self) -> usize {
        self.tasks.len()
    }

    /// Cancel every poll loop and wait for them to finish.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        self.tasks.close();
        self.tasks.wait().await;
        tracing::info!("Job tracker shut down");
    }
}

/// State of a single job's polling task.
struct PollLoop {
    job_id: String,
    display_group_id: Option<String>,
    prompt: String,
    registry: Arc<JobRegistry>,
    gateway: Arc<BroadcastGateway>,
    provider: Arc<dyn ImageProvider>,
    materializer: ImageMaterializer,
    settings: PollSettings,
    cancel: CancellationToken,
}

impl PollLoop {
    async fn run(self) {
        tracing::debug!(job_id = %self.job_id, "Poll loop started");
        let mut attempts: u32 = 0;

        let outcome = loop {
            if let Some(max) = self.settings.max_attempts {
                if attempts >= max {
                    break self
                        .abort(format!("Polling gave up after {max} attempts"))
                        .await;
                }
            }
            attempts += 1;

            let result = tokio::select! {
                _ = self.cancel.cancelled() => break self.cancelled().await,
                result = self.provider.fetch_status(&self.job_id) => result,
            };

            let snapshot = match result {
                Ok(snapshot) => snapshot,
                Err(e) => break self.abort(e.to_string()).await,
            };

            if let Some(outcome) = self.observe(snapshot).await {
                break outcome;
            }

            tokio::select! {
                _ = self.cancel.cancelled() => break self.cancelled().await,
                _ = tokio::time::sleep(self.settings.interval) => {}
            }
        };

        match &outcome {
            PollOutcome::Completed { images } => {
                tracing::debug!(job_id = %self.job_id, attempts, images = images.len(), "Poll loop finished: completed");
            }
            PollOutcome::Failed(status) => {
                tracing::debug!(job_id = %self.job_id, attempts, status = %status, "Poll loop finished: failed");
            }
            PollOutcome::Aborted(reason) => {
                tracing::debug!(job_id = %self.job_id, attempts, error = %reason, "Poll loop finished: aborted");
            }
            PollOutcome::Cancelled => {
                tracing::debug!(job_id = %self.job_id, attempts, "Poll loop finished: cancelled");
            }
        }
    }

    /// Record and broadcast one status observation. Returns the outcome
    /// when it is terminal.
    async fn observe(&self, snapshot: StatusSnapshot) -> Option<PollOutcome> {
        let StatusSnapshot {
            status,
            progress,
            images,
            raw,
        } = snapshot;

        self.registry
            .update(&self.job_id, progress.clone(), status.clone())
            .await;
        self.gateway
            .broadcast(&ServerMessage::Progress {
                job_id: self.job_id.clone(),
                display_group_id: self.display_group_id.clone(),
                progress: progress.clone(),
                status: status.clone(),
            })
            .await;

        if status == JobStatus::Done {
            return Some(self.complete(images, raw).await);
        }

        if status.is_failure() {
            self.registry.remove(&self.job_id).await;
            tracing::warn!(job_id = %self.job_id, status = %status, "Generation failed");
            self.gateway
                .broadcast(&ServerMessage::GenerationFailed {
                    job_id: self.job_id.clone(),
                    display_group_id: self.display_group_id.clone(),
                    progress,
                    status: status.clone(),
                })
                .await;
            return Some(PollOutcome::Failed(status));
        }

        None
    }

    async fn complete(&self, urls: Vec<String>, raw: serde_json::Value) -> PollOutcome {
        let saved = if urls.is_empty() {
            Vec::new()
        } else {
            self.materializer
                .materialize(&self.job_id, &urls, &self.prompt, &raw)
                .await
        };
        let images = if saved.is_empty() { urls } else { saved };

        self.registry.remove(&self.job_id).await;
        tracing::info!(job_id = %self.job_id, images = images.len(), "Generation complete");
        self.gateway
            .broadcast(&ServerMessage::GenerationComplete {
                job_id: self.job_id.clone(),
                display_group_id: self.display_group_id.clone(),
                images: images.clone(),
                raw_data: raw,
            })
            .await;

        PollOutcome::Completed { images }
    }

    async fn abort(&self, reason: String) -> PollOutcome {
        self.registry.remove(&self.job_id).await;
        tracing::error!(job_id = %self.job_id, error = %reason, "Polling aborted");
        self.gateway
            .broadcast(&ServerMessage::Error {
                display_group_id: self.display_group_id.clone(),
                job_id: Some(self.job_id.clone()),
                message: reason.clone(),
            })
            .await;
        PollOutcome::Aborted(reason)
    }

    async fn cancelled(&self) -> PollOutcome {
        self.registry.remove(&self.job_id).await;
        tracing::debug!(job_id = %self.job_id, "Poll loop cancelled");
        PollOutcome::Cancelled
    }
}
