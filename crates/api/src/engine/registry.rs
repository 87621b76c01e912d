//! Process-wide table of tracked jobs.

use imagine_core::job::{JobRecord, JobStatus, Progress};
use indexmap::IndexMap;
use tokio::sync::RwLock;

/// In-memory map from job id to [`JobRecord`], kept in insertion order.
///
/// Shared as `Arc<JobRegistry>` between the tracker, its poll loops and the
/// broadcast gateway. Critical sections never span an await on I/O.
#[derive(Default)]
pub struct JobRegistry {
    jobs: RwLock<IndexMap<String, JobRecord>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the record stored under `job_id`.
    pub async fn put(&self, job_id: &str, record: JobRecord) {
        self.jobs.write().await.insert(job_id.to_string(), record);
    }

    /// Insert `record` only if its job id is not tracked yet.
    ///
    /// Returns `false` and leaves the existing record untouched otherwise.
    pub async fn try_insert(&self, record: JobRecord) -> bool {
        let mut jobs = self.jobs.write().await;
        if jobs.contains_key(&record.job_id) {
            return false;
        }
        jobs.insert(record.job_id.clone(), record);
        true
    }

    pub async fn get(&self, job_id: &str) -> Option<JobRecord> {
        self.jobs.read().await.get(job_id).cloned()
    }

    /// Overwrite progress and status of a tracked job. No-op when absent.
    pub async fn update(&self, job_id: &str, progress: Progress, status: JobStatus) {
        if let Some(record) = self.jobs.write().await.get_mut(job_id) {
            record.progress = progress;
            record.status = status;
        }
    }

    /// Stop tracking `job_id`. Idempotent.
    pub async fn remove(&self, job_id: &str) -> Option<JobRecord> {
        self.jobs.write().await.shift_remove(job_id)
    }

    /// All tracked records, oldest first.
    pub async fn snapshot(&self) -> Vec<JobRecord> {
        self.jobs.read().await.values().cloned().collect()
    }

    pub async fn contains(&self, job_id: &str) -> bool {
        self.jobs.read().await.contains_key(job_id)
    }

    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }
}
