use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use url::Url;

use super::schema::{JobProgress, JobState, JobStatus};

/// Tracked job, owned by the store for the lifetime of the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRecord {
    pub job_id: String,
    pub status: JobState,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub progress: JobProgress,
    pub result_url: Option<Url>,
}

impl JobRecord {
    pub fn status_view(&self) -> JobStatus {
        JobStatus {
            job_id: self.job_id.clone(),
            status: self.status,
            submitted_at: self.submitted_at,
            updated_at: self.updated_at,
            progress: self.progress,
            result_url: self.result_url.clone(),
        }
    }
}

/// State transition applied by [`JobStore::update`].
///
/// `progress` is only replaced when present; `result_url` always overwrites the stored
/// value so a transition without a result clears it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobUpdate {
    pub status: JobState,
    pub progress: Option<JobProgress>,
    pub result_url: Option<Url>,
}

impl JobUpdate {
    pub fn status(status: JobState) -> Self {
        Self {
            status,
            progress: None,
            result_url: None,
        }
    }
}

/// Storage abstraction for asynchronous valuation jobs.
pub trait JobStore: Send + Sync {
    fn create(&self, job_id: &str) -> JobStatus;
    fn update(&self, job_id: &str, update: JobUpdate) -> Result<JobStatus, JobStoreError>;
    fn get(&self, job_id: &str) -> Result<JobStatus, JobStoreError>;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JobStoreError {
    #[error("job {0} not found")]
    NotFound(String),
}

/// Lock-guarded map of jobs. Records are never evicted.
#[derive(Debug, Default)]
pub struct InMemoryJobStore {
    jobs: Mutex<HashMap<String, JobRecord>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl JobStore for InMemoryJobStore {
    fn create(&self, job_id: &str) -> JobStatus {
        let now = Utc::now();
        let record = JobRecord {
            job_id: job_id.to_string(),
            status: JobState::Queued,
            submitted_at: now,
            updated_at: now,
            progress: JobProgress::default(),
            result_url: None,
        };
        let view = record.status_view();
        self.jobs
            .lock()
            .expect("job store mutex poisoned")
            .insert(job_id.to_string(), record);
        view
    }

    fn update(&self, job_id: &str, update: JobUpdate) -> Result<JobStatus, JobStoreError> {
        let mut guard = self.jobs.lock().expect("job store mutex poisoned");
        let record = guard
            .get_mut(job_id)
            .ok_or_else(|| JobStoreError::NotFound(job_id.to_string()))?;

        record.status = update.status;
        if let Some(progress) = update.progress {
            record.progress = progress;
        }
        record.result_url = update.result_url;
        record.updated_at = Utc::now();
        Ok(record.status_view())
    }

    fn get(&self, job_id: &str) -> Result<JobStatus, JobStoreError> {
        let guard = self.jobs.lock().expect("job store mutex poisoned");
        guard
            .get(job_id)
            .map(JobRecord::status_view)
            .ok_or_else(|| JobStoreError::NotFound(job_id.to_string()))
    }

    fn len(&self) -> usize {
        self.jobs.lock().expect("job store mutex poisoned").len()
    }
}

/// Fresh opaque job identifier.
pub fn next_job_id() -> String {
    format!("job_{}", uuid::Uuid::new_v4().simple())
}
