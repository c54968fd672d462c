use std::sync::Arc;

use tracing::info;

use super::jobs::{next_job_id, JobStore, JobStoreError};
use super::schema::{
    AcceptanceStatus, AcceptedResponse, ExecutionMode, JobStatus, ValuationOutcome,
    ValuationRequest,
};
use super::service::ValuationService;
use super::uploads::{ImageUploadStore, UploadError, UploadReceipt};
use crate::config::ValuationConfig;

/// Composes dispatch, job tracking and image storage behind the HTTP routes.
pub struct ValuationOrchestrator<J> {
    service: ValuationService,
    jobs: Arc<J>,
    uploads: ImageUploadStore,
    estimated_completion_seconds: u32,
}

impl<J> ValuationOrchestrator<J>
where
    J: JobStore + 'static,
{
    pub fn new(config: &ValuationConfig, jobs: Arc<J>) -> Self {
        Self {
            service: ValuationService::new(config.cache_ttl),
            jobs,
            uploads: ImageUploadStore::new(config.upload_dir.clone()),
            estimated_completion_seconds: config.estimated_completion_seconds,
        }
    }

    pub fn service(&self) -> &ValuationService {
        &self.service
    }

    pub fn jobs(&self) -> &J {
        &self.jobs
    }

    /// Prices inline classes immediately; queues everything else.
    ///
    /// Queued jobs are recorded but nothing advances them past `queued`.
    pub fn submit(&self, request: &ValuationRequest) -> ValuationOutcome {
        match request.class.execution_mode() {
            ExecutionMode::Inline => {
                let response = self.service.valuate(request);
                info!(
                    class = %request.class,
                    valuation_id = %response.valuation_id,
                    estimate = response.estimate,
                    correlator_id = request.correlator_id.as_deref().unwrap_or("-"),
                    "valuation completed"
                );
                ValuationOutcome::Completed(response)
            }
            ExecutionMode::Deferred => {
                let job_id = next_job_id();
                self.jobs.create(&job_id);
                info!(
                    class = %request.class,
                    job_id = %job_id,
                    correlator_id = request.correlator_id.as_deref().unwrap_or("-"),
                    "valuation queued"
                );
                ValuationOutcome::Accepted(AcceptedResponse {
                    job_id,
                    status: AcceptanceStatus::Queued,
                    estimated_completion_seconds: Some(self.estimated_completion_seconds),
                })
            }
        }
    }

    pub fn job(&self, job_id: &str) -> Result<JobStatus, JobStoreError> {
        self.jobs.get(job_id)
    }

    pub async fn store_image(
        &self,
        valuation_id: &str,
        file_name: Option<&str>,
        bytes: &[u8],
    ) -> Result<UploadReceipt, UploadError> {
        self.uploads.store(valuation_id, file_name, bytes).await
    }
}
