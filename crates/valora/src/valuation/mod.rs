//! Valuation orchestration: per class pipelines, job tracking and image uploads.

pub mod batch;
pub mod jobs;
pub mod orchestrator;
pub mod pipeline;
pub mod router;
pub mod schema;
pub mod service;
pub mod serving;
pub mod uploads;

#[cfg(test)]
mod tests;

pub use batch::{valuate_csv, valuate_json, BatchReport, BatchRowError, BatchRowOutcome};
pub use jobs::{InMemoryJobStore, JobRecord, JobStore, JobStoreError, JobUpdate};
pub use orchestrator::ValuationOrchestrator;
pub use pipeline::{AutoPipeline, RealEstatePipeline, ValuationPipeline};
pub use router::valuation_router;
pub use schema::{
    AcceptanceStatus, AcceptedResponse, AssetClass, Comparable, Direction, ExecutionMode,
    Explanation, JobProgress, JobState, JobStatus, UnsupportedAssetClass, ValuationAttributes,
    ValuationOutcome, ValuationRequest, ValuationResponse, ValuationStatus,
};
pub use service::ValuationService;
pub use serving::serving_router;
pub use uploads::{ImageUploadStore, UploadError, UploadReceipt};
