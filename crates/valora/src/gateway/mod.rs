//! Public gateway forwarding valuation traffic to the orchestrator.

mod client;
pub mod router;

pub use client::{ImageUpload, OrchestratorClient};
pub use router::gateway_router;

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Usage limit exceeded")]
    UsageLimit,
    #[error("Job not found")]
    JobNotFound,
    /// Upload refused by the orchestrator with a non-success status.
    #[error("{detail}")]
    Rejected { status: u16, detail: String },
    #[error("Upload failed")]
    UploadFailed(#[source] reqwest::Error),
    #[error("Valuation service unavailable")]
    Upstream(#[from] reqwest::Error),
}
