use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;
use tracing::warn;

use super::jobs::{JobStore, JobStoreError};
use super::orchestrator::ValuationOrchestrator;
use super::schema::{
    AssetClass, JobStatus, UnsupportedAssetClass, ValuationOutcome, ValuationRequest,
};
use super::uploads::{ImageUploadStore, UploadError, UploadReceipt};
use crate::error::ApiError;

/// Router exposing valuation submission, job polling and image upload.
pub fn valuation_router<J>(
    orchestrator: Arc<ValuationOrchestrator<J>>,
    max_upload_bytes: usize,
) -> Router
where
    J: JobStore + 'static,
{
    Router::new()
        .route("/valuations", post(create_valuation::<J>))
        .route("/jobs/:job_id", get(get_job::<J>))
        .route(
            "/valuations/:valuation_id/images",
            post(upload_image::<J>).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .with_state(orchestrator)
}

pub(crate) async fn create_valuation<J>(
    State(orchestrator): State<Arc<ValuationOrchestrator<J>>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ValuationOutcome>, ApiError>
where
    J: JobStore + 'static,
{
    let Json(body) = payload?;
    let request = parse_request(body)?;
    Ok(Json(orchestrator.submit(&request)))
}

/// Decodes a request body, reporting an unknown class ahead of other field errors.
pub(crate) fn parse_request(body: Value) -> Result<ValuationRequest, ApiError> {
    if let Some(class) = body.get("class").and_then(Value::as_str) {
        class.parse::<AssetClass>()?;
    }
    serde_json::from_value(body).map_err(|err| ApiError::Validation(err.to_string()))
}

pub(crate) async fn get_job<J>(
    State(orchestrator): State<Arc<ValuationOrchestrator<J>>>,
    Path(job_id): Path<String>,
) -> Result<Json<JobStatus>, ApiError>
where
    J: JobStore + 'static,
{
    Ok(Json(orchestrator.job(&job_id)?))
}

pub(crate) async fn upload_image<J>(
    State(orchestrator): State<Arc<ValuationOrchestrator<J>>>,
    Path(valuation_id): Path<String>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadReceipt>), ApiError>
where
    J: JobStore + 'static,
{
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("image") {
            continue;
        }

        ImageUploadStore::ensure_image(field.content_type())?;
        let file_name = field.file_name().map(str::to_owned);
        let bytes = field.bytes().await?;
        let receipt = orchestrator
            .store_image(&valuation_id, file_name.as_deref(), &bytes)
            .await?;
        return Ok((StatusCode::CREATED, Json(receipt)));
    }

    Err(ApiError::Validation("multipart field 'image' is required".to_string()))
}

impl From<UnsupportedAssetClass> for ApiError {
    fn from(value: UnsupportedAssetClass) -> Self {
        Self::UnsupportedAssetClass(value.0)
    }
}

impl From<JobStoreError> for ApiError {
    fn from(value: JobStoreError) -> Self {
        match value {
            JobStoreError::NotFound(_) => Self::NotFound("Job not found".to_string()),
        }
    }
}

impl From<UploadError> for ApiError {
    fn from(value: UploadError) -> Self {
        match value {
            UploadError::UnsupportedMediaType => Self::UnsupportedMediaType(value.to_string()),
            UploadError::InvalidName(_) => Self::Validation(value.to_string()),
            UploadError::Io(err) => {
                warn!(error = %err, "image upload failed");
                Self::Internal("Failed to store upload".to_string())
            }
        }
    }
}
