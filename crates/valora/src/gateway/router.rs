use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::{info, warn};

use super::client::{ImageUpload, OrchestratorClient};
use super::GatewayError;
use crate::error::ApiError;
use crate::valuation::router::parse_request;
use crate::valuation::{JobStatus, UploadReceipt, ValuationOutcome};

/// Gateway routes mirroring the orchestrator's public surface.
pub fn gateway_router(client: Arc<OrchestratorClient>, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/valuations", post(submit_valuation))
        .route("/jobs/:job_id", get(get_job))
        .route(
            "/valuations/:valuation_id/images",
            post(upload_image).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .with_state(client)
}

async fn healthz() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn submit_valuation(
    State(client): State<Arc<OrchestratorClient>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ValuationOutcome>, ApiError> {
    let Json(body) = payload?;
    let request = parse_request(body)?;
    let outcome = client.submit(&request).await?;
    info!(class = %request.class, "valuation forwarded");
    Ok(Json(outcome))
}

async fn get_job(
    State(client): State<Arc<OrchestratorClient>>,
    Path(job_id): Path<String>,
) -> Result<Json<JobStatus>, ApiError> {
    Ok(Json(client.job(&job_id).await?))
}

async fn upload_image(
    State(client): State<Arc<OrchestratorClient>>,
    Path(valuation_id): Path<String>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadReceipt>), ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("image") {
            continue;
        }
        let file_name = field.file_name().map(str::to_owned);
        let content_type = field.content_type().map(str::to_owned);
        let bytes = field.bytes().await?;

        let receipt = client
            .upload(
                &valuation_id,
                ImageUpload {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                },
            )
            .await?;
        return Ok((StatusCode::CREATED, Json(receipt)));
    }

    Err(ApiError::Validation("multipart field 'image' is required".to_string()))
}

impl From<GatewayError> for ApiError {
    fn from(value: GatewayError) -> Self {
        match value {
            GatewayError::UsageLimit => Self::RateLimited(value.to_string()),
            GatewayError::JobNotFound => Self::NotFound(value.to_string()),
            GatewayError::Rejected { status, detail } => match status {
                404 => Self::NotFound(detail),
                413 => Self::PayloadTooLarge(detail),
                415 => Self::UnsupportedMediaType(detail),
                400 | 422 => Self::Validation(detail),
                _ => {
                    warn!(status, %detail, "orchestrator rejected upload");
                    Self::Upstream(detail)
                }
            },
            GatewayError::UploadFailed(ref err) => {
                warn!(error = %err, "upload forwarding failed");
                Self::Upstream(value.to_string())
            }
            GatewayError::Upstream(ref err) => {
                warn!(error = %err, "orchestrator request failed");
                Self::Upstream(value.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{header, Request};
    use httpmock::prelude::*;
    use tower::ServiceExt;

    use super::*;
    use crate::config::GatewayConfig;

    fn router(base_url: String) -> Router {
        let client = OrchestratorClient::new(&GatewayConfig {
            orchestrator_url: base_url,
            timeout: Duration::from_secs(2),
        })
        .expect("client builds");
        gateway_router(Arc::new(client), 1024)
    }

    async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.oneshot(request).await.expect("route executes");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .expect("read body");
        (status, serde_json::from_slice(&bytes).expect("json body"))
    }

    fn valuation_post(body: Value) -> Request<Body> {
        Request::post("/valuations")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("valid request")
    }

    #[tokio::test]
    async fn healthz_answers_without_upstream() {
        let (status, body) = send(
            router("http://127.0.0.1:9".to_string()),
            Request::get("/healthz").body(Body::empty()).expect("valid request"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn usage_limit_maps_to_429() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/valuations");
            then.status(429);
        });

        let (status, body) = send(
            router(server.base_url()),
            valuation_post(json!({"class": "auto", "attributes": {"make": "Toyota"}})),
        )
        .await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["detail"], "Usage limit exceeded");
    }

    #[tokio::test]
    async fn unknown_classes_are_rejected_before_forwarding() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/valuations");
            then.status(200);
        });

        let (status, body) = send(
            router(server.base_url()),
            valuation_post(json!({"class": "boat", "attributes": {}})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["detail"], "Unsupported asset class: boat");
        mock.assert_hits(0);
    }

    #[tokio::test]
    async fn unreachable_orchestrator_is_bad_gateway() {
        let (status, body) = send(
            router("http://127.0.0.1:9".to_string()),
            Request::get("/jobs/job_1").body(Body::empty()).expect("valid request"),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["detail"], "Valuation service unavailable");
    }

    #[tokio::test]
    async fn job_lookups_are_forwarded() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/jobs/job_1");
            then.status(200).json_body(json!({
                "job_id": "job_1",
                "status": "queued",
                "submitted_at": "2024-01-01T00:00:00Z",
                "updated_at": "2024-01-01T00:00:00Z",
                "progress": {"processed": 0, "total": 0, "succeeded": 0, "failed": 0}
            }));
        });
        server.mock(|when, then| {
            when.method(GET).path("/jobs/job_2");
            then.status(404);
        });

        let (status, body) = send(
            router(server.base_url()),
            Request::get("/jobs/job_1").body(Body::empty()).expect("valid request"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "queued");

        let (status, body) = send(
            router(server.base_url()),
            Request::get("/jobs/job_2").body(Body::empty()).expect("valid request"),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["detail"], "Job not found");
    }
}
