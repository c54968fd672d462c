use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request};
use axum::response::Response;
use axum::Router;
use serde_json::Value;
use tempfile::TempDir;

use crate::config::ValuationConfig;
use crate::valuation::{valuation_router, InMemoryJobStore, ValuationOrchestrator};

pub(super) const BOUNDARY: &str = "valora-test-boundary";

pub(super) struct Harness {
    pub(super) router: Router,
    pub(super) jobs: Arc<InMemoryJobStore>,
    pub(super) uploads: TempDir,
}

pub(super) fn harness() -> Harness {
    let uploads = tempfile::tempdir().expect("temp upload dir");
    let config = ValuationConfig {
        upload_dir: uploads.path().to_path_buf(),
        max_upload_bytes: 1024,
        ..ValuationConfig::default()
    };
    let jobs = Arc::new(InMemoryJobStore::new());
    let orchestrator = Arc::new(ValuationOrchestrator::new(&config, Arc::clone(&jobs)));

    Harness {
        router: valuation_router(orchestrator, config.max_upload_bytes),
        jobs,
        uploads,
    }
}

pub(super) fn json_request(uri: &str, body: &Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(body).expect("serializable body")))
        .expect("valid request")
}

pub(super) fn multipart_request(
    uri: &str,
    field: &str,
    file_name: &str,
    content_type: &str,
    bytes: &[u8],
) -> Request<Body> {
    let mut body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::post(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .expect("valid request")
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
