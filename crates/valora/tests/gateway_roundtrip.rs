use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tempfile::TempDir;
use valora::config::{GatewayConfig, ValuationConfig};
use valora::gateway::{GatewayError, ImageUpload, OrchestratorClient};
use valora::valuation::{
    valuation_router, AssetClass, InMemoryJobStore, JobState, ValuationAttributes,
    ValuationOutcome, ValuationOrchestrator, ValuationRequest,
};

struct Orchestrator {
    client: OrchestratorClient,
    uploads: TempDir,
}

async fn spawn_orchestrator() -> Orchestrator {
    let uploads = tempfile::tempdir().expect("temp upload dir");
    let config = ValuationConfig {
        upload_dir: uploads.path().to_path_buf(),
        ..ValuationConfig::default()
    };
    let orchestrator = Arc::new(ValuationOrchestrator::new(
        &config,
        Arc::new(InMemoryJobStore::new()),
    ));
    let app = valuation_router(orchestrator, config.max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("orchestrator serves");
    });

    let client = OrchestratorClient::new(&GatewayConfig {
        orchestrator_url: format!("http://{addr}"),
        timeout: Duration::from_secs(5),
    })
    .expect("client builds");
    Orchestrator { client, uploads }
}

#[tokio::test]
async fn deferred_valuations_round_trip_through_the_gateway_client() {
    let orchestrator = spawn_orchestrator().await;
    let attributes: ValuationAttributes =
        serde_json::from_value(json!({"make": "Toyota", "model": "Camry", "year": 2021}))
            .expect("valid attributes");

    let outcome = orchestrator
        .client
        .submit(&ValuationRequest::new(AssetClass::Auto, attributes))
        .await
        .expect("submitted");
    let ValuationOutcome::Accepted(accepted) = outcome else {
        panic!("auto valuations are queued");
    };

    let job = orchestrator
        .client
        .job(&accepted.job_id)
        .await
        .expect("job visible upstream");
    assert_eq!(job.status, JobState::Queued);

    let err = orchestrator
        .client
        .job("job_unknown")
        .await
        .expect_err("unknown job");
    assert!(matches!(err, GatewayError::JobNotFound));
}

#[tokio::test]
async fn inline_valuations_come_back_completed() {
    let orchestrator = spawn_orchestrator().await;
    let attributes: ValuationAttributes =
        serde_json::from_value(json!({"address": "5 Elm St", "living_area_sqft": "1800"}))
            .expect("valid attributes");

    let outcome = orchestrator
        .client
        .submit(&ValuationRequest::new(AssetClass::RealEstate, attributes))
        .await
        .expect("submitted");
    match outcome {
        ValuationOutcome::Completed(response) => {
            assert_eq!(response.method, "baseline_gbr_v0");
            assert_eq!(response.comps.len(), 2);
        }
        other => panic!("real estate is valued inline, got {other:?}"),
    }
}

#[tokio::test]
async fn uploads_are_forwarded_and_rejections_keep_their_status() {
    let orchestrator = spawn_orchestrator().await;

    let receipt = orchestrator
        .client
        .upload(
            "val_9",
            ImageUpload {
                file_name: Some("kitchen.jpg".to_string()),
                content_type: Some("image/jpeg".to_string()),
                bytes: vec![0xff, 0xd8, 0xff],
            },
        )
        .await
        .expect("stored upstream");
    assert_eq!(receipt.status, "stored");
    assert!(orchestrator.uploads.path().join("val_9_kitchen.jpg").exists());

    let err = orchestrator
        .client
        .upload(
            "val_9",
            ImageUpload {
                file_name: Some("notes.txt".to_string()),
                content_type: Some("text/plain".to_string()),
                bytes: b"not an image".to_vec(),
            },
        )
        .await
        .expect_err("rejected upstream");
    match err {
        GatewayError::Rejected { status, detail } => {
            assert_eq!(status, 415);
            assert_eq!(detail, "Only images allowed");
        }
        other => panic!("unexpected error {other:?}"),
    }
}
