use super::common::*;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use crate::valuation::{serving_router, JobStore};

#[tokio::test]
async fn real_estate_valuation_completes_inline() {
    let harness = harness();

    let response = harness
        .router
        .oneshot(json_request(
            "/valuations",
            &json!({
                "class": "real_estate",
                "attributes": {"living_area_sqft": 1850, "bedrooms": 3, "zip": "94110"}
            }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["status"], "completed");
    assert_eq!(payload["method"], "baseline_gbr_v0");
    let estimate = payload["estimate"].as_f64().expect("numeric estimate");
    let low = payload["interval_low"].as_f64().expect("numeric low");
    let high = payload["interval_high"].as_f64().expect("numeric high");
    assert!(estimate > 0.0);
    assert!(low < high);
}

#[tokio::test]
async fn repeated_real_estate_request_is_served_from_cache() {
    let harness = harness();
    let body = json!({
        "class": "real_estate",
        "attributes": {"address": "1 Market St", "zip": "94105", "living_area_sqft": "1400"}
    });

    let first = read_json_body(
        harness
            .router
            .clone()
            .oneshot(json_request("/valuations", &body))
            .await
            .expect("route executes"),
    )
    .await;
    let second = read_json_body(
        harness
            .router
            .oneshot(json_request("/valuations", &body))
            .await
            .expect("route executes"),
    )
    .await;

    assert_eq!(first["metadata"]["cache_hit"], false);
    assert_eq!(second["metadata"]["cache_hit"], true);
    assert_eq!(first["valuation_id"], second["valuation_id"]);
}

#[tokio::test]
async fn auto_valuation_is_queued_and_pollable() {
    let harness = harness();

    let response = harness
        .router
        .clone()
        .oneshot(json_request(
            "/valuations",
            &json!({"class": "auto", "attributes": {"make": "Tesla", "model": "Model 3"}}),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let accepted = read_json_body(response).await;
    assert_eq!(accepted["status"], "queued");
    assert_eq!(accepted["estimated_completion_seconds"], 120);
    let job_id = accepted["job_id"].as_str().expect("job id").to_string();
    assert_eq!(harness.jobs.len(), 1);

    let response = harness
        .router
        .oneshot(
            Request::get(format!("/jobs/{job_id}"))
                .body(Body::empty())
                .expect("valid request"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let job = read_json_body(response).await;
    assert_eq!(job["job_id"], job_id.as_str());
    assert_eq!(job["status"], "queued");
    assert_eq!(job["progress"]["processed"], 0);
    assert!(job["result_url"].is_null());
}

#[tokio::test]
async fn unknown_asset_class_is_unprocessable() {
    let harness = harness();

    let response = harness
        .router
        .oneshot(json_request(
            "/valuations",
            &json!({"class": "boat", "attributes": {}}),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let payload = read_json_body(response).await;
    assert_eq!(payload["detail"], "Unsupported asset class: boat");
    assert!(harness.jobs.is_empty());
}

#[tokio::test]
async fn malformed_body_is_unprocessable() {
    let harness = harness();

    let response = harness
        .router
        .oneshot(json_request(
            "/valuations",
            &json!({"class": "real_estate", "attributes": {"bedrooms": "many"}}),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn missing_job_returns_not_found() {
    let harness = harness();

    let response = harness
        .router
        .oneshot(
            Request::get("/jobs/job_missing")
                .body(Body::empty())
                .expect("valid request"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let payload = read_json_body(response).await;
    assert_eq!(payload["detail"], "Job not found");
}

#[tokio::test]
async fn image_upload_is_stored() {
    let harness = harness();

    let response = harness
        .router
        .oneshot(multipart_request(
            "/valuations/val_42/images",
            "image",
            "front.png",
            "image/png",
            b"png-bytes",
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json_body(response).await;
    assert_eq!(payload["status"], "stored");
    let stored = harness.uploads.path().join("val_42_front.png");
    assert_eq!(payload["path"], stored.display().to_string());
    assert_eq!(std::fs::read(stored).expect("file written"), b"png-bytes");
}

#[tokio::test]
async fn non_image_upload_is_rejected() {
    let harness = harness();

    let response = harness
        .router
        .oneshot(multipart_request(
            "/valuations/val_42/images",
            "image",
            "notes.txt",
            "text/plain",
            b"hello",
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    let payload = read_json_body(response).await;
    assert_eq!(payload["detail"], "Only images allowed");
}

#[tokio::test]
async fn upload_without_image_field_is_unprocessable() {
    let harness = harness();

    let response = harness
        .router
        .oneshot(multipart_request(
            "/valuations/val_42/images",
            "document",
            "front.png",
            "image/png",
            b"png-bytes",
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn oversized_upload_is_rejected() {
    let harness = harness();

    let response = harness
        .router
        .oneshot(multipart_request(
            "/valuations/val_42/images",
            "image",
            "huge.png",
            "image/png",
            &vec![0u8; 4096],
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn json_without_content_type_is_unsupported_media() {
    let harness = harness();

    let response = harness
        .router
        .oneshot(
            Request::post("/valuations")
                .header(header::CONTENT_TYPE, "text/plain")
                .body(Body::from("{}"))
                .expect("valid request"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn non_finite_numeric_attributes_are_unprocessable() {
    let harness = harness();

    for attributes in [
        json!({"living_area_sqft": "inf"}),
        json!({"bedrooms": "NaN"}),
        json!({"living_area_sqft": 1e300}),
    ] {
        let response = harness
            .router
            .clone()
            .oneshot(json_request(
                "/valuations",
                &json!({"class": "real_estate", "attributes": attributes}),
            ))
            .await
            .expect("route executes");
        assert_eq!(
            response.status(),
            StatusCode::UNPROCESSABLE_ENTITY,
            "{attributes} should be rejected"
        );
    }
}

#[tokio::test]
async fn largest_accepted_attributes_still_yield_finite_estimates() {
    let harness = harness();

    let response = harness
        .router
        .oneshot(json_request(
            "/valuations",
            &json!({
                "class": "real_estate",
                "attributes": {"living_area_sqft": "1e12", "bedrooms": -1e12, "bathrooms": 1e12}
            }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    let estimate = payload["estimate"].as_f64().expect("numeric estimate");
    let low = payload["interval_low"].as_f64().expect("numeric low");
    let high = payload["interval_high"].as_f64().expect("numeric high");
    assert!(estimate > 0.0);
    assert!(low < estimate && estimate < high);
}

#[tokio::test]
async fn predict_and_explain_routes_answer_over_http() {
    let router = serving_router();

    let response = router
        .clone()
        .oneshot(json_request(
            "/predict",
            &json!({"class": "real_estate", "attributes": {"living_area_sqft": 2000}}),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["estimate"], 420_000.0);
    assert_eq!(payload["confidence"], 0.74);

    let response = router
        .clone()
        .oneshot(json_request(
            "/explain",
            &json!({"class": "auto", "attributes": {}}),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["explanations"][0]["feature"], "living_area_sqft");
    assert_eq!(payload["explanations"].as_array().map(Vec::len), Some(2));

    let response = router
        .oneshot(json_request(
            "/predict",
            &json!({"class": "boat", "attributes": {}}),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let payload = read_json_body(response).await;
    assert_eq!(payload["detail"], "Unsupported asset class: boat");
}
