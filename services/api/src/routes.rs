use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde_json::json;
use std::sync::Arc;
use valora::config::AppConfig;
use valora::error::AppError;
use valora::feeds::{feeds_router, DataFeedService};
use valora::gateway::{gateway_router, OrchestratorClient};
use valora::marketplace::{marketplace_router, InMemoryMarketplaceRepository, MarketplaceService};
use valora::valuation::{
    serving_router, valuation_router, InMemoryJobStore, ValuationOrchestrator,
};

/// Orchestrator, model mocks, data feeds and marketplace on one router.
pub(crate) fn service_routes(config: &AppConfig) -> Result<Router, AppError> {
    let jobs = Arc::new(InMemoryJobStore::new());
    let orchestrator = Arc::new(ValuationOrchestrator::new(&config.valuation, jobs));
    let feeds = Arc::new(DataFeedService::new(&config.feeds)?);

    let marketplace = MarketplaceService::new(Arc::new(InMemoryMarketplaceRepository::new()));
    marketplace.seed_default_plans()?;

    Ok(
        valuation_router(orchestrator, config.valuation.max_upload_bytes)
            .merge(serving_router())
            .merge(feeds_router(feeds))
            .merge(marketplace_router(
                Arc::new(marketplace),
                &config.marketplace.api_key,
            ))
            .route("/healthz", get(healthcheck)),
    )
}

pub(crate) fn gateway_routes(config: &AppConfig) -> Result<Router, AppError> {
    let client = OrchestratorClient::new(&config.gateway)?;
    Ok(gateway_router(
        Arc::new(client),
        config.valuation.max_upload_bytes,
    ))
}

pub(crate) fn with_operational_routes(router: Router) -> Router {
    router
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    if state.is_ready() {
        (StatusCode::OK, Json(json!({ "status": "ready" })))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "initializing" })),
        )
    }
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
