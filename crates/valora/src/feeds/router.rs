use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::{self, Next},
    response::Response,
    routing::get,
    Json, Router,
};
use serde_json::Value;
use tracing::warn;

use super::{DataFeedService, FeedKind, RateLimitExceeded};
use crate::error::ApiError;

const ANONYMOUS_CLIENT: &str = "anonymous";

/// Feed routes behind the per-client rate limiter.
pub fn feeds_router(service: Arc<DataFeedService>) -> Router {
    Router::new()
        .route("/feeds/interest-rates", get(interest_rates))
        .route("/feeds/property-sales/residential", get(residential_sales))
        .route("/feeds/property-sales/commercial", get(commercial_sales))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&service),
            enforce_rate_limit,
        ))
        .with_state(service)
}

async fn enforce_rate_limit(
    State(service): State<Arc<DataFeedService>>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let identifier = connect_info
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| ANONYMOUS_CLIENT.to_string());

    if let Err(err) = service.limiter().check(&identifier) {
        warn!(client = %identifier, "feed rate limit exceeded");
        return Err(err.into());
    }

    Ok(next.run(request).await)
}

async fn interest_rates(
    State(service): State<Arc<DataFeedService>>,
) -> Result<Json<Value>, ApiError> {
    serve(&service, FeedKind::InterestRates).await
}

async fn residential_sales(
    State(service): State<Arc<DataFeedService>>,
) -> Result<Json<Value>, ApiError> {
    serve(&service, FeedKind::ResidentialSales).await
}

async fn commercial_sales(
    State(service): State<Arc<DataFeedService>>,
) -> Result<Json<Value>, ApiError> {
    serve(&service, FeedKind::CommercialSales).await
}

async fn serve(service: &DataFeedService, kind: FeedKind) -> Result<Json<Value>, ApiError> {
    match service.feed(kind).await {
        Ok(body) => Ok(Json(body)),
        Err(err) => {
            warn!(feed = kind.cache_key(), error = %err, "feed fetch failed");
            Err(ApiError::Upstream(kind.failure_message().to_string()))
        }
    }
}

impl From<RateLimitExceeded> for ApiError {
    fn from(value: RateLimitExceeded) -> Self {
        Self::RateLimited(value.to_string())
    }
}
