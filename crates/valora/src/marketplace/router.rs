use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use tracing::{error, warn};

use super::domain::{
    ListingView, NewListing, NewListingWithProperty, NewOffer, NewPayment, NewPlan, NewProperty,
    NewSubscription, NewUser, NewValuation, Offer, Payment, PropertyValuation, PropertyView,
    Subscription, SubscriptionPlan, User,
};
use super::repository::{MarketplaceRepository, RepositoryError};
use super::service::{MarketplaceError, MarketplaceService};
use crate::error::ApiError;

const API_KEY_HEADER: &str = "x-api-key";

type Created<T> = Result<(StatusCode, Json<T>), ApiError>;
type Shared<R> = State<Arc<MarketplaceService<R>>>;

/// Marketplace routes guarded by the shared API key. An empty key disables the guard.
pub fn marketplace_router<R>(service: Arc<MarketplaceService<R>>, api_key: &str) -> Router
where
    R: MarketplaceRepository + 'static,
{
    Router::new()
        .route("/users", post(create_user::<R>).get(list_users::<R>))
        .route(
            "/properties",
            post(create_property::<R>).get(list_properties::<R>),
        )
        .route("/properties/:property_id", get(get_property::<R>))
        .route(
            "/properties/:property_id/valuations",
            post(add_valuation::<R>),
        )
        .route(
            "/listings",
            get(list_listings::<R>).post(create_listing::<R>),
        )
        .route(
            "/listings/with-property",
            post(create_listing_with_property::<R>),
        )
        .route("/offers", post(create_offer::<R>))
        .route("/offers/listing/:listing_id", get(list_offers::<R>))
        .route(
            "/subscriptions/plans",
            get(list_plans::<R>).post(create_plan::<R>),
        )
        .route("/subscriptions", post(create_subscription::<R>))
        .route("/subscriptions/:id", get(list_subscriptions::<R>))
        .route("/subscriptions/:id/payments", post(record_payment::<R>))
        .route_layer(middleware::from_fn_with_state(
            Arc::<str>::from(api_key),
            require_api_key,
        ))
        .with_state(service)
}

async fn require_api_key(
    State(expected): State<Arc<str>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !expected.is_empty() {
        let provided = request
            .headers()
            .get(API_KEY_HEADER)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();
        if provided != &*expected {
            warn!(path = %request.uri().path(), "marketplace request with invalid api key");
            return Err(ApiError::Unauthorized);
        }
    }
    Ok(next.run(request).await)
}

fn created<T>(value: T) -> (StatusCode, Json<T>) {
    (StatusCode::CREATED, Json(value))
}

async fn create_user<R: MarketplaceRepository + 'static>(
    State(service): Shared<R>,
    payload: Result<Json<NewUser>, JsonRejection>,
) -> Created<User> {
    let Json(payload) = payload?;
    Ok(created(service.register_user(payload)?))
}

async fn list_users<R: MarketplaceRepository + 'static>(
    State(service): Shared<R>,
) -> Result<Json<Vec<User>>, ApiError> {
    Ok(Json(service.users()?))
}

async fn create_property<R: MarketplaceRepository + 'static>(
    State(service): Shared<R>,
    payload: Result<Json<NewProperty>, JsonRejection>,
) -> Created<PropertyView> {
    let Json(payload) = payload?;
    Ok(created(service.create_property(payload)?))
}

async fn list_properties<R: MarketplaceRepository + 'static>(
    State(service): Shared<R>,
) -> Result<Json<Vec<PropertyView>>, ApiError> {
    Ok(Json(service.properties()?))
}

async fn get_property<R: MarketplaceRepository + 'static>(
    State(service): Shared<R>,
    Path(property_id): Path<String>,
) -> Result<Json<PropertyView>, ApiError> {
    Ok(Json(service.property(&property_id)?))
}

async fn add_valuation<R: MarketplaceRepository + 'static>(
    State(service): Shared<R>,
    Path(property_id): Path<String>,
    payload: Result<Json<NewValuation>, JsonRejection>,
) -> Created<PropertyValuation> {
    let Json(payload) = payload?;
    Ok(created(service.add_valuation(&property_id, payload)?))
}

async fn list_listings<R: MarketplaceRepository + 'static>(
    State(service): Shared<R>,
) -> Result<Json<Vec<ListingView>>, ApiError> {
    Ok(Json(service.active_listings()?))
}

async fn create_listing<R: MarketplaceRepository + 'static>(
    State(service): Shared<R>,
    payload: Result<Json<NewListing>, JsonRejection>,
) -> Created<ListingView> {
    let Json(payload) = payload?;
    Ok(created(service.create_listing(payload)?))
}

async fn create_listing_with_property<R: MarketplaceRepository + 'static>(
    State(service): Shared<R>,
    payload: Result<Json<NewListingWithProperty>, JsonRejection>,
) -> Created<ListingView> {
    let Json(payload) = payload?;
    Ok(created(service.create_listing_with_property(payload)?))
}

async fn create_offer<R: MarketplaceRepository + 'static>(
    State(service): Shared<R>,
    payload: Result<Json<NewOffer>, JsonRejection>,
) -> Created<Offer> {
    let Json(payload) = payload?;
    Ok(created(service.submit_offer(payload)?))
}

async fn list_offers<R: MarketplaceRepository + 'static>(
    State(service): Shared<R>,
    Path(listing_id): Path<String>,
) -> Result<Json<Vec<Offer>>, ApiError> {
    Ok(Json(service.offers_for_listing(&listing_id)?))
}

async fn list_plans<R: MarketplaceRepository + 'static>(
    State(service): Shared<R>,
) -> Result<Json<Vec<SubscriptionPlan>>, ApiError> {
    Ok(Json(service.active_plans()?))
}

async fn create_plan<R: MarketplaceRepository + 'static>(
    State(service): Shared<R>,
    payload: Result<Json<NewPlan>, JsonRejection>,
) -> Created<SubscriptionPlan> {
    let Json(payload) = payload?;
    Ok(created(service.create_plan(payload)?))
}

async fn create_subscription<R: MarketplaceRepository + 'static>(
    State(service): Shared<R>,
    payload: Result<Json<NewSubscription>, JsonRejection>,
) -> Created<Subscription> {
    let Json(payload) = payload?;
    Ok(created(service.subscribe(payload)?))
}

/// `id` is the user id.
async fn list_subscriptions<R: MarketplaceRepository + 'static>(
    State(service): Shared<R>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<Subscription>>, ApiError> {
    Ok(Json(service.subscriptions_for_user(&user_id)?))
}

/// `id` is the subscription id.
async fn record_payment<R: MarketplaceRepository + 'static>(
    State(service): Shared<R>,
    Path(subscription_id): Path<String>,
    payload: Result<Json<NewPayment>, JsonRejection>,
) -> Created<Payment> {
    let Json(payload) = payload?;
    Ok(created(service.record_payment(&subscription_id, payload)?))
}

impl From<MarketplaceError> for ApiError {
    fn from(value: MarketplaceError) -> Self {
        match value {
            MarketplaceError::Validation(message) => Self::Validation(message),
            MarketplaceError::EmailTaken
            | MarketplaceError::PlanCodeTaken
            | MarketplaceError::SubscriptionActive => Self::Conflict(value.to_string()),
            MarketplaceError::NotFound(_) => Self::NotFound(value.to_string()),
            MarketplaceError::PasswordHash(_) => {
                error!(error = %value, "password hashing failed");
                Self::Internal("Failed to register user".to_string())
            }
            MarketplaceError::Repository(err) => match err {
                RepositoryError::Conflict => Self::Conflict("Record already exists".to_string()),
                RepositoryError::NotFound => Self::NotFound("Record not found".to_string()),
            },
        }
    }
}
