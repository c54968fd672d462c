//! Stand-ins for the model serving and comparable search services.

use axum::{
    extract::{rejection::JsonRejection, Query},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::router::parse_request;
use super::schema::{AssetClass, Comparable, Direction, Explanation, ValuationRequest};
use crate::error::ApiError;

const DEFAULT_LIVING_AREA_SQFT: f64 = 1600.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub estimate: f64,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplanationSet {
    pub explanations: Vec<Explanation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparableResults {
    pub results: Vec<Comparable>,
}

#[derive(Debug, Deserialize)]
pub struct ComparableQuery {
    pub class_: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

pub fn predict(request: &ValuationRequest) -> Prediction {
    match request.class {
        AssetClass::RealEstate => {
            let sqft = request
                .attributes
                .living_area_sqft
                .unwrap_or(DEFAULT_LIVING_AREA_SQFT);
            Prediction {
                estimate: (sqft * 210.0).max(200_000.0),
                confidence: 0.74,
            }
        }
        AssetClass::Auto => Prediction {
            estimate: 24_000.0,
            confidence: 0.65,
        },
    }
}

pub fn explain(_request: &ValuationRequest) -> ExplanationSet {
    ExplanationSet {
        explanations: vec![
            Explanation::new("living_area_sqft", Direction::Positive, 0.31),
            Explanation::new("year_built", Direction::Positive, 0.12),
        ],
    }
}

/// Single canned comparable tagged with the requested class.
pub fn search_comps(query: &ComparableQuery) -> ComparableResults {
    let mut attributes = Map::new();
    attributes.insert("class".to_string(), Value::String(query.class_.clone()));

    ComparableResults {
        results: vec![Comparable {
            comparable_id: "comp_demo".to_string(),
            address: "129 Main St".to_string(),
            price: 240_000.0,
            distance_mi: 0.2,
            attributes,
            source: Some("mock".to_string()),
            sale_date: None,
        }],
    }
}

pub fn serving_router() -> Router {
    Router::new()
        .route("/predict", post(predict_handler))
        .route("/explain", post(explain_handler))
        .route("/comps", get(comps_handler))
}

async fn predict_handler(
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Prediction>, ApiError> {
    let Json(body) = payload?;
    Ok(Json(predict(&parse_request(body)?)))
}

async fn explain_handler(
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ExplanationSet>, ApiError> {
    let Json(body) = payload?;
    Ok(Json(explain(&parse_request(body)?)))
}

async fn comps_handler(Query(query): Query<ComparableQuery>) -> Json<ComparableResults> {
    Json(search_comps(&query))
}
