use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde_json::{json, Map, Value};
use tracing::debug;

use super::{finite_or, floored, valuation_id, ValuationPipeline};
use crate::valuation::schema::{
    Comparable, Direction, Explanation, ValuationAttributes, ValuationRequest, ValuationResponse,
    ValuationStatus,
};

const PRICE_PER_SQFT: f64 = 225.0;
const BEDROOM_ADJUSTMENT: f64 = 12_000.0;
const BATHROOM_ADJUSTMENT: f64 = 9_000.0;
const PRICE_FLOOR: f64 = 100_000.0;

const DEFAULT_SQFT: f64 = 1_600.0;
const DEFAULT_BEDROOMS: f64 = 3.0;
const DEFAULT_BATHROOMS: f64 = 2.0;

const CONFIDENCE: f64 = 0.75;

/// Baseline residential pipeline with a short-lived response cache.
pub struct RealEstatePipeline {
    ttl: Duration,
    cache: Mutex<HashMap<String, CachedValuation>>,
}

struct CachedValuation {
    stored_at: Instant,
    response: ValuationResponse,
}

impl RealEstatePipeline {
    pub const METHOD: &'static str = "baseline_gbr_v0";

    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Formula estimate before any caching.
    pub fn baseline_estimate(attributes: &ValuationAttributes) -> f64 {
        let sqft = finite_or(attributes.living_area_sqft, DEFAULT_SQFT);
        let beds = finite_or(attributes.bedrooms, DEFAULT_BEDROOMS);
        let baths = finite_or(attributes.bathrooms, DEFAULT_BATHROOMS);

        let adjustment = (beds - DEFAULT_BEDROOMS) * BEDROOM_ADJUSTMENT
            + (baths - DEFAULT_BATHROOMS) * BATHROOM_ADJUSTMENT;
        floored(sqft * PRICE_PER_SQFT + adjustment, PRICE_FLOOR)
    }

    /// `class|address|zip`, or `None` when neither address nor zip identifies the property.
    fn cache_key(request: &ValuationRequest) -> Option<String> {
        let attributes = &request.attributes;
        if attributes.address.is_none() && attributes.zip.is_none() {
            return None;
        }
        Some(
            [
                request.class.as_str(),
                attributes.address.as_deref().unwrap_or("None"),
                attributes.zip.as_deref().unwrap_or("None"),
            ]
            .join("|"),
        )
    }

    fn compute(&self, request: &ValuationRequest) -> ValuationResponse {
        let attributes = &request.attributes;
        let estimate = Self::baseline_estimate(attributes);

        let mut metadata = Map::new();
        metadata.insert("cache_hit".to_string(), Value::Bool(false));

        ValuationResponse {
            valuation_id: valuation_id("val"),
            status: ValuationStatus::Completed,
            estimate,
            confidence: CONFIDENCE,
            interval_low: estimate * 0.95,
            interval_high: estimate * 1.05,
            currency: "USD".to_string(),
            method: Self::METHOD.to_string(),
            explanations: explanations(),
            comps: synthetic_comps(attributes),
            metadata,
        }
    }
}

impl ValuationPipeline for RealEstatePipeline {
    fn method(&self) -> &'static str {
        Self::METHOD
    }

    fn valuate(&self, request: &ValuationRequest) -> ValuationResponse {
        let Some(key) = Self::cache_key(request) else {
            return self.compute(request);
        };
        let mut cache = self.cache.lock().expect("valuation cache mutex poisoned");
        let ttl = self.ttl;
        cache.retain(|_, entry| entry.stored_at.elapsed() < ttl);

        if let Some(entry) = cache.get(&key) {
            debug!(cache_key = %key, "real estate valuation served from cache");
            let mut response = entry.response.clone();
            response
                .metadata
                .insert("cache_hit".to_string(), Value::Bool(true));
            return response;
        }

        let response = self.compute(request);
        cache.insert(
            key,
            CachedValuation {
                stored_at: Instant::now(),
                response: response.clone(),
            },
        );
        response
    }
}

fn explanations() -> Vec<Explanation> {
    vec![
        Explanation::new("living_area_sqft", Direction::Positive, 0.31),
        Explanation::new("year_built", Direction::Positive, 0.12),
        Explanation::new("condition_score", Direction::Positive, 0.07)
            .with_text("Above-average property condition adds value"),
    ]
}

fn synthetic_comps(attributes: &ValuationAttributes) -> Vec<Comparable> {
    let address = attributes.address.as_deref().unwrap_or("123 Main St");
    let street = attributes.street.as_deref().unwrap_or(address);
    let city = attributes.city.as_deref().unwrap_or("Sample City");
    let bedrooms = finite_or(attributes.bedrooms, DEFAULT_BEDROOMS);

    let comp = |id: &str, address: String, fallback_price: f64, distance_mi: f64| {
        let mut comp_attributes = Map::new();
        comp_attributes.insert("bedrooms".to_string(), json!(bedrooms));
        Comparable {
            comparable_id: id.to_string(),
            address,
            price: attributes.asking_price.unwrap_or(fallback_price),
            distance_mi,
            attributes: comp_attributes,
            source: Some("synthetic".to_string()),
            sale_date: None,
        }
    };

    vec![
        comp("comp_1", format!("{address} Unit A, {city}"), 240_000.0, 0.25),
        comp("comp_2", format!("{street} Nearby, {city}"), 252_000.0, 0.45),
    ]
}
