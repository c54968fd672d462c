use serde_json::{json, Map, Value};

use super::{finite_or, floored, valuation_id, ValuationPipeline};
use crate::valuation::schema::{
    Comparable, Direction, Explanation, ValuationAttributes, ValuationRequest, ValuationResponse,
    ValuationStatus,
};

const BASE_PRICES: [(&str, f64); 2] = [
    ("Tesla|Model 3|2022|Performance", 52_000.0),
    ("Toyota|Camry|2021|SE", 26_500.0),
];
const DEFAULT_BASE_PRICE: f64 = 23_000.0;

const MILEAGE_ALLOWANCE: f64 = 30_000.0;
const MILEAGE_PENALTY_PER_MILE: f64 = 0.08;
const CONDITION_STEP: f64 = 750.0;
const NEUTRAL_CONDITION: f64 = 3.0;
const PRICE_FLOOR: f64 = 5_000.0;

const CONFIDENCE: f64 = 0.68;

/// Hedonic placeholder for vehicles: trim lookup, mileage penalty, condition bonus.
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoPipeline;

impl AutoPipeline {
    pub const METHOD: &'static str = "hedonic_v0";

    pub fn base_price(attributes: &ValuationAttributes) -> f64 {
        let part = |value: &Option<String>| value.clone().unwrap_or_else(|| "None".to_string());
        let key = [
            part(&attributes.make),
            part(&attributes.model),
            part(&attributes.year),
            part(&attributes.trim),
        ]
        .join("|");

        BASE_PRICES
            .iter()
            .find(|(trim_key, _)| *trim_key == key)
            .map(|(_, price)| *price)
            .unwrap_or(DEFAULT_BASE_PRICE)
    }

    pub fn estimate(attributes: &ValuationAttributes) -> f64 {
        let mileage = finite_or(attributes.mileage, 0.0);
        let condition = finite_or(attributes.condition_score, NEUTRAL_CONDITION);

        let mileage_penalty = (mileage - MILEAGE_ALLOWANCE).max(0.0) * MILEAGE_PENALTY_PER_MILE;
        let condition_bonus = (condition - NEUTRAL_CONDITION) * CONDITION_STEP;
        floored(
            Self::base_price(attributes) - mileage_penalty + condition_bonus,
            PRICE_FLOOR,
        )
    }
}

impl ValuationPipeline for AutoPipeline {
    fn method(&self) -> &'static str {
        Self::METHOD
    }

    fn valuate(&self, request: &ValuationRequest) -> ValuationResponse {
        let attributes = &request.attributes;
        let estimate = Self::estimate(attributes);

        let mut comp_attributes = Map::new();
        comp_attributes.insert("vin".to_string(), json!(attributes.vin));
        comp_attributes.insert("seller".to_string(), json!("synthetic"));

        let mut metadata = Map::new();
        metadata.insert("pipeline".to_string(), Value::from("auto"));

        ValuationResponse {
            valuation_id: valuation_id("auto"),
            status: ValuationStatus::Completed,
            estimate,
            confidence: CONFIDENCE,
            interval_low: estimate * 0.9,
            interval_high: estimate * 1.08,
            currency: "USD".to_string(),
            method: Self::METHOD.to_string(),
            explanations: vec![
                Explanation::new("base_trim_value", Direction::Positive, 0.44),
                Explanation::new("mileage", Direction::Negative, 0.22),
            ],
            comps: vec![Comparable {
                comparable_id: "auto_comp_1".to_string(),
                address: "market_listing".to_string(),
                price: estimate * 0.97,
                distance_mi: 0.0,
                attributes: comp_attributes,
                source: Some("synthetic".to_string()),
                sale_date: None,
            }],
            metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::valuation::schema::AssetClass;

    fn camry() -> ValuationAttributes {
        ValuationAttributes {
            make: Some("Toyota".to_string()),
            model: Some("Camry".to_string()),
            year: Some("2021".to_string()),
            trim: Some("SE".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn known_trim_uses_table_price() {
        assert_eq!(AutoPipeline::base_price(&camry()), 26_500.0);
        assert_eq!(
            AutoPipeline::base_price(&ValuationAttributes::default()),
            23_000.0
        );
    }

    #[test]
    fn mileage_above_allowance_is_penalized() {
        let attributes = ValuationAttributes {
            mileage: Some(40_000.0),
            ..camry()
        };
        // 26500 - 10000 * 0.08
        assert_eq!(AutoPipeline::estimate(&attributes), 25_700.0);
    }

    #[test]
    fn condition_score_adds_or_removes_value() {
        let better = ValuationAttributes {
            condition_score: Some(5.0),
            ..camry()
        };
        let worse = ValuationAttributes {
            condition_score: Some(1.0),
            ..camry()
        };
        assert_eq!(AutoPipeline::estimate(&better), 28_000.0);
        assert_eq!(AutoPipeline::estimate(&worse), 25_000.0);
    }

    #[test]
    fn estimate_is_floored() {
        let attributes = ValuationAttributes {
            mileage: Some(500_000.0),
            ..Default::default()
        };
        assert_eq!(AutoPipeline::estimate(&attributes), 5_000.0);
    }

    #[test]
    fn response_reports_hedonic_method_and_vin_comp() {
        let request = ValuationRequest::new(
            AssetClass::Auto,
            ValuationAttributes {
                vin: Some("5YJ3E1EA7KF000000".to_string()),
                ..camry()
            },
        );
        let response = AutoPipeline.valuate(&request);

        assert_eq!(response.method, "hedonic_v0");
        assert_eq!(response.confidence, 0.68);
        assert_eq!(response.interval_low, 26_500.0 * 0.9);
        assert_eq!(response.comps[0].price, 26_500.0 * 0.97);
        assert_eq!(
            response.comps[0].attributes.get("vin"),
            Some(&json!("5YJ3E1EA7KF000000"))
        );
        assert_eq!(response.metadata.get("pipeline"), Some(&json!("auto")));
    }
}
