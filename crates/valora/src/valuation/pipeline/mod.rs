//! Per asset class valuation pipelines.
//!
//! Pipelines are deterministic: missing attributes fall back to fixed defaults and no
//! pipeline ever fails.

mod auto;
mod real_estate;

pub use auto::AutoPipeline;
pub use real_estate::RealEstatePipeline;

use super::schema::{ValuationRequest, ValuationResponse};

/// Computes a valuation for a single asset class.
pub trait ValuationPipeline: Send + Sync {
    /// Method label reported in responses.
    fn method(&self) -> &'static str;

    fn valuate(&self, request: &ValuationRequest) -> ValuationResponse;
}

pub(crate) fn valuation_id(prefix: &str) -> String {
    format!("{prefix}_{}", uuid::Uuid::new_v4().simple())
}

/// Attribute value when present and finite, otherwise the pipeline default.
pub(crate) fn finite_or(value: Option<f64>, default: f64) -> f64 {
    value.filter(|value| value.is_finite()).unwrap_or(default)
}

/// Applies the price floor; a non-finite estimate collapses to the floor.
pub(crate) fn floored(estimate: f64, floor: f64) -> f64 {
    if estimate.is_finite() {
        estimate.max(floor)
    } else {
        floor
    }
}
