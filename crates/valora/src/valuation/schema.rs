use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use url::Url;

/// Category of item being valuated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum AssetClass {
    RealEstate,
    Auto,
}

/// Whether a class is priced inside the request or handed to the job queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    Inline,
    Deferred,
}

impl AssetClass {
    pub const ALL: [AssetClass; 2] = [AssetClass::RealEstate, AssetClass::Auto];

    pub fn as_str(self) -> &'static str {
        match self {
            AssetClass::RealEstate => "real_estate",
            AssetClass::Auto => "auto",
        }
    }

    pub fn execution_mode(self) -> ExecutionMode {
        match self {
            AssetClass::RealEstate => ExecutionMode::Inline,
            AssetClass::Auto => ExecutionMode::Deferred,
        }
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetClass {
    type Err = UnsupportedAssetClass;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        AssetClass::ALL
            .into_iter()
            .find(|class| class.as_str() == value)
            .ok_or_else(|| UnsupportedAssetClass(value.to_string()))
    }
}

impl TryFrom<String> for AssetClass {
    type Error = UnsupportedAssetClass;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Raised when a class name has no registered pipeline.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unsupported asset class: {0}")]
pub struct UnsupportedAssetClass(pub String);

/// Known valuation inputs plus whatever else the caller sent.
///
/// Numeric fields accept JSON numbers or numeric strings, text fields accept strings or
/// numbers. Keys outside the known set are kept verbatim in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValuationAttributes {
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub living_area_sqft: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub bedrooms: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub bathrooms: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub asking_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub zip: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub make: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub trim: Option<String>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub mileage: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub condition_score: Option<f64>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub vin: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Largest accepted numeric attribute. Keeps every pipeline formula finite.
pub const MAX_ATTRIBUTE_MAGNITUDE: f64 = 1e12;

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(serde_json::Number),
    Text(String),
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = match Option::<NumberOrText>::deserialize(deserializer)? {
        None => return Ok(None),
        Some(NumberOrText::Number(number)) => number
            .as_f64()
            .ok_or_else(|| serde::de::Error::custom("number out of range"))?,
        Some(NumberOrText::Text(text)) if text.trim().is_empty() => return Ok(None),
        Some(NumberOrText::Text(text)) => text.trim().parse::<f64>().map_err(|_| {
            serde::de::Error::custom(format!("expected a number, got '{text}'"))
        })?,
    };

    if value.is_finite() && value.abs() <= MAX_ATTRIBUTE_MAGNITUDE {
        Ok(Some(value))
    } else {
        Err(serde::de::Error::custom(format!(
            "number out of range: {value}"
        )))
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<NumberOrText>::deserialize(deserializer)? {
        None => None,
        Some(NumberOrText::Number(number)) => Some(number.to_string()),
        Some(NumberOrText::Text(text)) => Some(text),
    })
}

/// Inbound valuation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationRequest {
    #[serde(rename = "class")]
    pub class: AssetClass,
    pub attributes: ValuationAttributes,
    #[serde(default)]
    pub options: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlator_id: Option<String>,
}

impl ValuationRequest {
    pub fn new(class: AssetClass, attributes: ValuationAttributes) -> Self {
        Self {
            class,
            attributes,
            options: Map::new(),
            correlator_id: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValuationStatus {
    #[default]
    Completed,
    Pending,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "+")]
    Positive,
    #[serde(rename = "-")]
    Negative,
}

/// Feature contribution reported alongside an estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    pub feature: String,
    pub direction: Direction,
    pub magnitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub human_readable: Option<String>,
}

impl Explanation {
    pub fn new(feature: &str, direction: Direction, magnitude: f64) -> Self {
        Self {
            feature: feature.to_string(),
            direction,
            magnitude: magnitude.abs(),
            human_readable: None,
        }
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.human_readable = Some(text.to_string());
        self
    }
}

/// Market reference point used to justify an estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparable {
    pub comparable_id: String,
    pub address: String,
    pub price: f64,
    pub distance_mi: f64,
    #[serde(default)]
    pub attributes: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sale_date: Option<DateTime<Utc>>,
}

fn default_currency() -> String {
    "USD".to_string()
}

/// Result of a synchronous valuation. Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationResponse {
    pub valuation_id: String,
    #[serde(default)]
    pub status: ValuationStatus,
    pub estimate: f64,
    pub confidence: f64,
    pub interval_low: f64,
    pub interval_high: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub method: String,
    pub explanations: Vec<Explanation>,
    pub comps: Vec<Comparable>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcceptanceStatus {
    #[default]
    Accepted,
    Queued,
}

/// Placeholder returned when a valuation is handed to the job queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptedResponse {
    pub job_id: String,
    #[serde(default)]
    pub status: AcceptanceStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_completion_seconds: Option<u32>,
}

/// Either an inline valuation or a queued job reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ValuationOutcome {
    Completed(ValuationResponse),
    Accepted(AcceptedResponse),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Queued,
    Running,
    Succeeded,
    Failed,
    Partial,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobProgress {
    #[serde(default)]
    pub processed: u64,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub succeeded: u64,
    #[serde(default)]
    pub failed: u64,
}

/// Externally visible view of a tracked job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStatus {
    pub job_id: String,
    pub status: JobState,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub progress: JobProgress,
    #[serde(default)]
    pub result_url: Option<Url>,
}
