use std::time::Duration;

use reqwest::header::AUTHORIZATION;
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use tracing::debug;

use super::{FeedError, FeedKind};
use crate::config::FeedConfig;

const INTEREST_RATE_TIMEOUT: Duration = Duration::from_secs(6);
const PROPERTY_SALES_TIMEOUT: Duration = Duration::from_secs(8);

/// Fetches third-party market data, falling back to bundled samples when no upstream
/// is configured.
#[derive(Debug, Clone)]
pub struct DataFeedClient {
    http: Client,
    interest_rate_url: Option<String>,
    property_sales_url: Option<String>,
    api_key: Option<String>,
}

impl DataFeedClient {
    pub fn new(config: &FeedConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            http: Client::builder().build()?,
            interest_rate_url: config.interest_rate_url.clone(),
            property_sales_url: config.property_sales_url.clone(),
            api_key: config.api_key.clone(),
        })
    }

    pub async fn fetch(&self, kind: FeedKind) -> Result<Value, FeedError> {
        let request = match kind {
            FeedKind::InterestRates => {
                let Some(url) = &self.interest_rate_url else {
                    return sample(kind);
                };
                let request = self.http.get(url).timeout(INTEREST_RATE_TIMEOUT);
                match &self.api_key {
                    Some(key) => request.header(AUTHORIZATION, format!("Bearer {key}")),
                    None => request,
                }
            }
            FeedKind::ResidentialSales | FeedKind::CommercialSales => {
                let Some(url) = &self.property_sales_url else {
                    return sample(kind);
                };
                let sales_type = if kind == FeedKind::CommercialSales {
                    "commercial"
                } else {
                    "residential"
                };
                let request = self
                    .http
                    .get(url)
                    .query(&[("type", sales_type)])
                    .timeout(PROPERTY_SALES_TIMEOUT);
                match &self.api_key {
                    Some(key) => request.header("x-api-key", key),
                    None => request,
                }
            }
        };

        send(kind, request).await
    }
}

async fn send(kind: FeedKind, request: RequestBuilder) -> Result<Value, FeedError> {
    let response = request.send().await?.error_for_status()?;
    debug!(feed = kind.cache_key(), status = %response.status(), "upstream feed responded");
    Ok(response.json().await?)
}

fn sample(kind: FeedKind) -> Result<Value, FeedError> {
    let raw = match kind {
        FeedKind::InterestRates => include_str!("sample_data/interest_rates.json"),
        FeedKind::ResidentialSales => include_str!("sample_data/residential_sales.json"),
        FeedKind::CommercialSales => include_str!("sample_data/commercial_sales.json"),
    };
    serde_json::from_str(raw).map_err(FeedError::Sample)
}
