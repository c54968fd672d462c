//! Rate-limited, cached access to interest rate and property sales feeds.

mod cache;
mod client;
mod rate_limit;
pub mod router;

pub use cache::TtlCache;
pub use client::DataFeedClient;
pub use rate_limit::{RateLimitExceeded, RateLimiter};
pub use router::feeds_router;

use serde_json::Value;

use crate::config::FeedConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedKind {
    InterestRates,
    ResidentialSales,
    CommercialSales,
}

impl FeedKind {
    pub fn cache_key(self) -> &'static str {
        match self {
            FeedKind::InterestRates => "interest_rates",
            FeedKind::ResidentialSales => "residential_sales",
            FeedKind::CommercialSales => "commercial_sales",
        }
    }

    /// Caller-facing message when the feed cannot be served.
    pub fn failure_message(self) -> &'static str {
        match self {
            FeedKind::InterestRates => "Failed to fetch interest rates",
            FeedKind::ResidentialSales => "Failed to fetch residential sales data",
            FeedKind::CommercialSales => "Failed to fetch commercial sales data",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("upstream feed request failed: {0}")]
    Upstream(#[from] reqwest::Error),
    #[error("bundled sample data is invalid: {0}")]
    Sample(serde_json::Error),
}

/// Client, response cache and limiter shared by the feed routes.
pub struct DataFeedService {
    client: DataFeedClient,
    cache: TtlCache<Value>,
    limiter: RateLimiter,
}

impl DataFeedService {
    pub fn new(config: &FeedConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::with_client(config, DataFeedClient::new(config)?))
    }

    pub fn with_client(config: &FeedConfig, client: DataFeedClient) -> Self {
        Self {
            client,
            cache: TtlCache::new(config.cache_ttl),
            limiter: RateLimiter::new(config.rate_limit, config.rate_window),
        }
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub async fn feed(&self, kind: FeedKind) -> Result<Value, FeedError> {
        self.cache
            .get_or_fetch(kind.cache_key(), || self.client.fetch(kind))
            .await
    }
}
