use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub valuation: ValuationConfig,
    pub feeds: FeedConfig,
    pub marketplace: MarketplaceConfig,
    pub gateway: GatewayConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let json = env::var("APP_LOG_FORMAT")
            .map(|value| value.trim().eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let cache_ttl_minutes = parse_var("VALUATION_CACHE_TTL_MINUTES", 15u64)?;
        let cache_ttl_seconds = cache_ttl_minutes
            .checked_mul(60)
            .ok_or_else(|| ConfigError::InvalidNumber {
                key: "VALUATION_CACHE_TTL_MINUTES",
                value: cache_ttl_minutes.to_string(),
            })?;

        let valuation = ValuationConfig {
            cache_ttl: Duration::from_secs(cache_ttl_seconds),
            estimated_completion_seconds: parse_var("VALUATION_ESTIMATED_COMPLETION_SECONDS", 120)?,
            upload_dir: PathBuf::from(
                env::var("VALUATION_UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string()),
            ),
            max_upload_bytes: parse_var("VALUATION_MAX_UPLOAD_BYTES", 10 * 1024 * 1024)?,
        };

        let feeds = FeedConfig {
            cache_ttl: Duration::from_secs(parse_var("DATA_FEED_CACHE_TTL_SECONDS", 300u64)?),
            rate_limit: parse_var("DATA_FEED_RATE_LIMIT", 60)?,
            rate_window: Duration::from_secs(parse_var("DATA_FEED_WINDOW_SECONDS", 60u64)?),
            interest_rate_url: optional_var("INTEREST_RATE_API_URL"),
            property_sales_url: optional_var("PROPERTY_SALES_API_URL"),
            api_key: optional_var("DATA_FEED_API_KEY"),
        };

        let marketplace = MarketplaceConfig {
            api_key: env::var("MARKETPLACE_API_KEY").unwrap_or_else(|_| "local-dev-key".to_string()),
        };

        let timeout_seconds: f64 = parse_var("SERVICE_TIMEOUT_SECONDS", 5.0)?;
        let gateway = GatewayConfig {
            orchestrator_url: env::var("VALUATION_ORCHESTRATOR_URL")
                .unwrap_or_else(|_| "http://valuation-orchestrator:8001".to_string()),
            timeout: Duration::try_from_secs_f64(timeout_seconds).map_err(|_| {
                ConfigError::InvalidNumber {
                    key: "SERVICE_TIMEOUT_SECONDS",
                    value: timeout_seconds.to_string(),
                }
            })?,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level, json },
            valuation,
            feeds,
            marketplace,
            gateway,
        })
    }
}

fn optional_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_var<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => {
            raw.trim()
                .parse::<T>()
                .map_err(|_| ConfigError::InvalidNumber { key, value: raw })
        }
        _ => Ok(default),
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub json: bool,
}

/// Valuation orchestrator knobs.
#[derive(Debug, Clone)]
pub struct ValuationConfig {
    pub cache_ttl: Duration,
    pub estimated_completion_seconds: u32,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
}

impl Default for ValuationConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(15 * 60),
            estimated_completion_seconds: 120,
            upload_dir: PathBuf::from("uploads"),
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

/// Upstream feed endpoints plus cache and rate limit windows.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub cache_ttl: Duration,
    pub rate_limit: u32,
    pub rate_window: Duration,
    pub interest_rate_url: Option<String>,
    pub property_sales_url: Option<String>,
    pub api_key: Option<String>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(300),
            rate_limit: 60,
            rate_window: Duration::from_secs(60),
            interest_rate_url: None,
            property_sales_url: None,
            api_key: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MarketplaceConfig {
    /// Shared secret expected in `x-api-key`; empty disables the check.
    pub api_key: String,
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub orchestrator_url: String,
    pub timeout: Duration,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { key, value } => {
                write!(f, "{key} must be a non-negative number, got '{value}'")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidNumber { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}
