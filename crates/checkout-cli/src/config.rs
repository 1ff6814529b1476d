//! Client configuration loaded from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use checkout::{CatalogError, CheckoutConfig};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Client configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `STOREFRONT_API_URL`: storefront REST API base (default: `"http://localhost:8000/api"`)
/// - `CHECKOUT_DATABASE_URL`: session database (default: `"sqlite://checkout.db"`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `CHECKOUT_LOG_FORMAT`: `text` or `json` (default: `text`)
/// - `CHECKOUT_ORDER_TIMEOUT_SECS`: order submission timeout (default: `30`)
/// - `CHECKOUT_PAYMENT_CATALOG`: JSON file replacing the fallback payment catalog
#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub database_url: String,
    pub log_level: String,
    pub log_format: LogFormat,
    pub order_timeout: Duration,
    pub payment_catalog: Option<PathBuf>,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through `lookup`, falling back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            api_url: lookup("STOREFRONT_API_URL").unwrap_or(defaults.api_url),
            database_url: lookup("CHECKOUT_DATABASE_URL").unwrap_or(defaults.database_url),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            log_format: match lookup("CHECKOUT_LOG_FORMAT").as_deref() {
                Some(f) if f.eq_ignore_ascii_case("json") => LogFormat::Json,
                _ => LogFormat::Text,
            },
            order_timeout: lookup("CHECKOUT_ORDER_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.order_timeout),
            payment_catalog: lookup("CHECKOUT_PAYMENT_CATALOG")
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
        }
    }

    /// Builds the orchestration settings, loading the payment catalog file
    /// if one is configured.
    pub fn checkout_config(&self) -> Result<CheckoutConfig, CatalogError> {
        let config = CheckoutConfig {
            order_timeout: self.order_timeout,
            ..CheckoutConfig::default()
        };
        match &self.payment_catalog {
            Some(path) => config.with_fallback_catalog_file(path),
            None => Ok(config),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8000/api".to_string(),
            database_url: "sqlite://checkout.db".to_string(),
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            order_timeout: Duration::from_secs(30),
            payment_catalog: None,
        }
    }
}
