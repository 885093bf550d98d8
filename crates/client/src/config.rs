//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `INSIGHTS_API_URL` - Base URL of the insights backend (e.g. `http://localhost:3000/api`)
//!
//! ## Optional
//! - `INSIGHTS_SESSION_FILE` - Where the session is persisted
//!   (default: `$HOME/.store-insights/session.json`)
//! - `INSIGHTS_HTTP_TIMEOUT_SECS` - Per-request timeout (default: none)
//! - `INSIGHTS_TOP_CUSTOMERS_LIMIT` - Size of the top-customers ranking (default: 5)
//! - `INSIGHTS_ORDERS_START_DATE` - Start of the orders chart (default: 2024-01-01)
//! - `INSIGHTS_ORDERS_END_DATE` - End of the orders chart (default: 2025-12-31)

use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveDate;
use store_insights_core::DateRange;
use thiserror::Error;
use url::Url;

/// Default number of customers in the ranking.
pub const DEFAULT_TOP_CUSTOMERS_LIMIT: u32 = 5;

const SESSION_DIR: &str = ".store-insights";
const SESSION_FILE: &str = "session.json";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Store Insights client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the insights backend, always ending in `/`
    pub api_url: Url,
    /// File holding the persisted session
    pub session_file: PathBuf,
    /// Optional per-request timeout; `None` lets a hung call hang
    pub http_timeout: Option<Duration>,
    /// Number of entries requested from the top-customers endpoint
    pub top_customers_limit: u32,
    /// Fixed range charted by the orders-by-date series
    pub orders_range: DateRange,
}

impl ClientConfig {
    /// Configuration with defaults for everything except the backend URL.
    #[must_use]
    pub fn new(api_url: Url) -> Self {
        Self {
            api_url: normalize_base_url(api_url),
            session_file: default_session_file(std::env::var("HOME").ok()),
            http_timeout: None,
            top_customers_limit: DEFAULT_TOP_CUSTOMERS_LIMIT,
            orders_range: DateRange::default(),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = lookup("INSIGHTS_API_URL")
            .ok_or_else(|| ConfigError::MissingEnvVar("INSIGHTS_API_URL".to_string()))?;
        let api_url = Url::parse(&api_url)
            .map_err(|e| ConfigError::InvalidEnvVar("INSIGHTS_API_URL".to_string(), e.to_string()))?;

        let session_file = lookup("INSIGHTS_SESSION_FILE")
            .map_or_else(|| default_session_file(lookup("HOME")), PathBuf::from);

        let http_timeout = lookup("INSIGHTS_HTTP_TIMEOUT_SECS")
            .map(|raw| parse_var::<u64>("INSIGHTS_HTTP_TIMEOUT_SECS", &raw))
            .transpose()?
            .map(Duration::from_secs);

        let top_customers_limit = lookup("INSIGHTS_TOP_CUSTOMERS_LIMIT")
            .map(|raw| parse_var::<u32>("INSIGHTS_TOP_CUSTOMERS_LIMIT", &raw))
            .transpose()?
            .unwrap_or(DEFAULT_TOP_CUSTOMERS_LIMIT);
        if top_customers_limit == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "INSIGHTS_TOP_CUSTOMERS_LIMIT".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        let defaults = DateRange::default();
        let start = lookup("INSIGHTS_ORDERS_START_DATE")
            .map(|raw| parse_date("INSIGHTS_ORDERS_START_DATE", &raw))
            .transpose()?
            .unwrap_or_else(|| defaults.start());
        let end = lookup("INSIGHTS_ORDERS_END_DATE")
            .map(|raw| parse_date("INSIGHTS_ORDERS_END_DATE", &raw))
            .transpose()?
            .unwrap_or_else(|| defaults.end());
        let orders_range = DateRange::new(start, end).map_err(|e| {
            ConfigError::InvalidEnvVar("INSIGHTS_ORDERS_END_DATE".to_string(), e.to_string())
        })?;

        Ok(Self {
            api_url: normalize_base_url(api_url),
            session_file,
            http_timeout,
            top_customers_limit,
            orders_range,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Ensure the base URL ends with `/` so relative endpoint paths join under it.
fn normalize_base_url(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

fn default_session_file(home: Option<String>) -> PathBuf {
    home.map_or_else(|| PathBuf::from(SESSION_DIR), |h| PathBuf::from(h).join(SESSION_DIR))
        .join(SESSION_FILE)
}

fn parse_var<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

fn parse_date(key: &str, raw: &str) -> Result<NaiveDate, ConfigError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_missing_api_url() {
        let result = ClientConfig::from_lookup(lookup_from(&[]));
        assert!(matches!(result, Err(ConfigError::MissingEnvVar(ref k)) if k == "INSIGHTS_API_URL"));
    }

    #[test]
    fn test_invalid_api_url() {
        let result = ClientConfig::from_lookup(lookup_from(&[("INSIGHTS_API_URL", "not a url")]));
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar(_, _))));
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            ("INSIGHTS_API_URL", "http://localhost:3000/api"),
            ("HOME", "/home/tenant"),
        ]))
        .unwrap();

        assert_eq!(config.api_url.as_str(), "http://localhost:3000/api/");
        assert_eq!(
            config.session_file,
            PathBuf::from("/home/tenant/.store-insights/session.json")
        );
        assert_eq!(config.http_timeout, None);
        assert_eq!(config.top_customers_limit, 5);
        assert_eq!(config.orders_range, DateRange::default());
    }

    #[test]
    fn test_overrides() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            ("INSIGHTS_API_URL", "https://insights.example.com/"),
            ("INSIGHTS_SESSION_FILE", "/tmp/session.json"),
            ("INSIGHTS_HTTP_TIMEOUT_SECS", "15"),
            ("INSIGHTS_TOP_CUSTOMERS_LIMIT", "10"),
            ("INSIGHTS_ORDERS_START_DATE", "2025-01-01"),
            ("INSIGHTS_ORDERS_END_DATE", "2025-06-30"),
        ]))
        .unwrap();

        assert_eq!(config.api_url.as_str(), "https://insights.example.com/");
        assert_eq!(config.session_file, PathBuf::from("/tmp/session.json"));
        assert_eq!(config.http_timeout, Some(Duration::from_secs(15)));
        assert_eq!(config.top_customers_limit, 10);
        assert_eq!(config.orders_range.to_string(), "2025-01-01 to 2025-06-30");
    }

    #[test]
    fn test_zero_limit_rejected() {
        let result = ClientConfig::from_lookup(lookup_from(&[
            ("INSIGHTS_API_URL", "http://localhost:3000"),
            ("INSIGHTS_TOP_CUSTOMERS_LIMIT", "0"),
        ]));
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar(_, _))));
    }

    #[test]
    fn test_inverted_orders_range_rejected() {
        let result = ClientConfig::from_lookup(lookup_from(&[
            ("INSIGHTS_API_URL", "http://localhost:3000"),
            ("INSIGHTS_ORDERS_START_DATE", "2025-06-30"),
            ("INSIGHTS_ORDERS_END_DATE", "2025-01-01"),
        ]));
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar(_, _))));
    }

    #[test]
    fn test_bad_date_rejected() {
        let result = ClientConfig::from_lookup(lookup_from(&[
            ("INSIGHTS_API_URL", "http://localhost:3000"),
            ("INSIGHTS_ORDERS_START_DATE", "01/01/2025"),
        ]));
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar(_, _))));
    }

    #[test]
    fn test_normalize_base_url() {
        let url = normalize_base_url(Url::parse("http://localhost:3000/api").unwrap());
        assert_eq!(url.join("auth/login").unwrap().as_str(), "http://localhost:3000/api/auth/login");

        let root = normalize_base_url(Url::parse("http://localhost:3000").unwrap());
        assert_eq!(root.as_str(), "http://localhost:3000/");
    }
}
