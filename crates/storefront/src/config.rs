//! Storefront client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//!
//! - `OPTOWORLD_API_URL` - Base URL of the REST API (default: `http://localhost:5000/api`)
//! - `OPTOWORLD_HTTP_TIMEOUT_SECS` - Per-request timeout, at most 3600
//!   (default: transport default)
//! - `OPTOWORLD_CATALOG_CACHE_SECS` - Product catalog cache TTL, at most 30 days
//!   (default: 300)
//! - `OPTOWORLD_STORAGE_PATH` - Durable storage file used by the CLI
//!   (default: `.optoworld/storage.json`)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_API_URL: &str = "http://localhost:5000/api";
const DEFAULT_STORAGE_PATH: &str = ".optoworld/storage.json";
const DEFAULT_CATALOG_CACHE_SECS: u64 = 300;
const MAX_HTTP_TIMEOUT_SECS: u64 = 60 * 60;
const MAX_CATALOG_CACHE_SECS: u64 = 30 * 24 * 60 * 60;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront client configuration.
///
/// Implements `Debug` manually to redact the Sentry DSN (it embeds a key).
#[derive(Clone)]
pub struct StorefrontConfig {
    /// Base URL of the REST API, always ending in `/`.
    pub api_url: Url,
    /// Optional per-request timeout; `None` keeps the transport default.
    pub http_timeout: Option<Duration>,
    /// Time-to-live for cached catalog reads.
    pub catalog_cache_ttl: Duration,
    /// File backing durable storage for the CLI.
    pub storage_path: PathBuf,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. "production")
    pub sentry_environment: Option<String>,
}

impl std::fmt::Debug for StorefrontConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorefrontConfig")
            .field("api_url", &self.api_url.as_str())
            .field("http_timeout", &self.http_timeout)
            .field("catalog_cache_ttl", &self.catalog_cache_ttl)
            .field("storage_path", &self.storage_path)
            .field("sentry_dsn", &self.sentry_dsn.as_ref().map(|_| "[REDACTED]"))
            .field("sentry_environment", &self.sentry_environment)
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url_raw =
            lookup("OPTOWORLD_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let api_url = normalize_base(&api_url_raw).map_err(|e| {
            ConfigError::InvalidEnvVar("OPTOWORLD_API_URL".to_string(), e.to_string())
        })?;

        let http_timeout = lookup("OPTOWORLD_HTTP_TIMEOUT_SECS")
            .map(|v| parse_secs("OPTOWORLD_HTTP_TIMEOUT_SECS", &v, MAX_HTTP_TIMEOUT_SECS))
            .transpose()?;

        let catalog_cache_ttl = lookup("OPTOWORLD_CATALOG_CACHE_SECS")
            .map(|v| parse_secs("OPTOWORLD_CATALOG_CACHE_SECS", &v, MAX_CATALOG_CACHE_SECS))
            .transpose()?
            .unwrap_or(Duration::from_secs(DEFAULT_CATALOG_CACHE_SECS));

        let storage_path = lookup("OPTOWORLD_STORAGE_PATH")
            .map_or_else(|| PathBuf::from(DEFAULT_STORAGE_PATH), PathBuf::from);

        Ok(Self {
            api_url,
            http_timeout,
            catalog_cache_ttl,
            storage_path,
            sentry_dsn: lookup("SENTRY_DSN").filter(|v| !v.is_empty()),
            sentry_environment: lookup("SENTRY_ENVIRONMENT").filter(|v| !v.is_empty()),
        })
    }

    /// Configuration pointing at an explicit API base URL, other fields default.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the URL cannot be parsed.
    pub fn with_api_url(api_url: &str) -> Result<Self, ConfigError> {
        let api_url = normalize_base(api_url).map_err(|e| {
            ConfigError::InvalidEnvVar("OPTOWORLD_API_URL".to_string(), e.to_string())
        })?;
        Ok(Self::for_api_url(api_url))
    }

    fn for_api_url(api_url: Url) -> Self {
        Self {
            api_url,
            http_timeout: None,
            catalog_cache_ttl: Duration::from_secs(DEFAULT_CATALOG_CACHE_SECS),
            storage_path: PathBuf::from(DEFAULT_STORAGE_PATH),
            sentry_dsn: None,
            sentry_environment: None,
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse a base URL and make sure it ends with `/` so that `Url::join`
/// appends to the path instead of replacing its last segment.
fn normalize_base(raw: &str) -> Result<Url, url::ParseError> {
    let trimmed = raw.trim();
    if trimmed.ends_with('/') {
        Url::parse(trimmed)
    } else {
        Url::parse(&format!("{trimmed}/"))
    }
}

fn parse_secs(key: &str, value: &str, max: u64) -> Result<Duration, ConfigError> {
    let secs = value
        .trim()
        .parse::<u64>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if secs > max {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("must be at most {max} seconds"),
        ));
    }
    Ok(Duration::from_secs(secs))
}
