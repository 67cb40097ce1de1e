//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `CAKE_SHOP_API_URL` - Base URL of the backend REST API (e.g. `https://api.example.com/api`)
//!
//! ## Optional
//! - `CAKE_SHOP_TIMEOUT_SECS` - Per-request timeout (default: 15)
//! - `CAKE_SHOP_CACHE_TTL_SECS` - Cake catalog cache lifetime (default: 300)
//! - `CAKE_SHOP_SESSION_FILE` - Where the CLI persists the session (default: `.cake-shop-session.json`)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_TIMEOUT_SECS: &str = "15";
const DEFAULT_CACHE_TTL_SECS: &str = "300";
const DEFAULT_SESSION_FILE: &str = ".cake-shop-session.json";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Cake Shop client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL all endpoint paths are joined onto. Always ends with `/`.
    pub api_url: Url,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Lifetime of cached cake listings.
    pub cache_ttl: Duration,
    /// Session file used by [`crate::FileSessionStore`].
    pub session_file: PathBuf,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. "production", "staging")
    pub sentry_environment: Option<String>,
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the API URL is missing or any variable fails
    /// to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_url = parse_api_url(&get_required_env("CAKE_SHOP_API_URL")?)
            .map_err(|e| ConfigError::InvalidEnvVar("CAKE_SHOP_API_URL".to_string(), e))?;
        let timeout = parse_secs(
            "CAKE_SHOP_TIMEOUT_SECS",
            &get_env_or_default("CAKE_SHOP_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS),
        )?;
        let cache_ttl = parse_secs(
            "CAKE_SHOP_CACHE_TTL_SECS",
            &get_env_or_default("CAKE_SHOP_CACHE_TTL_SECS", DEFAULT_CACHE_TTL_SECS),
        )?;
        let session_file = PathBuf::from(get_env_or_default(
            "CAKE_SHOP_SESSION_FILE",
            DEFAULT_SESSION_FILE,
        ));

        Ok(Self {
            api_url,
            timeout,
            cache_ttl,
            session_file,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Configuration with defaults for everything but the API URL.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if `api_url` is not an http(s) URL.
    pub fn with_api_url(api_url: &str) -> Result<Self, ConfigError> {
        let api_url = parse_api_url(api_url)
            .map_err(|e| ConfigError::InvalidEnvVar("CAKE_SHOP_API_URL".to_string(), e))?;
        Ok(Self {
            api_url,
            timeout: Duration::from_secs(15),
            cache_ttl: Duration::from_secs(300),
            session_file: PathBuf::from(DEFAULT_SESSION_FILE),
            sentry_dsn: None,
            sentry_environment: None,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse the API base URL, forcing a trailing slash so `Url::join` appends
/// endpoint paths instead of replacing the last segment.
fn parse_api_url(raw: &str) -> Result<Url, String> {
    let mut url = Url::parse(raw.trim()).map_err(|e| e.to_string())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme '{}'", url.scheme()));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn parse_secs(key: &str, value: &str) -> Result<Duration, ConfigError> {
    value
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_api_url_adds_trailing_slash() {
        let url = parse_api_url("https://api.example.com/api").unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/api/");
        assert_eq!(
            url.join("cakes").unwrap().as_str(),
            "https://api.example.com/api/cakes"
        );
    }

    #[test]
    fn test_parse_api_url_keeps_root() {
        let url = parse_api_url("http://127.0.0.1:5000").unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:5000/");
    }

    #[test]
    fn test_parse_api_url_rejects_other_schemes() {
        assert!(parse_api_url("ftp://example.com").is_err());
        assert!(parse_api_url("not a url").is_err());
    }

    #[test]
    fn test_parse_secs() {
        assert_eq!(parse_secs("X", "30").unwrap(), Duration::from_secs(30));
        assert!(matches!(
            parse_secs("X", "soon"),
            Err(ConfigError::InvalidEnvVar(_, _))
        ));
    }

    #[test]
    fn test_with_api_url_defaults() {
        let config = ClientConfig::with_api_url("https://api.example.com").unwrap();
        assert_eq!(config.timeout, Duration::from_secs(15));
        assert_eq!(config.cache_ttl, Duration::from_secs(300));
        assert!(config.sentry_dsn.is_none());
    }
}
