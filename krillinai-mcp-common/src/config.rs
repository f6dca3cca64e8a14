//! Startup configuration and base URL validation.

use crate::error::ConfigError;
use std::time::Duration;

/// Base URL used when neither `--krillinai-url` nor `KRILLINAI_URL` is set.
pub const DEFAULT_KRILLINAI_URL: &str = "http://127.0.0.1:8888";

/// Timeout for calls against the Krillinai API.
pub const API_TIMEOUT: Duration = Duration::from_secs(120);

/// Timeout for direct downloads from arbitrary URLs.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(60);

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Krillinai base URL, scheme-checked and without a trailing slash
    pub krillinai_url: String,
    /// Per-call timeout for Krillinai API requests
    pub api_timeout: Duration,
    /// Per-call timeout for raw file downloads
    pub fetch_timeout: Duration,
}

impl Config {
    /// Build a configuration for the given base URL with default timeouts.
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidBaseUrl` if the URL is not http(s).
    pub fn new(krillinai_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            krillinai_url: normalize_base_url(krillinai_url)?,
            api_timeout: API_TIMEOUT,
            fetch_timeout: FETCH_TIMEOUT,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            krillinai_url: DEFAULT_KRILLINAI_URL.to_string(),
            api_timeout: API_TIMEOUT,
            fetch_timeout: FETCH_TIMEOUT,
        }
    }
}

/// Whether `url` uses the http or https scheme.
pub fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Check the scheme of a base URL and strip trailing slashes.
///
/// # Example
///
/// ```
/// use krillinai_mcp_common::config::normalize_base_url;
///
/// assert_eq!(normalize_base_url("http://host:9999/").unwrap(), "http://host:9999");
/// assert!(normalize_base_url("ftp://x").is_err());
/// ```
pub fn normalize_base_url(url: &str) -> Result<String, ConfigError> {
    let trimmed = url.trim_end_matches('/');
    // "http://" alone trims down to "http:", which is not a usable base.
    if !is_http_url(url) || !is_http_url(trimmed) {
        return Err(ConfigError::invalid_base_url(url));
    }
    Ok(trimmed.to_string())
}
