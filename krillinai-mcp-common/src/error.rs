//! Error types for the common library.
//!
//! This module provides a unified error hierarchy using `thiserror` for consistent
//! error handling across the Krillinai connector.
//!
//! # Error Categories
//!
//! - `ConfigError`: Invalid configuration (bad base URL scheme)
//! - `Error::NotFound`: Local files that do not exist
//! - `Error::InvalidArgument`: Unsupported bridge arguments (HTTP method)
//! - `Error::HttpStatus`: Upstream answered with HTTP status >= 400
//! - `Error::Request`: Network-level failures (DNS, connect, timeout)
//! - `Error::Json`: Bodies that are not valid JSON
//! - `Error::Io`: File system operations

use std::path::PathBuf;
use thiserror::Error;

/// Unified error type for the common library.
///
/// Every tool handler converts this into an `error=1` envelope, so the
/// `Display` output is what callers end up reading in `msg`.
#[derive(Debug, Error)]
pub enum Error {
    /// A local file that was expected to exist does not
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    /// An argument the HTTP bridge cannot act on
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Upstream answered with an error status
    ///
    /// Carries the requested URL, the HTTP status code and the raw response
    /// body so callers can see exactly what the upstream service said.
    #[error("HTTP error for {url} (HTTP {status_code}): {body}")]
    HttpStatus {
        /// The URL that was requested
        url: String,
        /// HTTP status code returned by the server
        status_code: u16,
        /// Raw response body
        body: String,
    },

    /// Network-level failure before a status was received
    #[error("Request error for {url}: {message}")]
    Request {
        /// The URL that was requested
        url: String,
        /// Underlying cause
        message: String,
    },

    /// JSON (de)serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// File system I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a new HTTP status error with URL, status code, and body.
    ///
    /// # Example
    ///
    /// ```
    /// use krillinai_mcp_common::error::Error;
    ///
    /// let err = Error::http_status(
    ///     "http://127.0.0.1:8888/api/file",
    ///     502,
    ///     "Bad gateway"
    /// );
    /// assert!(err.to_string().contains("/api/file"));
    /// assert!(err.to_string().contains("502"));
    /// ```
    pub fn http_status(url: impl Into<String>, status_code: u16, body: impl Into<String>) -> Self {
        Error::HttpStatus {
            url: url.into(),
            status_code,
            body: body.into(),
        }
    }

    /// Create a new network-level request error.
    ///
    /// # Example
    ///
    /// ```
    /// use krillinai_mcp_common::error::Error;
    ///
    /// let err = Error::request("http://127.0.0.1:1/api/file", "connection refused");
    /// assert!(err.to_string().contains("connection refused"));
    /// ```
    pub fn request(url: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Request {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a new not-found error for a local path.
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Error::NotFound(path.into())
    }

    /// Create a new invalid-argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Error::InvalidArgument(message.into())
    }
}

/// Configuration errors.
///
/// These errors occur when loading configuration from the command line or
/// environment, or when the base URL is changed at runtime.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A base URL that does not use the http or https scheme
    #[error("Invalid base URL '{0}': must start with http:// or https://")]
    InvalidBaseUrl(String),
}

impl ConfigError {
    /// Create a new invalid base URL error.
    pub fn invalid_base_url(url: impl Into<String>) -> Self {
        ConfigError::InvalidBaseUrl(url.into())
    }
}
