//! HTTP bridge to the Krillinai API.
//!
//! All upstream calls go through [`KrillinaiClient::request`], which prefixes
//! the current base URL, applies the API timeout, logs the request and turns
//! error statuses and network failures into [`Error`] values. No retries are
//! attempted at this layer or above.

use crate::state::BaseUrl;
use krillinai_mcp_common::config::Config;
use krillinai_mcp_common::error::Error;
use reqwest::Method;
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, info, instrument};

/// A file to send as the `file` field of a multipart upload.
#[derive(Debug, Clone)]
pub struct FileUpload {
    /// File name reported to the server.
    pub file_name: String,
    /// Raw file content.
    pub bytes: Vec<u8>,
    /// MIME type of the content.
    pub mime_type: String,
}

/// Body of an outbound request.
#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    /// No body.
    #[default]
    Empty,
    /// JSON body.
    Json(Value),
    /// Multipart form with a single `file` field.
    File(FileUpload),
}

impl RequestBody {
    /// Loggable description of the body. File content is never included.
    fn describe(&self) -> String {
        match self {
            RequestBody::Empty => "{}".to_string(),
            RequestBody::Json(value) => format!("json={}", value),
            RequestBody::File(file) => format!(
                "file={} ({}, {} bytes)",
                file.file_name,
                file.mime_type,
                file.bytes.len()
            ),
        }
    }
}

/// Client for the Krillinai REST API.
#[derive(Debug, Clone)]
pub struct KrillinaiClient {
    http: reqwest::Client,
    base_url: BaseUrl,
    api_timeout: Duration,
    fetch_timeout: Duration,
}

impl KrillinaiClient {
    /// Create a client reading its base URL from `base_url`.
    pub fn new(config: &Config, base_url: BaseUrl) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
            api_timeout: config.api_timeout,
            fetch_timeout: config.fetch_timeout,
        }
    }

    /// The shared base URL cell this client reads from.
    pub fn base_url(&self) -> &BaseUrl {
        &self.base_url
    }

    /// Send a request to `<base_url><path>`.
    ///
    /// Only `GET` and `POST` are supported. The path is appended verbatim.
    ///
    /// # Errors
    /// - `Error::InvalidArgument` for any other method
    /// - `Error::HttpStatus` when the server answers with status >= 400
    /// - `Error::Request` for DNS, connection and timeout failures
    #[instrument(level = "debug", skip(self, body))]
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: RequestBody,
    ) -> Result<reqwest::Response, Error> {
        let url = format!("{}{}", self.base_url.get().await, path);
        info!(method = %method, url = %url, body = %body.describe(), "Sending request to Krillinai");

        let builder = if method == Method::GET {
            self.http.get(&url)
        } else if method == Method::POST {
            self.http.post(&url)
        } else {
            return Err(Error::invalid_argument(format!(
                "Unsupported HTTP method: {}",
                method
            )));
        };

        let builder = match body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::File(file) => {
                let part = Part::bytes(file.bytes)
                    .file_name(file.file_name)
                    .mime_str(&file.mime_type)
                    .map_err(|e| Error::invalid_argument(format!("Invalid MIME type: {}", e)))?;
                builder.multipart(Form::new().part("file", part))
            }
        };

        let response = builder
            .timeout(self.api_timeout)
            .send()
            .await
            .map_err(|e| {
                let cause = send_error_cause(&e);
                error!(method = %method, url = %url, error = %cause, "Krillinai request failed");
                Error::request(&url, cause)
            })?;

        check_status(&method, &url, response).await
    }

    /// Send a request and parse the response body as JSON.
    pub async fn request_json(
        &self,
        method: Method,
        path: &str,
        body: RequestBody,
    ) -> Result<Value, Error> {
        let response = self.request(method, path, body).await?;
        let url = response.url().to_string();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::request(&url, format!("Failed to read response: {}", e)))?;
        let value: Value = serde_json::from_slice(&bytes)?;
        debug!(url = %url, response = %value, "Krillinai response");
        Ok(value)
    }

    /// GET an absolute URL directly, without the base URL prefix.
    ///
    /// Uses the shorter download timeout and fails the same way as
    /// [`request`](Self::request).
    #[instrument(level = "debug", skip(self))]
    pub async fn fetch(&self, url: &str) -> Result<reqwest::Response, Error> {
        info!(url = %url, "Fetching file");

        let response = self
            .http
            .get(url)
            .timeout(self.fetch_timeout)
            .send()
            .await
            .map_err(|e| {
                let cause = send_error_cause(&e);
                error!(url = %url, error = %cause, "File fetch failed");
                Error::request(url, cause)
            })?;

        check_status(&Method::GET, url, response).await
    }
}

/// Message for a failed send, including the whole source chain.
///
/// reqwest's own `Display` stops at "error sending request"; the reason
/// (connection refused, DNS failure, timeout) lives in the sources.
fn send_error_cause(e: &reqwest::Error) -> String {
    let mut message = e.to_string();
    let mut source = std::error::Error::source(e);
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    if e.is_timeout() && !message.contains("timed out") {
        message.push_str(": operation timed out");
    }
    message
}

/// Turn a 4xx/5xx response into `Error::HttpStatus` carrying the body.
async fn check_status(
    method: &Method,
    url: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response, Error> {
    let status = response.status();
    if status.is_client_error() || status.is_server_error() {
        let body = response.text().await.unwrap_or_default();
        error!(
            method = %method,
            url = %url,
            status = status.as_u16(),
            body = %body,
            "HTTP error response"
        );
        return Err(Error::http_status(url, status.as_u16(), body));
    }
    Ok(response)
}
