//! Tool handler for the Krillinai MCP server.
//!
//! This module provides the `KrillinaiHandler` struct and the parameter types
//! of the six Krillinai tools. Every handler method returns the uniform
//! `{error, msg, data}` envelope: failures are logged and folded into an
//! `error = 1` envelope instead of being returned as MCP errors.

use crate::client::{FileUpload, KrillinaiClient, RequestBody};
use crate::details::rewrite_task_details;
use crate::envelope::Envelope;
use crate::state::BaseUrl;
use crate::subtitle::{SubtitleTaskParams, SubtitleTaskRequest};
use crate::text::{DEFAULT_TEXT_MIME_TYPE, TextEncoding, decode_text, file_name_from_url};
use crate::upload::{guess_mime_type, unwrap_file_path, upload_file_name};
use krillinai_mcp_common::config::Config;
use krillinai_mcp_common::error::Error;
use reqwest::Method;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::path::Path;
use tracing::{debug, error, info, instrument, warn};

/// Upstream path for multipart uploads.
pub const UPLOAD_PATH: &str = "/api/file";

/// Upstream path for starting and polling subtitle tasks.
pub const SUBTITLE_TASK_PATH: &str = "/api/capability/subtitleTask";

/// Parameters of `get_krillinai_configuration` (none).
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
pub struct GetConfigurationParams {}

/// Parameters of `set_krillinai_base_url`.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct SetBaseUrlParams {
    /// New Krillinai base URL, e.g. "http://192.168.1.10:8888".
    /// Must start with http:// or https://.
    pub new_url: String,
}

/// Parameters of `upload_file_to_krillinai`.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct UploadFileParams {
    /// Absolute path of the file on the machine running this server.
    pub server_accessible_file_path: String,
}

/// Parameters of `get_krillinai_subtitle_task_details`.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct SubtitleTaskDetailsParams {
    /// Task ID returned by start_krillinai_subtitle_task.
    pub task_id: String,
}

/// Parameters of `fetch_krillinai_file_as_text`.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct FetchFileParams {
    /// Absolute download URL, usually taken from the task details.
    pub full_download_url: String,
}

/// Krillinai tool handler.
///
/// Cheap to clone: the HTTP client and the base URL cell are shared.
#[derive(Debug, Clone)]
pub struct KrillinaiHandler {
    client: KrillinaiClient,
}

impl KrillinaiHandler {
    /// Create a handler with a fresh base URL cell seeded from `config`.
    pub fn new(config: &Config) -> Self {
        let base_url = BaseUrl::from_config(config);
        Self {
            client: KrillinaiClient::new(config, base_url),
        }
    }

    /// The shared base URL cell.
    pub fn base_url(&self) -> &BaseUrl {
        self.client.base_url()
    }

    /// Report the current base URL.
    #[instrument(level = "info", name = "get_krillinai_configuration", skip_all)]
    pub async fn get_configuration(&self) -> Value {
        let base_url = self.base_url().get().await;
        debug!(base_url = %base_url, "Reporting configuration");
        Envelope::success(
            "Current configuration retrieved",
            json!({ "base_url": base_url }),
        )
        .into()
    }

    /// Replace the base URL used by every later upstream call.
    #[instrument(level = "info", name = "set_krillinai_base_url", skip(self))]
    pub async fn set_base_url(&self, params: SetBaseUrlParams) -> Value {
        let previous = self.base_url().get().await;
        match self.base_url().set(&params.new_url).await {
            Ok(change) => {
                let msg = format!(
                    "Krillinai base URL updated from '{}' to '{}'",
                    change.previous_url, change.new_url
                );
                info!("{}", msg);
                Envelope::success(
                    msg,
                    json!({
                        "new_base_url": change.new_url,
                        "previous_base_url": change.previous_url,
                    }),
                )
                .into()
            }
            Err(e) => {
                let msg = format!("Failed to set base URL: {}", e);
                error!("{}", msg);
                Envelope::failure_with(msg, json!({ "previous_base_url": previous })).into()
            }
        }
    }

    /// Upload a local file to Krillinai.
    ///
    /// A missing file is reported without contacting the server.
    #[instrument(level = "info", name = "upload_file_to_krillinai", skip(self))]
    pub async fn upload_file(&self, params: UploadFileParams) -> Value {
        match self.try_upload_file(&params).await {
            Ok(envelope) => envelope,
            Err(e) => {
                error!(error = %e, "Upload failed");
                Envelope::failure(format!("Failed to upload file: {}", e)).into()
            }
        }
    }

    async fn try_upload_file(&self, params: &UploadFileParams) -> Result<Value, Error> {
        let path = Path::new(&params.server_accessible_file_path);
        if !matches!(tokio::fs::try_exists(path).await, Ok(true)) {
            return Err(Error::not_found(path));
        }

        let bytes = tokio::fs::read(path).await?;
        let file = FileUpload {
            file_name: upload_file_name(path),
            mime_type: guess_mime_type(path),
            bytes,
        };
        info!(
            file_name = %file.file_name,
            mime_type = %file.mime_type,
            size = file.bytes.len(),
            "Uploading file to Krillinai"
        );

        let mut envelope = self
            .client
            .request_json(Method::POST, UPLOAD_PATH, RequestBody::File(file))
            .await?;
        if unwrap_file_path(&mut envelope) {
            debug!("Unwrapped list-valued file_path");
        }
        Ok(envelope)
    }

    /// Start a subtitle task and return Krillinai's envelope unchanged.
    #[instrument(level = "info", name = "start_krillinai_subtitle_task", skip(self, params))]
    pub async fn start_subtitle_task(&self, params: SubtitleTaskParams) -> Value {
        let request = SubtitleTaskRequest::build(&params);
        info!(
            url = %request.url,
            language = request.language.code(),
            "Starting subtitle task"
        );

        let body = match serde_json::to_value(&request) {
            Ok(body) => body,
            Err(e) => return self.start_failed(e.into()),
        };

        match self
            .client
            .request_json(Method::POST, SUBTITLE_TASK_PATH, RequestBody::Json(body))
            .await
        {
            Ok(envelope) => envelope,
            Err(e) => self.start_failed(e),
        }
    }

    fn start_failed(&self, e: Error) -> Value {
        error!(error = %e, "Starting subtitle task failed");
        Envelope::failure(format!("Failed to start subtitle task: {}", e)).into()
    }

    /// Poll a subtitle task, making its download links absolute.
    #[instrument(level = "info", name = "get_krillinai_subtitle_task_details", skip(self))]
    pub async fn get_subtitle_task_details(&self, params: SubtitleTaskDetailsParams) -> Value {
        let task_id = params.task_id;
        let path = format!(
            "{}?taskId={}",
            SUBTITLE_TASK_PATH,
            urlencoding::encode(&task_id)
        );

        match self
            .client
            .request_json(Method::GET, &path, RequestBody::Empty)
            .await
        {
            Ok(mut envelope) => {
                let base_url = self.base_url().get().await;
                if rewrite_task_details(&mut envelope, &base_url, &task_id) {
                    info!(task_id = %task_id, "Task complete, added embedded video links");
                }
                envelope
            }
            Err(e) => {
                let msg = format!(
                    "Failed to get subtitle task details (ID: {}): {}",
                    task_id, e
                );
                error!("{}", msg);
                Envelope::failure_with(msg, json!({ "task_id": task_id })).into()
            }
        }
    }

    /// Download a file and return its content as text.
    #[instrument(level = "info", name = "fetch_krillinai_file_as_text", skip(self))]
    pub async fn fetch_file_as_text(&self, params: FetchFileParams) -> Value {
        match self.try_fetch_file_as_text(&params.full_download_url).await {
            Ok(envelope) => envelope,
            Err(e) => {
                error!(error = %e, "Fetching file content failed");
                Envelope::failure(format!("Failed to download file content: {}", e)).into()
            }
        }
    }

    async fn try_fetch_file_as_text(&self, url: &str) -> Result<Value, Error> {
        let response = self.client.fetch(url).await?;
        let mime_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or(DEFAULT_TEXT_MIME_TYPE)
            .to_string();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::request(url, format!("Failed to read response: {}", e)))?;

        let (text_content, encoding) = decode_text(&bytes);
        if encoding == TextEncoding::Latin1 {
            warn!(url = %url, "Content is not valid UTF-8, decoded as Latin-1");
        }

        let file_name = file_name_from_url(url);
        info!(
            file_name = %file_name,
            mime_type = %mime_type,
            encoding = %encoding,
            size = bytes.len(),
            "Fetched file content"
        );

        Ok(Envelope::success(
            "File content retrieved",
            json!({
                "file_name": file_name,
                "text_content": text_content,
                "mime_type": mime_type,
            }),
        )
        .into())
    }
}
