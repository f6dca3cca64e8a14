//! MCP Server implementation for the Krillinai connector.
//!
//! This module provides the MCP server handler that exposes:
//! - `get_krillinai_configuration` to read the current base URL
//! - `set_krillinai_base_url` to point the connector at another Krillinai
//! - `upload_file_to_krillinai` to upload a local media file
//! - `start_krillinai_subtitle_task` to start transcription/translation/TTS
//! - `get_krillinai_subtitle_task_details` to poll progress and download links
//! - `fetch_krillinai_file_as_text` to read a result file such as an SRT

use crate::handler::{
    FetchFileParams, GetConfigurationParams, KrillinaiHandler, SetBaseUrlParams,
    SubtitleTaskDetailsParams, UploadFileParams,
};
use crate::subtitle::{SubtitleTaskParams, TRANSLATION_LANGUAGES};
use krillinai_mcp_common::config::Config;
use rmcp::{
    ErrorData as McpError, ServerHandler,
    model::{
        CallToolResult, Content, ListResourcesResult, ListToolsResult, ReadResourceResult,
        ServerCapabilities, ServerInfo, Tool,
    },
};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::sync::Arc;
use tracing::{debug, info};

/// Tool names, in registration order.
pub const TOOL_NAMES: [&str; 6] = [
    "get_krillinai_configuration",
    "set_krillinai_base_url",
    "upload_file_to_krillinai",
    "start_krillinai_subtitle_task",
    "get_krillinai_subtitle_task_details",
    "fetch_krillinai_file_as_text",
];

const INSTRUCTIONS: &str = "Krillinai connector: drives a Krillinai server to transcribe, \
translate and dub media. Typical workflow: \
1) upload_file_to_krillinai with an absolute path on this server's machine and keep the \
returned data.file_path; \
2) start_krillinai_subtitle_task with that path as media_url_on_krillinai and keep \
data.task_id; \
3) poll get_krillinai_subtitle_task_details until data.process_percent reaches 100; \
4) fetch_krillinai_file_as_text on a subtitle_info download_url to read the result. \
Use get_krillinai_configuration and set_krillinai_base_url to inspect or change which \
Krillinai server is used. Every tool returns {error, msg, data}; error 0 means success.";

/// MCP Server for Krillinai.
#[derive(Clone)]
pub struct KrillinaiServer {
    /// Handler for Krillinai operations
    handler: Arc<KrillinaiHandler>,
}

impl KrillinaiServer {
    /// Create a new KrillinaiServer with the given configuration.
    pub fn new(config: Config) -> Self {
        Self::with_handler(KrillinaiHandler::new(&config))
    }

    /// Create a server around an existing handler.
    pub fn with_handler(handler: KrillinaiHandler) -> Self {
        Self {
            handler: Arc::new(handler),
        }
    }

    /// The tool handler.
    pub fn handler(&self) -> &KrillinaiHandler {
        &self.handler
    }

    /// Every tool this server registers.
    pub fn tools() -> Vec<Tool> {
        vec![
            create_tool::<GetConfigurationParams>(
                TOOL_NAMES[0],
                "Get the current Krillinai configuration. Returns data.base_url, the \
                 Krillinai server every other tool talks to.",
            ),
            create_tool::<SetBaseUrlParams>(
                TOOL_NAMES[1],
                "Set the Krillinai base URL used by every later call. The URL must start \
                 with http:// or https://; trailing slashes are removed. On failure the \
                 previous URL stays in effect.",
            ),
            create_tool::<UploadFileParams>(
                TOOL_NAMES[2],
                "Upload a media file to Krillinai. The path must be absolute and exist on \
                 the machine running this MCP server, not on the caller's machine. Returns \
                 data.file_path for use as media_url_on_krillinai or \
                 tts_voice_clone_src_file_url.",
            ),
            create_tool::<SubtitleTaskParams>(TOOL_NAMES[3], start_task_description()),
            create_tool::<SubtitleTaskDetailsParams>(
                TOOL_NAMES[4],
                "Get progress and results of a subtitle task. Relative download links are \
                 made absolute. When process_percent is 100, \
                 data.potential_embedded_video_urls lists horizontal and vertical \
                 embedded-subtitle videos that may exist if embedding was requested.",
            ),
            create_tool::<FetchFileParams>(
                TOOL_NAMES[5],
                "Download a file (typically a subtitle download_url from the task details) \
                 and return its content as text in data.text_content, together with \
                 data.file_name and data.mime_type.",
            ),
        ]
    }

    /// Run the tool called `name` with raw JSON arguments.
    ///
    /// Tool failures come back as successful results carrying an `error = 1`
    /// envelope. Only unknown tools and malformed arguments are MCP errors.
    pub async fn dispatch(
        &self,
        name: &str,
        arguments: Option<Map<String, Value>>,
    ) -> Result<CallToolResult, McpError> {
        info!(tool = %name, "Calling tool");

        let envelope = match name {
            "get_krillinai_configuration" => {
                let _: GetConfigurationParams = parse_params(arguments)?;
                self.handler.get_configuration().await
            }
            "set_krillinai_base_url" => {
                self.handler.set_base_url(parse_params(arguments)?).await
            }
            "upload_file_to_krillinai" => {
                self.handler.upload_file(parse_params(arguments)?).await
            }
            "start_krillinai_subtitle_task" => {
                self.handler.start_subtitle_task(parse_params(arguments)?).await
            }
            "get_krillinai_subtitle_task_details" => {
                self.handler
                    .get_subtitle_task_details(parse_params(arguments)?)
                    .await
            }
            "fetch_krillinai_file_as_text" => {
                self.handler.fetch_file_as_text(parse_params(arguments)?).await
            }
            _ => {
                return Err(McpError::invalid_params(
                    format!("Unknown tool: {}", name),
                    None,
                ));
            }
        };

        envelope_result(&envelope)
    }
}

fn start_task_description() -> String {
    format!(
        "Start a Krillinai subtitle task (speech recognition, optional translation, TTS \
         dubbing and embedded-subtitle videos). media_url_on_krillinai is the file_path \
         returned by upload_file_to_krillinai or a media link. Supplying target_lang \
         requests translation; origin_lang then defaults to language. Supported \
         target_lang values: {}. Returns data.task_id for \
         get_krillinai_subtitle_task_details.",
        TRANSLATION_LANGUAGES.join(", ")
    )
}

impl ServerHandler for KrillinaiServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(INSTRUCTIONS.to_string()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    fn list_tools(
        &self,
        _params: Option<rmcp::model::PaginatedRequestParam>,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        async move {
            Ok(ListToolsResult {
                tools: Self::tools(),
                next_cursor: None,
                meta: None,
            })
        }
    }

    fn call_tool(
        &self,
        params: rmcp::model::CallToolRequestParam,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<CallToolResult, McpError>> + Send + '_ {
        async move { self.dispatch(params.name.as_ref(), params.arguments).await }
    }

    fn list_resources(
        &self,
        _params: Option<rmcp::model::PaginatedRequestParam>,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListResourcesResult, McpError>> + Send + '_ {
        async move {
            debug!("Listing resources (none available for Krillinai server)");

            Ok(ListResourcesResult {
                resources: vec![],
                next_cursor: None,
                meta: None,
            })
        }
    }

    fn read_resource(
        &self,
        params: rmcp::model::ReadResourceRequestParam,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ReadResourceResult, McpError>> + Send + '_ {
        async move {
            let uri = &params.uri;
            debug!(uri = %uri, "Reading resource");

            Err(McpError::resource_not_found(
                format!("Unknown resource: {}", uri),
                None,
            ))
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Create a tool definition from a parameter type's JSON schema.
fn create_tool<T: JsonSchema>(name: &'static str, description: impl Into<Cow<'static, str>>) -> Tool {
    use schemars::schema_for;

    let schema = schema_for!(T);
    let schema_value = serde_json::to_value(&schema).unwrap_or_default();

    let input_schema = match schema_value {
        Value::Object(map) => Arc::new(map),
        _ => Arc::new(Map::new()),
    };

    Tool {
        name: Cow::Borrowed(name),
        description: Some(description.into()),
        input_schema,
        annotations: None,
        icons: None,
        meta: None,
        output_schema: None,
        title: None,
    }
}

/// Parse tool parameters from JSON arguments.
///
/// Absent arguments are read as an empty object, so tools without required
/// fields can be called bare.
fn parse_params<T: for<'de> Deserialize<'de>>(
    arguments: Option<Map<String, Value>>,
) -> Result<T, McpError> {
    serde_json::from_value(Value::Object(arguments.unwrap_or_default()))
        .map_err(|e| McpError::invalid_params(format!("Invalid parameters: {}", e), None))
}

/// Wrap an envelope as pretty-printed JSON text content.
fn envelope_result(envelope: &Value) -> Result<CallToolResult, McpError> {
    let text = serde_json::to_string_pretty(envelope).map_err(|e| {
        McpError::internal_error(format!("Failed to serialize result: {}", e), None)
    })?;
    Ok(CallToolResult::success(vec![Content::text(text)]))
}

// =============================================================================
// Tests
// =============================================================================
