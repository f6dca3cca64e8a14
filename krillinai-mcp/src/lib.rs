//! Krillinai MCP Server Library
//!
//! This library exposes a Krillinai media-processing server (speech
//! recognition, subtitle translation, TTS dubbing) to LLM agents as MCP
//! tools. Each tool maps its arguments onto the Krillinai REST API and
//! answers with the `{error, msg, data}` envelope Krillinai itself uses.

pub mod client;
pub mod details;
pub mod envelope;
pub mod handler;
pub mod server;
pub mod state;
pub mod subtitle;
pub mod text;
pub mod upload;

pub use client::{FileUpload, KrillinaiClient, RequestBody};
pub use envelope::Envelope;
pub use handler::{
    FetchFileParams, GetConfigurationParams, KrillinaiHandler, SetBaseUrlParams,
    SubtitleTaskDetailsParams, UploadFileParams,
};
pub use server::KrillinaiServer;
pub use state::{BaseUrl, BaseUrlChange};
pub use subtitle::{SubtitleTaskParams, SubtitleTaskRequest};
