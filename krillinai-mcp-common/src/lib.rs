//! Krillinai MCP Common Library
//!
//! Shared utilities for configuration, error handling, MCP transport
//! selection, server startup and tracing used by the Krillinai connector.

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod config;
pub mod error;
pub mod server;
pub mod tracing;
pub mod transport;


pub use config::Config;
pub use error::{ConfigError, Error};
pub use server::{McpServerBuilder, ServerError};
pub use transport::{Transport, TransportArgs, TransportMode};
