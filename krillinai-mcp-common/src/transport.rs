//! MCP Transport configuration.
//!
//! Two transport modes are supported:
//!
//! - **Stdio**: Default mode for local subprocess communication
//! - **Streamable HTTP**: MCP endpoint served at `/mcp` on a host and port
//!
//! # Example
//!
//! ```ignore
//! use krillinai_mcp_common::transport::{Transport, TransportArgs};
//! use clap::Parser;
//!
//! #[derive(Parser)]
//! struct Args {
//!     #[command(flatten)]
//!     transport: TransportArgs,
//! }
//!
//! let args = Args::parse();
//! let transport = args.transport.into_transport();
//! ```

use clap::Args;
use std::fmt;

/// Default bind host for the streamable HTTP transport.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default bind port for the streamable HTTP transport.
pub const DEFAULT_PORT: u16 = 8001;

/// Transport mode for MCP server communication.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Transport {
    /// Standard input/output transport (default).
    /// Communicates through stdin/stdout, similar to LSP servers.
    #[default]
    Stdio,
    /// Streamable HTTP transport.
    StreamableHttp {
        /// Host or IP address to bind
        host: String,
        /// Port to listen on
        port: u16,
    },
}

impl Transport {
    /// Create a new stdio transport.
    pub fn stdio() -> Self {
        Transport::Stdio
    }

    /// Create a new streamable HTTP transport.
    pub fn streamable_http(host: impl Into<String>, port: u16) -> Self {
        Transport::StreamableHttp {
            host: host.into(),
            port,
        }
    }

    /// Check if this is a stdio transport.
    pub fn is_stdio(&self) -> bool {
        matches!(self, Transport::Stdio)
    }

    /// Check if this is a streamable HTTP transport.
    pub fn is_streamable_http(&self) -> bool {
        matches!(self, Transport::StreamableHttp { .. })
    }

    /// Get the port if this is a network transport.
    pub fn port(&self) -> Option<u16> {
        match self {
            Transport::Stdio => None,
            Transport::StreamableHttp { port, .. } => Some(*port),
        }
    }

    /// Socket address to bind, if this is a network transport.
    pub fn bind_addr(&self) -> Option<String> {
        match self {
            Transport::Stdio => None,
            Transport::StreamableHttp { host, port } => Some(format!("{}:{}", host, port)),
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transport::Stdio => write!(f, "stdio"),
            Transport::StreamableHttp { host, port } => {
                write!(f, "streamable-http ({}:{}/mcp)", host, port)
            }
        }
    }
}

/// Command-line arguments for transport configuration.
///
/// Use with `clap::Parser` to add transport options to your CLI:
///
/// ```ignore
/// #[derive(Parser)]
/// struct MyArgs {
///     #[command(flatten)]
///     transport: TransportArgs,
/// }
/// ```
#[derive(Args, Debug, Clone)]
pub struct TransportArgs {
    /// MCP transport type: stdio or streamable-http
    #[arg(long = "mcp-transport", default_value = "stdio", value_parser = parse_transport_mode)]
    pub transport: TransportMode,

    /// Host for streamable-http transport
    #[arg(long = "mcp-host", default_value = DEFAULT_HOST)]
    pub host: String,

    /// Port for streamable-http transport
    #[arg(long = "mcp-port", default_value_t = DEFAULT_PORT)]
    pub port: u16,
}

/// Transport mode parsed from command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportMode {
    #[default]
    Stdio,
    StreamableHttp,
}

fn parse_transport_mode(s: &str) -> Result<TransportMode, String> {
    match s.to_lowercase().as_str() {
        "stdio" => Ok(TransportMode::Stdio),
        "streamable-http" => Ok(TransportMode::StreamableHttp),
        _ => Err(format!(
            "Invalid transport mode '{}'. Valid options: stdio, streamable-http",
            s
        )),
    }
}

impl TransportArgs {
    /// Convert command-line arguments into a Transport configuration.
    ///
    /// Host and port are ignored for stdio.
    pub fn into_transport(self) -> Transport {
        match self.transport {
            TransportMode::Stdio => Transport::Stdio,
            TransportMode::StreamableHttp => Transport::StreamableHttp {
                host: self.host,
                port: self.port,
            },
        }
    }
}

impl Default for TransportArgs {
    fn default() -> Self {
        Self {
            transport: TransportMode::Stdio,
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

