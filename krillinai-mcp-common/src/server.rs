//! Running an MCP server on the selected transport.
//!
//! [`McpServerBuilder`] takes any rmcp `ServerHandler` and serves it either
//! over stdin/stdout or as a streamable HTTP endpoint at [`MCP_HTTP_PATH`].
//! Both transports stop on SIGINT or SIGTERM.
//!
//! # Example
//!
//! ```ignore
//! use krillinai_mcp_common::server::McpServerBuilder;
//! use krillinai_mcp_common::transport::Transport;
//!
//! McpServerBuilder::new(server)
//!     .with_transport(Transport::streamable_http("127.0.0.1", 8001))
//!     .run()
//!     .await?;
//! ```

use crate::transport::Transport;
use rmcp::transport::streamable_http_server::{
    StreamableHttpService, session::local::LocalSessionManager,
};
use rmcp::{ServerHandler, ServiceExt};
use thiserror::Error;
use tokio::net::TcpListener;

/// Path the streamable HTTP transport serves the MCP endpoint on.
pub const MCP_HTTP_PATH: &str = "/mcp";

/// Errors that end a server run.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The HTTP listener could not be bound
    #[error("Failed to bind to {addr}: {message}")]
    BindFailed { addr: String, message: String },

    /// The MCP session or HTTP server failed
    #[error("Transport error: {0}")]
    Transport(String),
}

/// Serves one MCP handler on one transport.
pub struct McpServerBuilder<H> {
    handler: H,
    transport: Transport,
}

impl<H> McpServerBuilder<H>
where
    H: ServerHandler + Clone + Send + Sync + 'static,
{
    /// Serve `handler` over stdio unless another transport is chosen.
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            transport: Transport::default(),
        }
    }

    /// Choose the transport.
    pub fn with_transport(mut self, transport: Transport) -> Self {
        self.transport = transport;
        self
    }

    /// Serve until the client disconnects or a shutdown signal arrives.
    pub async fn run(self) -> Result<(), ServerError> {
        tracing::info!(transport = %self.transport, "Starting MCP server");

        match self.transport.bind_addr() {
            None => serve_stdio(self.handler).await,
            Some(addr) => serve_streamable_http(self.handler, &addr).await,
        }
    }
}

async fn serve_stdio<H>(handler: H) -> Result<(), ServerError>
where
    H: ServerHandler + Send + Sync + 'static,
{
    let session = handler
        .serve(rmcp::transport::io::stdio())
        .await
        .map_err(|e| ServerError::Transport(e.to_string()))?;

    tokio::select! {
        result = session.waiting() => {
            result.map_err(|e| ServerError::Transport(e.to_string()))?;
            tracing::info!("MCP client disconnected");
        }
        _ = shutdown_signal() => {
            tracing::info!("Stopping stdio server");
        }
    }
    Ok(())
}

async fn serve_streamable_http<H>(handler: H, addr: &str) -> Result<(), ServerError>
where
    H: ServerHandler + Clone + Send + Sync + 'static,
{
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| ServerError::BindFailed {
            addr: addr.to_string(),
            message: e.to_string(),
        })?;

    // One handler clone per MCP session; clones share the same state.
    let service = StreamableHttpService::new(
        move || Ok(handler.clone()),
        LocalSessionManager::default().into(),
        Default::default(),
    );
    let router = axum::Router::new().nest_service(MCP_HTTP_PATH, service);

    tracing::info!(addr = %addr, path = MCP_HTTP_PATH, "Streamable HTTP server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ServerError::Transport(e.to_string()))?;

    tracing::info!("Streamable HTTP server stopped");
    Ok(())
}

/// Resolves on SIGTERM or SIGINT (Ctrl+C elsewhere).
///
/// Never resolves if the handlers cannot be installed; the server then runs
/// until its transport closes.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let (mut sigterm, mut sigint) =
            match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
                (Ok(term), Ok(int)) => (term, int),
                (Err(e), _) | (_, Err(e)) => {
                    tracing::warn!(error = %e, "Failed to register signal handlers");
                    return std::future::pending().await;
                }
            };

        tokio::select! {
            _ = sigterm.recv() => tracing::info!("Received SIGTERM"),
            _ = sigint.recv() => tracing::info!("Received SIGINT"),
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to register Ctrl+C handler");
            return std::future::pending().await;
        }
        tracing::info!("Received Ctrl+C");
    }
}
