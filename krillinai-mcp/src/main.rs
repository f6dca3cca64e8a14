//! Krillinai MCP Server
//!
//! MCP server driving a Krillinai instance for subtitle, translation and TTS tasks.

use anyhow::Result;
use clap::Parser;
use krillinai_mcp::KrillinaiServer;
use krillinai_mcp_common::config::DEFAULT_KRILLINAI_URL;
use krillinai_mcp_common::tracing::init_tracing;
use krillinai_mcp_common::{Config, McpServerBuilder, TransportArgs};

#[derive(Parser, Debug)]
#[command(name = "krillinai-mcp")]
#[command(about = "MCP server exposing Krillinai subtitle, translation and TTS tasks")]
struct Args {
    /// Base URL of the Krillinai server
    #[arg(long, env = "KRILLINAI_URL", default_value = DEFAULT_KRILLINAI_URL)]
    krillinai_url: String,

    #[command(flatten)]
    transport: TransportArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();

    init_tracing();

    tracing::info!("krillinai-mcp server starting...");

    let args = Args::parse();
    let config = Config::new(&args.krillinai_url)?;
    let transport = args.transport.into_transport();

    tracing::info!(
        krillinai_url = %config.krillinai_url,
        transport = %transport,
        "Configuration loaded"
    );

    let server = KrillinaiServer::new(config);

    McpServerBuilder::new(server)
        .with_transport(transport)
        .run()
        .await?;

    Ok(())
}
