//! Stdio Transport for MCP Server
//!
//! Provides standard I/O transport for local MCP connections (e.g., desktop clients).

use crate::mcp::CryptoMarketServer;
use crate::tools::ToolContext;
use rmcp::ServiceExt;
use std::sync::Arc;

/// Runs the MCP server with stdio transport
///
/// Messages are read from stdin and responses are written to stdout.
/// Logging is sent to stderr to avoid interfering with the MCP protocol.
///
/// # Returns
///
/// Returns Ok(()) when the client disconnects, or an error if initialization fails.
/// Scheduled jobs are stopped either way.
pub async fn run_stdio_server(context: Arc<ToolContext>) -> anyhow::Result<()> {
    tracing::info!("Starting crypto market MCP server in stdio mode");

    let server = CryptoMarketServer::new(context.clone());

    let result = async {
        let service = server.serve(rmcp::transport::stdio()).await?;
        tracing::info!("MCP server ready on stdio");
        let reason = service.waiting().await?;
        tracing::info!(?reason, "MCP session ended");
        anyhow::Ok(())
    }
    .await;

    context.shutdown();
    tracing::info!("MCP server shutdown complete");
    result
}
