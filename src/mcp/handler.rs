//! ServerHandler Implementation
//!
//! Implements the MCP protocol ServerHandler trait on top of the shared tool
//! catalogue in [`crate::tools`], so stdio and HTTP expose identical tools.

use crate::error::ProviderError;
use crate::mcp::server::CryptoMarketServer;
use crate::tools::{route_tool, tool_definitions, ToolOutput};
use rmcp::handler::server::ServerHandler;
use rmcp::model::{
    CallToolRequestParam, CallToolResult, Content, ErrorData, Implementation, InitializeResult,
    ListToolsResult, PaginatedRequestParam, ProtocolVersion, ServerCapabilities, Tool,
    ToolsCapability,
};
use rmcp::service::{RequestContext, RoleServer};
use std::sync::Arc;

/// Converts the catalogue into rmcp tool descriptors
pub fn list_rmcp_tools() -> Vec<Tool> {
    tool_definitions()
        .into_iter()
        .map(|def| Tool::new(def.name, def.description, Arc::new(def.input_schema)))
        .collect()
}

/// Maps a transport-independent tool output onto `CallToolResult`
pub fn to_call_tool_result(output: ToolOutput) -> CallToolResult {
    let content = vec![Content::text(output.text)];
    let mut result = if output.is_error {
        CallToolResult::error(content)
    } else {
        CallToolResult::success(content)
    };
    result.structured_content = output.structured;
    result
}

/// Maps dispatch failures onto MCP protocol errors
pub fn to_error_data(err: ProviderError) -> ErrorData {
    match err {
        ProviderError::ToolNotFound(name) => {
            ErrorData::invalid_params(format!("Tool not found: {}", name), None)
        }
        ProviderError::Validation(msg) => ErrorData::invalid_params(msg, None),
        other => ErrorData::internal_error(other.to_string(), None),
    }
}

impl ServerHandler for CryptoMarketServer {
    /// Returns server information and capabilities
    ///
    /// This is called during MCP initialization to communicate server metadata
    /// and supported features to the client.
    fn get_info(&self) -> InitializeResult {
        InitializeResult {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {
                    list_changed: Some(false),
                }),
                ..Default::default()
            },
            server_info: Implementation {
                name: "crypto-binance-provider".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: Some("Crypto Market Data MCP Server".to_string()),
                website_url: None,
                icons: None,
            },
            instructions: Some(
                "Binance market data (spot and USDⓈ-M futures), price-action analysis, \
                order drafting against an in-memory risk policy, confirmation tickets \
                and scheduled tasks. All state is in memory."
                    .to_string(),
            ),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, ErrorData> {
        Ok(ListToolsResult {
            tools: list_rmcp_tools(),
            next_cursor: None,
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        let output = route_tool(&self.context, &request.name, request.arguments)
            .await
            .map_err(to_error_data)?;
        Ok(to_call_tool_result(output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_list_matches_catalogue() {
        let tools = list_rmcp_tools();
        assert_eq!(tools.len(), tool_definitions().len());
        assert!(tools.iter().any(|t| t.name == "draft_order"));
    }

    #[test]
    fn test_error_result_flagged() {
        let result = to_call_tool_result(ToolOutput::error("boom"));
        assert_eq!(result.is_error, Some(true));
        assert!(result.structured_content.is_none());
    }
}
