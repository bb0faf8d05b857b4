//! HTTP request handlers for MCP JSON-RPC endpoints
//!
//! Implements handlers for:
//! - POST /mcp: Main JSON-RPC endpoint
//!   - initialize: Handshake (no session is created)
//!   - notifications/initialized, initialized: Acknowledged
//!   - ping: Liveness
//!   - tools/list: List all available tools
//!   - tools/call: Execute a tool
//! - GET /healthz: Plain-text liveness probe
//! - GET /tools: Tool catalogue without JSON-RPC framing

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;

use super::error::{HttpTransportError, Result};
use super::jsonrpc::{InitializeResult, JsonRpcRequest, JsonRpcResponse, ToolCallParams};
use crate::tools::{route_tool, tool_definitions, ToolContext};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Tool context shared with every request
    pub context: Arc<ToolContext>,
}

impl AppState {
    pub fn new(context: Arc<ToolContext>) -> Self {
        Self { context }
    }
}

/// Main JSON-RPC endpoint handler
///
/// POST /mcp
/// Content-Type: application/json
///
/// The body is taken raw so malformed JSON can be answered with -32700
/// instead of axum's plain-text rejection.
pub async fn handle_jsonrpc(State(state): State<AppState>, body: String) -> Response {
    let raw: Value = match serde_json::from_str(&body) {
        Ok(value) => value,
        Err(e) => return HttpTransportError::JsonParse(e).into_response(),
    };
    let id = raw.get("id").cloned().unwrap_or(Value::Null);

    let request: JsonRpcRequest = match serde_json::from_value(raw) {
        Ok(request) => request,
        Err(e) => {
            return HttpTransportError::InvalidRequest(e.to_string()).into_response_with_id(id)
        }
    };
    if request.jsonrpc != "2.0" {
        return HttpTransportError::InvalidRequest(format!(
            "unsupported jsonrpc version '{}'",
            request.jsonrpc
        ))
        .into_response_with_id(id);
    }

    tracing::debug!(method = %request.method, "Received JSON-RPC request");

    if request.is_notification() {
        tracing::debug!(method = %request.method, "Acknowledged notification");
        return StatusCode::ACCEPTED.into_response();
    }

    match dispatch(&state, request).await {
        Ok(result) => (StatusCode::OK, Json(JsonRpcResponse::success(result, id))).into_response(),
        Err(err) => {
            tracing::warn!(error = %err, "JSON-RPC request failed");
            err.into_response_with_id(id)
        }
    }
}

/// Routes a request by method name
async fn dispatch(state: &AppState, request: JsonRpcRequest) -> Result<Value> {
    match request.method.as_str() {
        "initialize" => handle_initialize(),
        "notifications/initialized" | "initialized" | "ping" => Ok(json!({})),
        "tools/list" => handle_tools_list(),
        "tools/call" => handle_tools_call(state, request.params).await,
        other => Err(HttpTransportError::MethodNotFound(other.to_string())),
    }
}

/// Handle initialize method
fn handle_initialize() -> Result<Value> {
    tracing::info!("HTTP client initialized");
    Ok(serde_json::to_value(InitializeResult::for_server())?)
}

/// Handle tools/list method
fn handle_tools_list() -> Result<Value> {
    Ok(json!({ "tools": tool_definitions() }))
}

/// Handle tools/call method
///
/// Unknown tools and invalid arguments are protocol errors; upstream and
/// lookup failures come back as a result with `isError: true`.
async fn handle_tools_call(state: &AppState, params: Option<Value>) -> Result<Value> {
    let params = params.ok_or_else(|| HttpTransportError::InvalidParams("Missing params".to_string()))?;
    let call: ToolCallParams = serde_json::from_value(params)
        .map_err(|e| HttpTransportError::InvalidParams(e.to_string()))?;

    tracing::debug!(tool_name = %call.name, "Calling tool");

    let output = route_tool(&state.context, &call.name, call.arguments).await?;
    Ok(output.to_call_result())
}

/// GET /healthz
pub async fn healthz() -> &'static str {
    "ok"
}

/// GET /tools
pub async fn list_tools() -> Json<Value> {
    Json(json!({ "tools": tool_definitions() }))
}
