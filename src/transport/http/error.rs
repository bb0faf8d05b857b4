//! HTTP transport error handling
//!
//! Converts internal errors to JSON-RPC error responses with appropriate
//! HTTP status codes and error details.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;

use super::jsonrpc::{JsonRpcError, JsonRpcResponse};
use crate::error::ProviderError;

/// HTTP transport errors
#[derive(Debug, thiserror::Error)]
pub enum HttpTransportError {
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid JSON-RPC request: {0}")]
    InvalidRequest(String),

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),
}

impl HttpTransportError {
    /// Convert to JSON-RPC error code
    pub fn to_jsonrpc_error(&self) -> JsonRpcError {
        match self {
            HttpTransportError::JsonParse(e) => {
                JsonRpcError::new(JsonRpcError::PARSE_ERROR, format!("Parse error: {}", e))
            }
            HttpTransportError::InvalidRequest(msg) => JsonRpcError::new(
                JsonRpcError::INVALID_REQUEST,
                format!("Invalid Request: {}", msg),
            ),
            HttpTransportError::MethodNotFound(method) => JsonRpcError::new(
                JsonRpcError::METHOD_NOT_FOUND,
                format!("Method not found: {}", method),
            ),
            HttpTransportError::InvalidParams(msg) => JsonRpcError::new(
                JsonRpcError::INVALID_PARAMS,
                format!("Invalid params: {}", msg),
            ),
            HttpTransportError::Internal(msg) => JsonRpcError::new(
                JsonRpcError::INTERNAL_ERROR,
                format!("Internal error: {}", msg),
            ),
            HttpTransportError::Provider(err @ ProviderError::ToolNotFound(name)) => {
                JsonRpcError::with_data(
                    JsonRpcError::INVALID_PARAMS,
                    err.to_string(),
                    serde_json::json!({ "tool": name }),
                )
            }
            HttpTransportError::Provider(err) if err.is_client_error() => {
                JsonRpcError::new(JsonRpcError::INVALID_PARAMS, err.to_string())
            }
            HttpTransportError::Provider(err) => {
                JsonRpcError::new(JsonRpcError::INTERNAL_ERROR, err.to_string())
            }
        }
    }

    /// Get HTTP status code for error
    pub fn status_code(&self) -> StatusCode {
        match self {
            HttpTransportError::JsonParse(_) => StatusCode::BAD_REQUEST,
            HttpTransportError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            HttpTransportError::MethodNotFound(_) => StatusCode::NOT_FOUND,
            HttpTransportError::InvalidParams(_) => StatusCode::BAD_REQUEST,
            HttpTransportError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            HttpTransportError::Provider(err) if err.is_client_error() => StatusCode::BAD_REQUEST,
            HttpTransportError::Provider(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Error response echoing the request id
    pub fn into_response_with_id(self, id: Value) -> Response {
        let status = self.status_code();
        let response = JsonRpcResponse::error(self.to_jsonrpc_error(), id);
        (status, Json(response)).into_response()
    }
}

impl IntoResponse for HttpTransportError {
    fn into_response(self) -> Response {
        // No request context, so the id is null
        self.into_response_with_id(Value::Null)
    }
}

/// Result type for HTTP transport operations
pub type Result<T> = std::result::Result<T, HttpTransportError>;
