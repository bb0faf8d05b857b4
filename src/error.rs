use thiserror::Error;

use crate::state::JobError;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Initialization error: {0}")]
    Initialization(String),

    #[error("Upstream error: {0}")]
    Upstream(#[from] UpstreamError),

    #[error("Scheduler error: {0}")]
    Job(#[from] JobError),
}

impl ProviderError {
    /// Errors that reflect a bad caller request rather than a server fault
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ProviderError::Validation(_) | ProviderError::NotFound(_) | ProviderError::Job(_)
        )
    }
}

/// Failures talking to the Binance REST API
#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimitError(String),

    #[error("Binance API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl UpstreamError {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            UpstreamError::ConnectionError(_) | UpstreamError::RateLimitError(_)
        )
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            UpstreamError::ConnectionError(_) => "connection_error",
            UpstreamError::RateLimitError(_) => "rate_limit",
            UpstreamError::ApiError { .. } => "api_error",
            UpstreamError::ParseError(_) => "parse_error",
            UpstreamError::InvalidRequest(_) => "invalid_request",
            UpstreamError::InternalError(_) => "internal_error",
        }
    }

    /// Maps a non-2xx response to an error carrying the status and body text
    pub fn from_status(status: u16, body: &str) -> Self {
        let body = body.trim();
        match status {
            429 => UpstreamError::RateLimitError(format!(
                "Too many requests to Binance API (HTTP 429) {}",
                body
            )),
            418 => UpstreamError::ConnectionError(format!(
                "IP address banned by Binance (HTTP 418) {}",
                body
            )),
            403 => UpstreamError::ConnectionError(format!(
                "WAF limit violated (HTTP 403) {}",
                body
            )),
            500..=599 => UpstreamError::ConnectionError(format!(
                "Binance server error (HTTP {}) {}",
                status, body
            )),
            _ => UpstreamError::ApiError {
                status,
                message: body.to_string(),
            },
        }
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            UpstreamError::ConnectionError(
                "Request timeout. Please check your internet connection.".to_string(),
            )
        } else if err.is_connect() {
            UpstreamError::ConnectionError(
                "Failed to connect to Binance API. Please check your internet connection."
                    .to_string(),
            )
        } else if let Some(status) = err.status() {
            UpstreamError::from_status(status.as_u16(), "")
        } else if err.is_decode() {
            UpstreamError::ParseError(err.to_string())
        } else {
            UpstreamError::InternalError(err.to_string())
        }
    }
}

impl From<serde_json::Error> for UpstreamError {
    fn from(err: serde_json::Error) -> Self {
        UpstreamError::ParseError(format!("JSON parsing failed: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, ProviderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            UpstreamError::from_status(429, "slow down"),
            UpstreamError::RateLimitError(_)
        ));
        assert!(UpstreamError::from_status(503, "").is_retryable());
        assert!(UpstreamError::from_status(418, "").is_retryable());

        let err = UpstreamError::from_status(400, r#"{"code":-1121,"msg":"Invalid symbol."}"#);
        assert_eq!(err.error_type(), "api_error");
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("Invalid symbol."));
    }

    #[test]
    fn test_client_errors() {
        assert!(ProviderError::Validation("bad".to_string()).is_client_error());
        assert!(!ProviderError::Internal("boom".to_string()).is_client_error());
    }
}
