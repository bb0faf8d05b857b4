//! MCP transport layer
//!
//! - Stdio: Standard I/O for local connections (rmcp)
//! - HTTP: Stateless JSON-RPC 2.0 over HTTP (axum)

#[cfg(feature = "http_transport")]
pub mod http;

#[cfg(feature = "mcp_server")]
pub mod stdio;

use std::fmt;
use std::str::FromStr;

/// Transport mode selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportMode {
    /// Standard I/O transport (local MCP connections)
    #[default]
    Stdio,

    /// JSON-RPC over HTTP
    Http,
}

impl FromStr for TransportMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "stdio" => Ok(Self::Stdio),
            "http" => Ok(Self::Http),
            other => Err(format!("Invalid mode: {}", other)),
        }
    }
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdio => write!(f, "stdio"),
            Self::Http => write!(f, "http"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parsing() {
        assert_eq!("stdio".parse::<TransportMode>(), Ok(TransportMode::Stdio));
        assert_eq!("HTTP".parse::<TransportMode>(), Ok(TransportMode::Http));
        assert!("grpc".parse::<TransportMode>().is_err());
    }
}
