//! HTTP Server Configuration
//!
//! Bind address for the JSON-RPC HTTP transport.

use std::net::SocketAddr;

use super::{lookup_or, ConfigError};

/// HTTP server configuration
///
/// ## Environment Variables
///
/// - `HTTP_HOST`: Server bind address (default: 0.0.0.0)
/// - `HTTP_PORT`: Server port (default: 8080)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpConfig {
    /// Server bind address
    pub addr: SocketAddr,
}

impl HttpConfig {
    pub const DEFAULT_HOST: &'static str = "0.0.0.0";
    pub const DEFAULT_PORT: u16 = 8080;

    /// Load HTTP configuration through an arbitrary variable lookup
    ///
    /// # Errors
    ///
    /// Returns error if the port is not a number or host:port is not a socket address
    pub fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("HTTP_HOST").unwrap_or_else(|| Self::DEFAULT_HOST.to_string());
        let port: u16 = lookup_or(lookup, "HTTP_PORT", Self::DEFAULT_PORT)?;
        Self::from_parts(&host, port)
    }

    /// Builds the bind address from host and port
    pub fn from_parts(host: &str, port: u16) -> Result<Self, ConfigError> {
        let raw = format!("{}:{}", host, port);
        let addr = raw.parse().map_err(|_| ConfigError::Invalid {
            var: "HTTP_HOST",
            value: raw.clone(),
            reason: "not a valid socket address".to_string(),
        })?;
        Ok(Self { addr })
    }

    /// Same host, different port (the `--port` CLI override)
    pub fn with_port(&self, port: u16) -> Self {
        Self {
            addr: SocketAddr::new(self.addr.ip(), port),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], Self::DEFAULT_PORT)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = HttpConfig::from_lookup(&|_| None).expect("Failed to load config");
        assert_eq!(config.addr.to_string(), "0.0.0.0:8080");
    }

    #[test]
    fn test_with_port() {
        let config = HttpConfig::from_parts("127.0.0.1", 8080).unwrap().with_port(9000);
        assert_eq!(config.addr.to_string(), "127.0.0.1:9000");
    }

    #[test]
    fn test_invalid_host() {
        let result = HttpConfig::from_lookup(&|key: &str| {
            (key == "HTTP_HOST").then(|| "not a host".to_string())
        });
        assert!(result.is_err());
    }
}
