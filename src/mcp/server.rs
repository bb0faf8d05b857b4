//! MCP Server Implementation
//!
//! This module contains the CryptoMarketServer struct which implements the MCP ServerHandler trait.

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::error::Result;
use crate::tools::ToolContext;

/// Main MCP server struct
///
/// Holds the shared tool context (upstream client, rate limiters, registries
/// and search cache). Clones share the same context.
#[derive(Clone)]
pub struct CryptoMarketServer {
    /// Shared state for every tool call
    pub context: Arc<ToolContext>,
}

impl CryptoMarketServer {
    /// Wraps an existing tool context
    pub fn new(context: Arc<ToolContext>) -> Self {
        Self { context }
    }

    /// Builds a server and its tool context from configuration
    pub fn from_config(config: &ServerConfig) -> Result<Self> {
        Ok(Self::new(Arc::new(ToolContext::from_config(config)?)))
    }
}
