//! Model Context Protocol (MCP) server implementation
//!
//! Exposes the tool catalogue through the rmcp SDK 0.8.1. Tools are routed
//! by [`crate::tools::route_tool`] rather than rmcp's tool macros so the HTTP
//! transport can share the exact same dispatch.

pub mod handler;
pub mod server;

// Re-exports
pub use server::CryptoMarketServer;
