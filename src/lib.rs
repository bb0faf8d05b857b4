// Library exports for crypto-binance-provider

pub mod error;

// In-memory coordination primitives and registries
pub mod coordination; // Rate limiter, retry policy, bounded cache
pub mod state; // Confirmations, scheduled jobs, risk policy

// Binance API integration modules
pub mod binance; // Binance REST client
pub mod config; // Configuration management
pub mod market; // Rate-limited, retried market data access

pub mod analysis; // Price-action summaries and order drafts
pub mod tools; // Tool catalogue and dispatch

#[cfg(feature = "mcp_server")]
pub mod mcp; // MCP server implementation

pub mod transport; // stdio and HTTP transports
