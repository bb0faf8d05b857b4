//! Tool catalogue and dispatch
//!
//! Both transports call [`route_tool`] with a tool name and raw JSON
//! arguments. Argument shape and range errors, plus unknown names, come back
//! as `Err` and become protocol errors. Domain failures (upstream errors,
//! unknown ticket or job ids) come back as `Ok` with `is_error` set.

pub mod confirmations;
pub mod market;
pub mod params;
pub mod risk;
pub mod scheduler;
pub mod search;

use chrono::{DateTime, SecondsFormat, Utc};
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;

use crate::binance::BinanceClient;
use crate::config::ServerConfig;
use crate::coordination::BoundedCache;
use crate::error::{ProviderError, Result, UpstreamError};
use crate::market::MarketData;
use crate::state::Registries;

pub use search::SearchEntry;

/// Everything a tool handler may touch
///
/// Constructed once per server process and shared behind an `Arc`.
pub struct ToolContext {
    pub market: MarketData,
    pub registries: Registries,
    pub search_cache: BoundedCache<SearchEntry>,
}

impl ToolContext {
    pub fn new(market: MarketData, registries: Registries, search_cache_size: usize) -> Self {
        Self {
            market,
            registries,
            search_cache: BoundedCache::new(search_cache_size),
        }
    }

    /// Builds the client, limiters and registries from configuration
    pub fn from_config(config: &ServerConfig) -> Result<Self> {
        let client = BinanceClient::from_config(&config.binance)?;
        let market = MarketData::new(client, &config.coordination);
        Ok(Self::new(
            market,
            Registries::new(),
            config.coordination.search_cache_size,
        ))
    }

    /// Stops every scheduled job; called on shutdown
    pub fn shutdown(&self) {
        let stopped = self.registries.jobs.remove_all();
        tracing::info!(stopped, "Tool context shut down");
    }
}

/// Result of a tool call, independent of transport
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    pub text: String,
    pub structured: Option<Value>,
    pub is_error: bool,
}

impl ToolOutput {
    pub fn success(text: impl Into<String>, structured: Value) -> Self {
        Self {
            text: text.into(),
            structured: Some(structured),
            is_error: false,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            structured: None,
            is_error: false,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            structured: None,
            is_error: true,
        }
    }

    /// MCP `CallToolResult` wire shape
    pub fn to_call_result(&self) -> Value {
        let mut result = json!({
            "content": [{ "type": "text", "text": self.text }],
            "isError": self.is_error,
        });
        if let Some(structured) = &self.structured {
            result["structuredContent"] = structured.clone();
        }
        result
    }
}

/// A tool as advertised by `tools/list`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Map<String, Value>,
}

fn definition<T: JsonSchema>(name: &'static str, description: &'static str) -> ToolDefinition {
    let schema = schemars::schema_for!(T);
    let input_schema = match serde_json::to_value(schema) {
        Ok(Value::Object(map)) => map,
        _ => {
            let mut map = Map::new();
            map.insert("type".to_string(), json!("object"));
            map
        }
    };
    ToolDefinition {
        name,
        description,
        input_schema,
    }
}

/// The full tool catalogue, in a stable order
pub fn tool_definitions() -> Vec<ToolDefinition> {
    use params::*;
    vec![
        definition::<OhlcvParams>(
            "get_ohlcv",
            "Fetch OHLCV candles for a Binance spot or futures symbol",
        ),
        definition::<SymbolParams>("get_mark_price", "Get the current mark price of a perpetual"),
        definition::<FundingRateParams>(
            "get_funding_rate",
            "Get funding rate history for a perpetual",
        ),
        definition::<OpenInterestParams>(
            "get_open_interest",
            "Get open interest history for a perpetual",
        ),
        definition::<KlinesParams>(
            "get_binance_klines",
            "Fetch the latest Binance spot candlesticks",
        ),
        definition::<KlinesParams>(
            "get_binance_perp_klines",
            "Fetch Binance USDⓈ-M perpetual candlesticks (e.g. BTCUSDT)",
        ),
        definition::<PriceActionParams>(
            "price_action_summary",
            "Analyze recent price action and return structure/support/resistance levels",
        ),
        definition::<DraftOrderParams>(
            "draft_order",
            "Draft a potential order with RR calculations and risk policy checks",
        ),
        definition::<SearchParams>(
            "search",
            "Searches Binance spot markets and returns IDs usable with fetch",
        ),
        definition::<FetchParams>(
            "fetch",
            "Fetches 24h Binance market data for an ID returned by search",
        ),
        definition::<RequestConfirmationParams>(
            "request_confirmation",
            "Create a confirmation ticket for a risky action",
        ),
        definition::<GetConfirmationParams>(
            "get_confirmation",
            "Retrieve a confirmation ticket by ID",
        ),
        definition::<NoParams>("list_confirmations", "List all pending confirmation tickets"),
        definition::<ScheduleTaskParams>(
            "schedule_task",
            "Schedule an analysis or alert task (in memory only)",
        ),
        definition::<NoParams>("list_jobs", "List in-memory scheduled tasks"),
        definition::<CancelJobParams>("cancel_job", "Cancel a scheduled task by ID"),
        definition::<NoParams>("get_risk_policy", "Return the current risk policy"),
        definition::<crate::state::RiskPolicyUpdate>(
            "set_risk_policy",
            "Update the risk policy (partial updates allowed)",
        ),
        definition::<NoParams>("reset_risk_policy", "Restore the default risk policy"),
    ]
}

/// Dispatches a tool call
///
/// # Arguments
/// * `ctx` - Shared tool context
/// * `name` - Tool name from `tools/call`
/// * `arguments` - Raw arguments; `None` is treated as `{}`
///
/// # Errors
/// * `ToolNotFound` - unknown tool name
/// * `Validation` - arguments fail to deserialize or are out of range
pub async fn route_tool(
    ctx: &Arc<ToolContext>,
    name: &str,
    arguments: Option<Map<String, Value>>,
) -> Result<ToolOutput> {
    tracing::debug!(tool = %name, "Routing tool");
    let args = Value::Object(arguments.unwrap_or_default());

    let output = match name {
        "get_ohlcv" => market::get_ohlcv(ctx, parse_args(args)?).await?,
        "get_mark_price" => market::get_mark_price(ctx, parse_args(args)?).await?,
        "get_funding_rate" => market::get_funding_rate(ctx, parse_args(args)?).await?,
        "get_open_interest" => market::get_open_interest(ctx, parse_args(args)?).await?,
        "get_binance_klines" => market::get_binance_klines(ctx, parse_args(args)?).await?,
        "get_binance_perp_klines" => {
            market::get_binance_perp_klines(ctx, parse_args(args)?).await?
        }
        "price_action_summary" => market::price_action_summary(ctx, parse_args(args)?).await?,
        "draft_order" => market::draft_order(ctx, parse_args(args)?).await?,

        "search" => search::search(ctx, parse_args(args)?)?,
        "fetch" => search::fetch(ctx, parse_args(args)?).await?,

        "request_confirmation" => confirmations::request_confirmation(ctx, parse_args(args)?)?,
        "get_confirmation" => confirmations::get_confirmation(ctx, parse_args(args)?)?,
        "list_confirmations" => confirmations::list_confirmations(ctx)?,

        "schedule_task" => scheduler::schedule_task(ctx, parse_args(args)?)?,
        "list_jobs" => scheduler::list_jobs(ctx)?,
        "cancel_job" => scheduler::cancel_job(ctx, parse_args(args)?)?,

        "get_risk_policy" => risk::get_risk_policy(ctx)?,
        "set_risk_policy" => risk::set_risk_policy(ctx, parse_args(args)?)?,
        "reset_risk_policy" => risk::reset_risk_policy(ctx)?,

        _ => return Err(ProviderError::ToolNotFound(name.to_string())),
    };

    tracing::info!(tool = %name, is_error = output.is_error, "Tool call completed");
    Ok(output)
}

fn parse_args<T: DeserializeOwned>(args: Value) -> Result<T> {
    serde_json::from_value(args)
        .map_err(|e| ProviderError::Validation(format!("Invalid arguments: {}", e)))
}

/// Logs an upstream failure and turns it into an error result
pub(crate) fn upstream_failure(action: &str, err: UpstreamError) -> ToolOutput {
    let retryable = err.is_retryable();
    tracing::warn!(
        error = %err,
        error_type = err.error_type(),
        retryable,
        "{} failed",
        action
    );
    if retryable {
        ToolOutput::error(format!("{} failed: {} (temporary, try again later)", action, err))
    } else {
        ToolOutput::error(format!("{} failed: {}", action, err))
    }
}

/// Milliseconds since epoch as RFC 3339 with millisecond precision
pub(crate) fn iso_millis(ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .map(|dt| iso(&dt))
        .unwrap_or_else(|| ms.to_string())
}

pub(crate) fn iso(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalogue_names_unique() {
        let defs = tool_definitions();
        let mut names: Vec<&str> = defs.iter().map(|d| d.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), defs.len());
        assert_eq!(defs.len(), 19);
    }

    #[test]
    fn test_schemas_are_objects() {
        for def in tool_definitions() {
            assert_eq!(
                def.input_schema.get("type"),
                Some(&json!("object")),
                "{} schema is not an object",
                def.name
            );
        }
    }

    #[test]
    fn test_call_result_shape() {
        let ok = ToolOutput::success("done", json!({ "a": 1 })).to_call_result();
        assert_eq!(ok["content"][0]["text"], "done");
        assert_eq!(ok["structuredContent"]["a"], 1);
        assert_eq!(ok["isError"], false);

        let err = ToolOutput::error("nope").to_call_result();
        assert_eq!(err["isError"], true);
        assert!(err.get("structuredContent").is_none());
    }

    #[test]
    fn test_upstream_failure_marks_transient_errors() {
        let limited = upstream_failure(
            "Fetching mark price",
            UpstreamError::RateLimitError("429 Too Many Requests".to_string()),
        );
        assert!(limited.is_error);
        assert!(limited.text.ends_with("(temporary, try again later)"));

        let rejected = upstream_failure(
            "Fetching mark price",
            UpstreamError::ApiError { status: 400, message: "Invalid symbol".to_string() },
        );
        assert!(rejected.is_error);
        assert!(!rejected.text.contains("try again"));
    }

    #[test]
    fn test_iso_millis() {
        assert_eq!(iso_millis(0), "1970-01-01T00:00:00.000Z");
    }
}
