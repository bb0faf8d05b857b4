//! `search` / `fetch` tool pair
//!
//! `search` turns a free-text query into an id of the form `SYMBOL_interval`
//! and remembers it in the bounded search cache. `fetch` resolves the id
//! (cache first, then by splitting the id) and returns 24h ticker data.

use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

use super::params::{FetchParams, SearchParams};
use super::{upstream_failure, ToolContext, ToolOutput};
use crate::binance::{resolve_interval, sanitize_symbol};
use crate::error::Result;

/// A remembered search hit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchEntry {
    pub id: String,
    pub title: String,
    pub description: String,
    pub symbol: String,
    pub interval: String,
}

impl SearchEntry {
    pub fn new(symbol: &str, interval: &str, description: &str) -> Self {
        Self {
            id: result_id(symbol, interval),
            title: format!("{} ({})", symbol, interval),
            description: description.to_string(),
            symbol: symbol.to_string(),
            interval: interval.to_string(),
        }
    }
}

pub fn result_id(symbol: &str, interval: &str) -> String {
    format!("{}_{}", symbol.to_uppercase(), interval)
}

pub fn search(ctx: &Arc<ToolContext>, params: SearchParams) -> Result<ToolOutput> {
    params.validate()?;

    let mut tokens = params.query.split_whitespace();
    let symbol = tokens.next().map(sanitize_symbol).unwrap_or_default();
    if symbol.is_empty() {
        return Ok(ToolOutput::success(
            "Enter a valid trading pair, e.g. \"BTCUSDT\" or \"BTCUSDT 1h\".",
            json!({ "results": [] }),
        ));
    }

    let interval = resolve_interval(tokens.next());
    let entry = SearchEntry::new(
        &symbol,
        interval,
        "Use fetch for 24h market data or get_binance_klines for candles.",
    );
    ctx.search_cache.set(entry.id.clone(), entry.clone());

    let text = format!(
        "Found 1 match:\n1. {} - {}\n\nCall fetch with ID {} for a market summary.",
        entry.title, entry.description, entry.id
    );
    Ok(ToolOutput::success(text, json!({ "results": [entry] })))
}

pub async fn fetch(ctx: &Arc<ToolContext>, params: FetchParams) -> Result<ToolOutput> {
    params.validate()?;
    let id = params.id;

    let cached = ctx.search_cache.get(&id);
    let mut parts = id.splitn(2, '_');
    let (symbol_part, interval_part) = (parts.next(), parts.next());

    let symbol = sanitize_symbol(
        cached
            .as_ref()
            .map(|e| e.symbol.as_str())
            .or(symbol_part)
            .unwrap_or_default(),
    );
    let interval = match &cached {
        Some(entry) => entry.interval.clone(),
        None => resolve_interval(interval_part).to_string(),
    };

    if symbol.is_empty() {
        return Ok(ToolOutput::error(format!(
            "Cannot resolve ID {}; call search first to get a valid ID.",
            id
        )));
    }

    let ticker = match ctx.market.ticker_24hr(&symbol).await {
        Ok(ticker) => ticker,
        Err(e) => return Ok(upstream_failure("Fetching Binance ticker", e)),
    };

    if cached.is_none() {
        let mut entry = SearchEntry::new(&symbol, &interval, "Pair discovered through search.");
        entry.id = id.clone();
        ctx.search_cache.set(id.clone(), entry);
    }

    let or_unknown = |value: &str| {
        if value.is_empty() {
            "unknown".to_string()
        } else {
            value.to_string()
        }
    };
    let lines = [
        format!("Symbol: {}", symbol),
        format!("Interval: {}", interval),
        format!("Last price: {}", or_unknown(&ticker.last_price)),
        format!("24h change: {} %", or_unknown(&ticker.price_change_percent)),
        format!(
            "High/Low: {} / {}",
            or_unknown(&ticker.high_price),
            or_unknown(&ticker.low_price)
        ),
        format!("Volume: {}", or_unknown(&ticker.volume)),
    ];

    Ok(ToolOutput::success(
        lines.join("\n"),
        json!({
            "id": id,
            "symbol": symbol,
            "interval": interval,
            "ticker": ticker,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_id() {
        assert_eq!(result_id("btcusdt", "4h"), "BTCUSDT_4h");
    }

    #[test]
    fn test_entry_title() {
        let entry = SearchEntry::new("ETHUSDT", "1d", "desc");
        assert_eq!(entry.id, "ETHUSDT_1d");
        assert_eq!(entry.title, "ETHUSDT (1d)");
    }
}
