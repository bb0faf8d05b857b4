//! Binance API Client
//!
//! This module contains the HTTP client for Binance API integration plus
//! symbol and interval normalization shared by the tools.

pub mod client;
pub mod types;

// Re-export commonly used types
pub use client::{BinanceClient, TimeRange};
pub use types::{
    Candle, FundingRateEntry, Market, OpenInterestEntry, PremiumIndex, Ticker24hr, TickerPrice,
};

/// Kline intervals accepted by Binance
pub const BINANCE_INTERVALS: [&str; 15] = [
    "1m", "3m", "5m", "15m", "30m", "1h", "2h", "4h", "6h", "8h", "12h", "1d", "3d", "1w", "1M",
];

/// Interval used when a caller gives none or an unknown one
pub const DEFAULT_INTERVAL: &str = "1h";

const MAX_SYMBOL_LEN: usize = 20;

/// Uppercases, strips everything but `[A-Z0-9]` and truncates to 20 chars
pub fn sanitize_symbol(value: &str) -> String {
    value
        .to_uppercase()
        .chars()
        .filter(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        .take(MAX_SYMBOL_LEN)
        .collect()
}

/// Sanitizes a perpetual symbol, dropping a trailing `_PERP` first
///
/// Returns `None` when nothing usable remains.
pub fn normalize_futures_symbol(value: &str) -> Option<String> {
    let trimmed = value.trim();
    let split = trimmed
        .len()
        .checked_sub(5)
        .filter(|&at| trimmed.is_char_boundary(at));
    let base = match split {
        Some(at) if trimmed[at..].eq_ignore_ascii_case("_PERP") => &trimmed[..at],
        _ => trimmed,
    };

    let symbol = sanitize_symbol(base);
    (!symbol.is_empty()).then_some(symbol)
}

/// True if `interval` is one of [`BINANCE_INTERVALS`] (case-sensitive: "1m" vs "1M")
pub fn is_valid_interval(interval: &str) -> bool {
    BINANCE_INTERVALS.contains(&interval)
}

/// Case-insensitive interval lookup falling back to [`DEFAULT_INTERVAL`]
///
/// An exact match wins so "1M" (month) is never folded into "1m".
pub fn resolve_interval(input: Option<&str>) -> &'static str {
    let Some(raw) = input.map(str::trim).filter(|s| !s.is_empty()) else {
        return DEFAULT_INTERVAL;
    };

    BINANCE_INTERVALS
        .iter()
        .find(|candidate| **candidate == raw)
        .or_else(|| {
            BINANCE_INTERVALS
                .iter()
                .find(|candidate| candidate.eq_ignore_ascii_case(raw))
        })
        .copied()
        .unwrap_or(DEFAULT_INTERVAL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_symbol() {
        assert_eq!(sanitize_symbol("btc/usdt"), "BTCUSDT");
        assert_eq!(sanitize_symbol(" eth-usdt "), "ETHUSDT");
        assert_eq!(sanitize_symbol("A".repeat(30).as_str()).len(), 20);
        assert_eq!(sanitize_symbol("!!!"), "");
    }

    #[test]
    fn test_normalize_futures_symbol() {
        assert_eq!(normalize_futures_symbol("BTCUSDT_PERP").as_deref(), Some("BTCUSDT"));
        assert_eq!(normalize_futures_symbol("solusdt_perp").as_deref(), Some("SOLUSDT"));
        assert_eq!(normalize_futures_symbol("ETHUSDT").as_deref(), Some("ETHUSDT"));
        assert_eq!(normalize_futures_symbol("_PERP"), None);
    }

    #[test]
    fn test_resolve_interval() {
        assert_eq!(resolve_interval(None), "1h");
        assert_eq!(resolve_interval(Some("4H")), "4h");
        assert_eq!(resolve_interval(Some("1M")), "1M");
        assert_eq!(resolve_interval(Some("1m")), "1m");
        assert_eq!(resolve_interval(Some("7x")), "1h");
    }

    #[test]
    fn test_is_valid_interval() {
        assert!(is_valid_interval("15m"));
        assert!(!is_valid_interval("15M"));
    }
}
