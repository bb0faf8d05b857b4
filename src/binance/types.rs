//! Binance API Type Definitions
//!
//! Response shapes for the spot and USDⓈ-M futures REST endpoints used by the
//! market-data tools. Prices stay as strings, the way Binance sends them, so
//! pass-through output keeps full precision.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::UpstreamError;

/// Which Binance market a request targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Market {
    Spot,
    Futures,
}

impl Market {
    pub fn as_str(&self) -> &'static str {
        match self {
            Market::Spot => "spot",
            Market::Futures => "futures",
        }
    }
}

impl std::fmt::Display for Market {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One candlestick
///
/// Parsed from the 12-element kline row:
/// `[open_time, open, high, low, close, volume, close_time, quote_volume, trades, taker_buy_base, taker_buy_quote, ignore]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candle {
    pub open_time: i64,
    pub open: String,
    pub high: String,
    pub low: String,
    pub close: String,
    pub volume: String,
    pub close_time: i64,
}

impl Candle {
    /// Builds a candle from a raw kline row
    ///
    /// # Errors
    /// `ParseError` if the row is too short or a field has the wrong JSON type
    pub fn from_row(row: &[Value]) -> Result<Self, UpstreamError> {
        if row.len() < 7 {
            return Err(UpstreamError::ParseError(format!(
                "Kline row has {} fields, expected at least 7",
                row.len()
            )));
        }

        Ok(Self {
            open_time: row_i64(row, 0)?,
            open: row_str(row, 1)?,
            high: row_str(row, 2)?,
            low: row_str(row, 3)?,
            close: row_str(row, 4)?,
            volume: row_str(row, 5)?,
            close_time: row_i64(row, 6)?,
        })
    }

    pub fn open_f64(&self) -> f64 {
        parse_price(&self.open)
    }

    pub fn high_f64(&self) -> f64 {
        parse_price(&self.high)
    }

    pub fn low_f64(&self) -> f64 {
        parse_price(&self.low)
    }

    pub fn close_f64(&self) -> f64 {
        parse_price(&self.close)
    }

    pub fn volume_f64(&self) -> f64 {
        parse_price(&self.volume)
    }
}

/// Lenient decimal-string parse; malformed input yields NaN
pub fn parse_price(value: &str) -> f64 {
    value.trim().parse::<f64>().unwrap_or(f64::NAN)
}

fn row_i64(row: &[Value], index: usize) -> Result<i64, UpstreamError> {
    row[index]
        .as_i64()
        .or_else(|| row[index].as_str().and_then(|s| s.parse().ok()))
        .ok_or_else(|| {
            UpstreamError::ParseError(format!("Kline field {} is not an integer", index))
        })
}

fn row_str(row: &[Value], index: usize) -> Result<String, UpstreamError> {
    match &row[index] {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(UpstreamError::ParseError(format!(
            "Kline field {} is not a decimal string",
            index
        ))),
    }
}

/// Response from `/api/v3/ticker/price` and `/fapi/v1/ticker/price`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickerPrice {
    /// Trading pair symbol (e.g., "BTCUSDT")
    pub symbol: String,
    /// Current price as string to preserve precision
    pub price: String,
}

/// Response from `/api/v3/ticker/24hr`
///
/// Missing fields default to empty so partial payloads still pass through.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Ticker24hr {
    pub symbol: String,
    pub price_change: String,
    pub price_change_percent: String,
    pub weighted_avg_price: String,
    pub prev_close_price: String,
    pub last_price: String,
    pub last_qty: String,
    pub bid_price: String,
    pub ask_price: String,
    pub open_price: String,
    pub high_price: String,
    pub low_price: String,
    pub volume: String,
    pub quote_volume: String,
    pub open_time: i64,
    pub close_time: i64,
    pub first_id: i64,
    pub last_id: i64,
    /// Total number of trades
    pub count: i64,
}

/// Response from `/fapi/v1/premiumIndex`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PremiumIndex {
    pub symbol: String,
    pub mark_price: String,
    #[serde(default)]
    pub index_price: Option<String>,
    #[serde(default)]
    pub last_funding_rate: Option<String>,
    #[serde(default)]
    pub next_funding_time: Option<i64>,
    pub time: i64,
}

/// One entry from `/fapi/v1/fundingRate`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundingRateEntry {
    pub symbol: String,
    pub funding_rate: String,
    pub funding_time: i64,
    #[serde(default)]
    pub mark_price: Option<String>,
}

/// One entry from `/futures/data/openInterestHist`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenInterestEntry {
    pub symbol: String,
    pub sum_open_interest: String,
    pub sum_open_interest_value: String,
    pub timestamp: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_candle_from_row() {
        let row = json!([
            1_699_564_800_000i64,
            "35000.10",
            "35100.00",
            "34900.00",
            "35050.50",
            "123.45",
            1_699_568_399_999i64,
            "4321000.00",
            1500,
            "60.0",
            "2100000.00",
            "0"
        ]);
        let candle = Candle::from_row(row.as_array().unwrap()).unwrap();

        assert_eq!(candle.open_time, 1_699_564_800_000);
        assert_eq!(candle.close, "35050.50");
        assert_eq!(candle.close_time, 1_699_568_399_999);
        assert!((candle.high_f64() - 35100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_candle_short_row() {
        let row = json!([1, "1", "2"]);
        assert!(Candle::from_row(row.as_array().unwrap()).is_err());
    }

    #[test]
    fn test_ticker_24hr_partial_payload() {
        let ticker: Ticker24hr =
            serde_json::from_str(r#"{"symbol":"BTCUSDT","lastPrice":"65000.00"}"#).unwrap();
        assert_eq!(ticker.last_price, "65000.00");
        assert!(ticker.volume.is_empty());
    }

    #[test]
    fn test_premium_index_deserialization() {
        let json = r#"{"symbol":"BTCUSDT","markPrice":"65010.1","indexPrice":"65000.0","lastFundingRate":"0.0001","nextFundingTime":1699574400000,"interestRate":"0.0001","time":1699564800000}"#;
        let index: PremiumIndex = serde_json::from_str(json).unwrap();
        assert_eq!(index.mark_price, "65010.1");
        assert_eq!(index.time, 1_699_564_800_000);
    }

    #[test]
    fn test_parse_price_malformed() {
        assert!(parse_price("abc").is_nan());
        assert_eq!(parse_price(" 1.5 "), 1.5);
    }
}
