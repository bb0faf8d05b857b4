//! Tool argument types
//!
//! Each struct doubles as the tool's JSON Schema (via `schemars`) and its
//! deserialization target. Shape errors come from serde; `validate` adds the
//! numeric ranges and non-empty checks serde cannot express.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt::Display;

use crate::analysis::Side;
use crate::binance::{sanitize_symbol, Market};
use crate::error::{ProviderError, Result};
use crate::state::{JobKind, RiskPolicyUpdate};

const DEFAULT_SYMBOL: &str = "SOLUSDT";

fn default_symbol() -> String {
    DEFAULT_SYMBOL.to_string()
}

/// Fails with a validation error naming `field` unless `min <= value <= max`
pub(crate) fn check_range<T>(field: &str, value: T, min: T, max: T) -> Result<()>
where
    T: PartialOrd + Display + Copy,
{
    if value < min || value > max {
        return Err(ProviderError::Validation(format!(
            "{} must be between {} and {}, got {}",
            field, min, max, value
        )));
    }
    Ok(())
}

/// Fails unless `0 < value <= max` (or just `value > 0` when `max` is `None`)
pub(crate) fn check_positive(field: &str, value: f64, max: Option<f64>) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ProviderError::Validation(format!(
            "{} must be a positive number, got {}",
            field, value
        )));
    }
    if let Some(max) = max {
        if value > max {
            return Err(ProviderError::Validation(format!(
                "{} must be at most {}, got {}",
                field, max, value
            )));
        }
    }
    Ok(())
}

/// Sanitized symbol, or a validation error if nothing usable remains
pub(crate) fn require_symbol(field: &str, raw: &str) -> Result<String> {
    let symbol = sanitize_symbol(raw);
    if symbol.is_empty() {
        return Err(ProviderError::Validation(format!(
            "{} is required (e.g. BTCUSDT)",
            field
        )));
    }
    Ok(symbol)
}

fn require_non_empty(field: &str, raw: &str) -> Result<()> {
    if raw.trim().is_empty() {
        return Err(ProviderError::Validation(format!("{} is required", field)));
    }
    Ok(())
}

fn check_time(field: &str, value: Option<i64>) -> Result<()> {
    match value {
        Some(ms) if ms < 0 => Err(ProviderError::Validation(format!(
            "{} must be non-negative, got {}",
            field, ms
        ))),
        _ => Ok(()),
    }
}

/// Binance kline interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum KlineInterval {
    #[serde(rename = "1m")]
    Min1,
    #[serde(rename = "3m")]
    Min3,
    #[serde(rename = "5m")]
    Min5,
    #[serde(rename = "15m")]
    Min15,
    #[serde(rename = "30m")]
    Min30,
    #[serde(rename = "1h")]
    Hour1,
    #[serde(rename = "2h")]
    Hour2,
    #[serde(rename = "4h")]
    Hour4,
    #[serde(rename = "6h")]
    Hour6,
    #[serde(rename = "8h")]
    Hour8,
    #[serde(rename = "12h")]
    Hour12,
    #[serde(rename = "1d")]
    Day1,
    #[serde(rename = "3d")]
    Day3,
    #[serde(rename = "1w")]
    Week1,
    #[serde(rename = "1M")]
    Month1,
}

impl KlineInterval {
    pub fn as_str(&self) -> &'static str {
        match self {
            KlineInterval::Min1 => "1m",
            KlineInterval::Min3 => "3m",
            KlineInterval::Min5 => "5m",
            KlineInterval::Min15 => "15m",
            KlineInterval::Min30 => "30m",
            KlineInterval::Hour1 => "1h",
            KlineInterval::Hour2 => "2h",
            KlineInterval::Hour4 => "4h",
            KlineInterval::Hour6 => "6h",
            KlineInterval::Hour8 => "8h",
            KlineInterval::Hour12 => "12h",
            KlineInterval::Day1 => "1d",
            KlineInterval::Day3 => "3d",
            KlineInterval::Week1 => "1w",
            KlineInterval::Month1 => "1M",
        }
    }
}

/// Candle timeframes offered by `get_ohlcv`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum Timeframe {
    #[serde(rename = "1m")]
    Min1,
    #[serde(rename = "5m")]
    Min5,
    #[serde(rename = "15m")]
    Min15,
    #[default]
    #[serde(rename = "1h")]
    Hour1,
    #[serde(rename = "4h")]
    Hour4,
    #[serde(rename = "1d")]
    Day1,
}

impl Timeframe {
    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::Min1 => "1m",
            Timeframe::Min5 => "5m",
            Timeframe::Min15 => "15m",
            Timeframe::Hour1 => "1h",
            Timeframe::Hour4 => "4h",
            Timeframe::Day1 => "1d",
        }
    }
}

/// Aggregation periods for open-interest statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum OpenInterestPeriod {
    #[serde(rename = "5m")]
    Min5,
    #[serde(rename = "15m")]
    Min15,
    #[default]
    #[serde(rename = "1h")]
    Hour1,
    #[serde(rename = "4h")]
    Hour4,
    #[serde(rename = "1d")]
    Day1,
}

impl OpenInterestPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            OpenInterestPeriod::Min5 => "5m",
            OpenInterestPeriod::Min15 => "15m",
            OpenInterestPeriod::Hour1 => "1h",
            OpenInterestPeriod::Hour4 => "4h",
            OpenInterestPeriod::Day1 => "1d",
        }
    }
}

/// Market selector for the analysis tools
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Venue {
    Spot,
    #[default]
    Perp,
}

impl Venue {
    pub fn as_str(&self) -> &'static str {
        match self {
            Venue::Spot => "spot",
            Venue::Perp => "perp",
        }
    }

    pub fn market(&self) -> Market {
        match self {
            Venue::Spot => Market::Spot,
            Venue::Perp => Market::Futures,
        }
    }
}

/// Tools that take no arguments
#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct NoParams {}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OhlcvParams {
    #[serde(default = "OhlcvParams::default_market")]
    #[schemars(description = "Market type: spot or futures (default futures)")]
    pub market: Market,

    #[serde(default = "default_symbol")]
    #[schemars(description = "Trading pair symbol, e.g. SOLUSDT")]
    pub symbol: String,

    #[serde(default)]
    #[schemars(description = "Candle timeframe (default 1h)")]
    pub timeframe: Timeframe,

    #[serde(default = "OhlcvParams::default_limit")]
    #[schemars(description = "Number of candles (10-1500, default 500)")]
    pub limit: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(description = "Start time in milliseconds since epoch")]
    pub since: Option<i64>,
}

impl OhlcvParams {
    fn default_market() -> Market {
        Market::Futures
    }

    fn default_limit() -> u32 {
        500
    }

    pub fn validate(&self) -> Result<()> {
        check_range("limit", self.limit, 10, 1500)?;
        check_time("since", self.since)
    }
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SymbolParams {
    #[serde(default = "default_symbol")]
    #[schemars(description = "Perpetual symbol, e.g. SOLUSDT")]
    pub symbol: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FundingRateParams {
    #[serde(default = "default_symbol")]
    #[schemars(description = "Perpetual symbol, e.g. SOLUSDT")]
    pub symbol: String,

    #[serde(default = "FundingRateParams::default_limit")]
    #[schemars(description = "Number of funding periods (1-1000, default 100)")]
    pub limit: u32,
}

impl FundingRateParams {
    fn default_limit() -> u32 {
        100
    }

    pub fn validate(&self) -> Result<()> {
        check_range("limit", self.limit, 1, 1000)
    }
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OpenInterestParams {
    #[serde(default = "default_symbol")]
    #[schemars(description = "Perpetual symbol, e.g. SOLUSDT")]
    pub symbol: String,

    #[serde(default)]
    #[schemars(description = "Aggregation period (default 1h)")]
    pub timeframe: OpenInterestPeriod,

    #[serde(default = "OpenInterestParams::default_limit")]
    #[schemars(description = "Number of data points (1-1000, default 200)")]
    pub limit: u32,
}

impl OpenInterestParams {
    fn default_limit() -> u32 {
        200
    }

    pub fn validate(&self) -> Result<()> {
        check_range("limit", self.limit, 1, 1000)
    }
}

/// Arguments for both kline tools
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct KlinesParams {
    #[schemars(description = "Trading pair symbol, e.g. BTCUSDT")]
    pub symbol: String,

    #[schemars(description = "Kline interval")]
    pub interval: KlineInterval,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(description = "Number of candles (1-1000)")]
    pub limit: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(description = "Start time in milliseconds since epoch")]
    pub start_time: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(description = "End time in milliseconds since epoch")]
    pub end_time: Option<i64>,
}

impl KlinesParams {
    pub fn validate(&self) -> Result<()> {
        require_non_empty("symbol", &self.symbol)?;
        if let Some(limit) = self.limit {
            check_range("limit", limit, 1, 1000)?;
        }
        check_time("startTime", self.start_time)?;
        check_time("endTime", self.end_time)
    }
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PriceActionParams {
    #[schemars(description = "Trading pair symbol, e.g. BTCUSDT")]
    pub symbol: String,

    #[schemars(description = "Kline interval")]
    pub interval: KlineInterval,

    #[serde(default = "PriceActionParams::default_lookback")]
    #[schemars(description = "Candles to analyze (50-1000, default 180)")]
    pub lookback: u32,

    #[serde(default)]
    #[schemars(description = "spot or perp (default perp)")]
    pub market: Venue,
}

impl PriceActionParams {
    fn default_lookback() -> u32 {
        180
    }

    pub fn validate(&self) -> Result<()> {
        require_non_empty("symbol", &self.symbol)?;
        check_range("lookback", self.lookback, 50, 1000)
    }
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DraftOrderParams {
    #[schemars(description = "Trading pair symbol, e.g. BTCUSDT")]
    pub symbol: String,

    #[schemars(description = "BUY or SELL")]
    pub side: Side,

    #[schemars(description = "Position size in USD (> 0)")]
    pub notional_usd: f64,

    #[schemars(description = "Stop loss distance in percent (0-50]")]
    pub stop_loss_pct: f64,

    #[schemars(description = "Take profit distance in percent (0-200]")]
    pub take_profit_pct: f64,

    #[schemars(description = "Leverage multiplier (0-125]")]
    pub leverage: f64,

    #[schemars(description = "Account equity in USD (> 0)")]
    pub equity_usd: f64,

    #[serde(default)]
    #[schemars(description = "spot or perp (default perp)")]
    pub market: Venue,
}

impl DraftOrderParams {
    pub fn validate(&self) -> Result<()> {
        require_non_empty("symbol", &self.symbol)?;
        check_positive("notionalUsd", self.notional_usd, None)?;
        check_positive("stopLossPct", self.stop_loss_pct, Some(50.0))?;
        check_positive("takeProfitPct", self.take_profit_pct, Some(200.0))?;
        check_positive("leverage", self.leverage, Some(125.0))?;
        check_positive("equityUsd", self.equity_usd, None)
    }
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SearchParams {
    #[schemars(description = "Symbol and optional interval, e.g. \"BTCUSDT 4h\"")]
    pub query: String,
}

impl SearchParams {
    pub fn validate(&self) -> Result<()> {
        require_non_empty("query", &self.query)
    }
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct FetchParams {
    #[schemars(description = "Identifier returned by the search tool")]
    pub id: String,
}

impl FetchParams {
    pub fn validate(&self) -> Result<()> {
        require_non_empty("id", &self.id)
    }
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RequestConfirmationParams {
    #[schemars(description = "Order draft or other payload awaiting approval")]
    pub draft: Map<String, Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(description = "Why confirmation is needed")]
    pub reason: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(description = "Ticket lifetime in seconds (30-86400, default 3600)")]
    pub ttl_seconds: Option<u64>,
}

impl RequestConfirmationParams {
    pub fn validate(&self) -> Result<()> {
        if let Some(reason) = &self.reason {
            require_non_empty("reason", reason)?;
        }
        if let Some(ttl) = self.ttl_seconds {
            check_range(
                "ttlSeconds",
                ttl,
                crate::state::confirmations::MIN_TTL_SECONDS,
                crate::state::confirmations::MAX_TTL_SECONDS,
            )?;
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GetConfirmationParams {
    #[schemars(description = "Confirmation ticket ID")]
    pub confirmation_id: String,
}

impl GetConfirmationParams {
    pub fn validate(&self) -> Result<()> {
        if self.confirmation_id.chars().count() < 6 {
            return Err(ProviderError::Validation(
                "confirmationId must be at least 6 characters".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ScheduleTaskParams {
    #[schemars(description = "Cron expression, 5 fields or 6 with leading seconds")]
    pub cron: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(description = "Free-form description")]
    pub description: Option<String>,

    #[serde(flatten)]
    pub kind: JobKind,
}

impl ScheduleTaskParams {
    pub fn validate(&self) -> Result<()> {
        require_non_empty("cron", &self.cron)?;
        match &self.kind {
            JobKind::Analysis {
                symbol,
                interval,
                lookback,
            } => {
                require_non_empty("symbol", symbol)?;
                require_non_empty("interval", interval)?;
                check_range("lookback", *lookback, 50, 1000)
            }
            JobKind::Alert { symbol, condition } => {
                require_non_empty("symbol", symbol)?;
                check_positive("condition.price", condition.price, None)
            }
        }
    }
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CancelJobParams {
    #[schemars(description = "Job ID returned by schedule_task")]
    pub job_id: String,
}

impl CancelJobParams {
    pub fn validate(&self) -> Result<()> {
        require_non_empty("jobId", &self.job_id)
    }
}

/// Range checks for `set_risk_policy`
pub fn validate_risk_update(update: &RiskPolicyUpdate) -> Result<()> {
    if let Some(pct) = update.per_trade_max_risk_pct {
        check_range("perTradeMaxRiskPct", pct, 0.1, 20.0)?;
    }
    if let Some(leverage) = update.max_leverage {
        check_range("maxLeverage", leverage, 1.0, 100.0)?;
    }
    if let Some(pct) = update.daily_drawdown_stop_pct {
        check_range("dailyDrawdownStopPct", pct, 0.5, 50.0)?;
    }
    if let Some(allowlist) = &update.allowlist {
        if allowlist.iter().any(|s| s.is_empty()) {
            return Err(ProviderError::Validation(
                "allowlist entries must be non-empty".to_string(),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ohlcv_defaults() {
        let params: OhlcvParams = serde_json::from_value(json!({})).unwrap();
        assert_eq!(params.market, Market::Futures);
        assert_eq!(params.symbol, "SOLUSDT");
        assert_eq!(params.timeframe, Timeframe::Hour1);
        assert_eq!(params.limit, 500);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_ohlcv_limit_range() {
        let params: OhlcvParams = serde_json::from_value(json!({ "limit": 5 })).unwrap();
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_interval_month_vs_minute() {
        let month: KlineInterval = serde_json::from_value(json!("1M")).unwrap();
        let minute: KlineInterval = serde_json::from_value(json!("1m")).unwrap();
        assert_eq!(month.as_str(), "1M");
        assert_eq!(minute.as_str(), "1m");
        assert!(serde_json::from_value::<KlineInterval>(json!("2m")).is_err());
    }

    #[test]
    fn test_schedule_task_analysis() {
        let params: ScheduleTaskParams = serde_json::from_value(json!({
            "cron": "*/5 * * * *",
            "kind": "analysis",
            "symbol": "btcusdt",
            "interval": "1h",
            "lookback": 100
        }))
        .unwrap();
        assert!(params.validate().is_ok());
        assert_eq!(params.kind.name(), "analysis");
    }

    #[test]
    fn test_schedule_task_alert_needs_positive_price() {
        let params: ScheduleTaskParams = serde_json::from_value(json!({
            "cron": "0 * * * *",
            "kind": "alert",
            "symbol": "ETHUSDT",
            "condition": { "type": "crossesBelow", "price": 0 }
        }))
        .unwrap();
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_draft_order_bounds() {
        let mut params: DraftOrderParams = serde_json::from_value(json!({
            "symbol": "BTCUSDT",
            "side": "BUY",
            "notionalUsd": 1000,
            "stopLossPct": 2,
            "takeProfitPct": 4,
            "leverage": 3,
            "equityUsd": 10000
        }))
        .unwrap();
        assert_eq!(params.market, Venue::Perp);
        assert!(params.validate().is_ok());

        params.stop_loss_pct = 51.0;
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_confirmation_ttl_bounds() {
        let params: RequestConfirmationParams =
            serde_json::from_value(json!({ "draft": {}, "ttlSeconds": 10 })).unwrap();
        assert!(params.validate().is_err());

        let params: RequestConfirmationParams =
            serde_json::from_value(json!({ "draft": {}, "reason": "   " })).unwrap();
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_risk_update_bounds() {
        let update = RiskPolicyUpdate {
            max_leverage: Some(150.0),
            ..Default::default()
        };
        assert!(validate_risk_update(&update).is_err());
        assert!(validate_risk_update(&RiskPolicyUpdate::default()).is_ok());
    }
}
