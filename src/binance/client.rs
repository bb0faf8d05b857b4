//! Binance HTTP Client
//!
//! HTTP client wrapper for the public Binance REST API (spot and USDⓈ-M
//! futures). Provides timeout configuration, user-agent headers and status
//! mapping. Throttling and retries live one layer up in `market`.

use crate::binance::types::{
    Candle, FundingRateEntry, Market, OpenInterestEntry, PremiumIndex, Ticker24hr, TickerPrice,
};
use crate::config::BinanceConfig;
use crate::error::UpstreamError;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

const USER_AGENT: &str = concat!("crypto-binance-provider/", env!("CARGO_PKG_VERSION"));

/// Optional time window for kline requests (milliseconds since epoch)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeRange {
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
}

/// Binance REST API HTTP client
///
/// Wraps reqwest::Client with one base URL per market. Cloning is cheap; the
/// underlying connection pool is shared.
#[derive(Clone)]
pub struct BinanceClient {
    /// HTTP client for making requests
    pub(crate) client: Client,
    /// Spot base URL (default: https://api.binance.com)
    pub(crate) spot_base_url: String,
    /// Futures base URL (default: https://fapi.binance.com)
    pub(crate) futures_base_url: String,
}

impl std::fmt::Debug for BinanceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BinanceClient")
            .field("spot_base_url", &self.spot_base_url)
            .field("futures_base_url", &self.futures_base_url)
            .finish()
    }
}

impl BinanceClient {
    /// Creates a client from configuration
    ///
    /// # Errors
    /// `InternalError` if the TLS backend cannot be initialized
    pub fn from_config(config: &BinanceConfig) -> Result<Self, UpstreamError> {
        Self::with_base_urls(
            &config.spot_base_url,
            &config.futures_base_url,
            config.timeout,
        )
    }

    /// Creates a client against explicit base URLs
    ///
    /// # Arguments
    /// * `spot_base_url` - Spot API root, e.g. a local mock server in tests
    /// * `futures_base_url` - Futures API root
    /// * `timeout` - Per-request timeout
    pub fn with_base_urls(
        spot_base_url: &str,
        futures_base_url: &str,
        timeout: Duration,
    ) -> Result<Self, UpstreamError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| {
                UpstreamError::InternalError(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            spot_base_url: spot_base_url.trim_end_matches('/').to_string(),
            futures_base_url: futures_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Returns the configured base URL for a market
    pub fn base_url(&self, market: Market) -> &str {
        match market {
            Market::Spot => &self.spot_base_url,
            Market::Futures => &self.futures_base_url,
        }
    }

    /// Issues a GET and decodes a JSON body
    ///
    /// Non-2xx responses are mapped through [`UpstreamError::from_status`]
    /// with the response body text attached.
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, UpstreamError> {
        tracing::debug!(url = %url, ?query, "Binance request");

        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::from_status(status.as_u16(), &body));
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Get candlestick/kline data
    ///
    /// Calls GET /api/v3/klines (spot) or /fapi/v1/klines (futures)
    ///
    /// # Arguments
    /// * `market` - Spot or futures
    /// * `symbol` - Trading pair symbol (e.g., "BTCUSDT")
    /// * `interval` - Kline interval (e.g., "1m", "5m", "1h", "1d")
    /// * `limit` - Number of klines to return
    /// * `range` - Optional start/end time filter
    ///
    /// # Returns
    /// * `Ok(Vec<Candle>)` - Candles, oldest first
    /// * `Err(UpstreamError)` - Network error, API error or malformed row
    pub async fn get_klines(
        &self,
        market: Market,
        symbol: &str,
        interval: &str,
        limit: u32,
        range: TimeRange,
    ) -> Result<Vec<Candle>, UpstreamError> {
        let path = match market {
            Market::Spot => "/api/v3/klines",
            Market::Futures => "/fapi/v1/klines",
        };
        let url = format!("{}{}", self.base_url(market), path);

        let mut query = vec![
            ("symbol", symbol.to_string()),
            ("interval", interval.to_string()),
            ("limit", limit.to_string()),
        ];
        if let Some(start) = range.start_time {
            query.push(("startTime", start.to_string()));
        }
        if let Some(end) = range.end_time {
            query.push(("endTime", end.to_string()));
        }

        let rows: Vec<Vec<Value>> = self.get_json(&url, &query).await?;
        rows.iter().map(|row| Candle::from_row(row)).collect()
    }

    /// Get latest price for a symbol
    ///
    /// Calls GET /api/v3/ticker/price (spot) or /fapi/v1/ticker/price (futures)
    pub async fn get_ticker_price(
        &self,
        market: Market,
        symbol: &str,
    ) -> Result<TickerPrice, UpstreamError> {
        let path = match market {
            Market::Spot => "/api/v3/ticker/price",
            Market::Futures => "/fapi/v1/ticker/price",
        };
        let url = format!("{}{}", self.base_url(market), path);
        self.get_json(&url, &[("symbol", symbol.to_string())]).await
    }

    /// Get 24-hour ticker price statistics
    ///
    /// Calls GET /api/v3/ticker/24hr
    pub async fn get_24hr_ticker(&self, symbol: &str) -> Result<Ticker24hr, UpstreamError> {
        let url = format!("{}/api/v3/ticker/24hr", self.spot_base_url);
        self.get_json(&url, &[("symbol", symbol.to_string())]).await
    }

    /// Get mark price and funding info for a perpetual
    ///
    /// Calls GET /fapi/v1/premiumIndex
    pub async fn get_premium_index(&self, symbol: &str) -> Result<PremiumIndex, UpstreamError> {
        let url = format!("{}/fapi/v1/premiumIndex", self.futures_base_url);
        self.get_json(&url, &[("symbol", symbol.to_string())]).await
    }

    /// Get funding rate history, oldest first
    ///
    /// Calls GET /fapi/v1/fundingRate
    pub async fn get_funding_rate_history(
        &self,
        symbol: &str,
        limit: u32,
    ) -> Result<Vec<FundingRateEntry>, UpstreamError> {
        let url = format!("{}/fapi/v1/fundingRate", self.futures_base_url);
        self.get_json(
            &url,
            &[("symbol", symbol.to_string()), ("limit", limit.to_string())],
        )
        .await
    }

    /// Get open interest statistics
    ///
    /// Calls GET /futures/data/openInterestHist
    ///
    /// # Arguments
    /// * `period` - Aggregation period ("5m", "15m", "1h", "4h", "1d")
    pub async fn get_open_interest_history(
        &self,
        symbol: &str,
        period: &str,
        limit: u32,
    ) -> Result<Vec<OpenInterestEntry>, UpstreamError> {
        let url = format!("{}/futures/data/openInterestHist", self.futures_base_url);
        self.get_json(
            &url,
            &[
                ("symbol", symbol.to_string()),
                ("period", period.to_string()),
                ("limit", limit.to_string()),
            ],
        )
        .await
    }
}
