//! Market-data domain functions
//!
//! Every call takes a token from the limiter of its market category, then
//! runs the upstream fetch under the retry policy. Spot and futures each get
//! their own bucket, so calls against one never wait on the other.

use serde::Serialize;
use tracing::debug;

use crate::binance::{BinanceClient, Candle, Market, Ticker24hr, TimeRange};
use crate::config::CoordinationConfig;
use crate::coordination::{RateLimiter, RetryPolicy};
use crate::error::UpstreamError;

/// Funding is settled every eight hours on Binance perpetuals
const FUNDING_INTERVAL: &str = "8h";

/// Compact OHLCV row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OhlcvRow {
    pub t: i64,
    pub o: f64,
    pub h: f64,
    pub l: f64,
    pub c: f64,
    pub v: f64,
}

impl From<&Candle> for OhlcvRow {
    fn from(candle: &Candle) -> Self {
        Self {
            t: candle.open_time,
            o: candle.open_f64(),
            h: candle.high_f64(),
            l: candle.low_f64(),
            c: candle.close_f64(),
            v: candle.volume_f64(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OhlcvSeries {
    pub symbol: String,
    pub market: Market,
    pub timeframe: String,
    pub rows: Vec<OhlcvRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkPriceQuote {
    pub symbol: String,
    pub mark_price: f64,
    /// Exchange timestamp, ms
    pub t: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FundingRateRow {
    pub t: i64,
    pub rate: f64,
    pub interval: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FundingRateSeries {
    pub symbol: String,
    pub rows: Vec<FundingRateRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpenInterestRow {
    pub t: i64,
    pub oi: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpenInterestSeries {
    pub symbol: String,
    pub timeframe: String,
    pub rows: Vec<OpenInterestRow>,
}

/// Upstream access shared by all market tools
pub struct MarketData {
    client: BinanceClient,
    spot_limiter: RateLimiter,
    futures_limiter: RateLimiter,
    retry: RetryPolicy,
}

impl MarketData {
    pub fn new(client: BinanceClient, config: &CoordinationConfig) -> Self {
        Self {
            client,
            spot_limiter: config.rate_limiter(),
            futures_limiter: config.rate_limiter(),
            retry: config.retry_policy(),
        }
    }

    pub fn client(&self) -> &BinanceClient {
        &self.client
    }

    pub fn limiter(&self, market: Market) -> &RateLimiter {
        match market {
            Market::Spot => &self.spot_limiter,
            Market::Futures => &self.futures_limiter,
        }
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// OHLCV rows for a symbol
    ///
    /// # Arguments
    /// * `since` - Optional start time in ms
    pub async fn ohlcv(
        &self,
        market: Market,
        symbol: &str,
        timeframe: &str,
        limit: u32,
        since: Option<i64>,
    ) -> Result<OhlcvSeries, UpstreamError> {
        let range = TimeRange {
            start_time: since,
            end_time: None,
        };
        let candles = self.klines(market, symbol, timeframe, limit, range).await?;

        Ok(OhlcvSeries {
            symbol: symbol.to_string(),
            market,
            timeframe: timeframe.to_string(),
            rows: candles.iter().map(OhlcvRow::from).collect(),
        })
    }

    /// Current mark price of a perpetual
    pub async fn mark_price(&self, symbol: &str) -> Result<MarkPriceQuote, UpstreamError> {
        self.futures_limiter.acquire().await;
        let index = self
            .retry
            .run(|| self.client.get_premium_index(symbol))
            .await?;

        let mark_price = finite_positive(&index.mark_price, symbol)?;
        Ok(MarkPriceQuote {
            symbol: symbol.to_string(),
            mark_price,
            t: index.time,
        })
    }

    /// Funding rate history, oldest first
    pub async fn funding_rates(
        &self,
        symbol: &str,
        limit: u32,
    ) -> Result<FundingRateSeries, UpstreamError> {
        self.futures_limiter.acquire().await;
        let entries = self
            .retry
            .run(|| self.client.get_funding_rate_history(symbol, limit))
            .await?;

        let rows = entries
            .iter()
            .map(|entry| FundingRateRow {
                t: entry.funding_time,
                rate: entry.funding_rate.parse().unwrap_or(0.0),
                interval: FUNDING_INTERVAL,
            })
            .collect();

        Ok(FundingRateSeries {
            symbol: symbol.to_string(),
            rows,
        })
    }

    /// Open interest history in base-asset units
    pub async fn open_interest(
        &self,
        symbol: &str,
        timeframe: &str,
        limit: u32,
    ) -> Result<OpenInterestSeries, UpstreamError> {
        self.futures_limiter.acquire().await;
        let entries = self
            .retry
            .run(|| self.client.get_open_interest_history(symbol, timeframe, limit))
            .await?;

        let rows = entries
            .iter()
            .map(|entry| OpenInterestRow {
                t: entry.timestamp,
                oi: entry.sum_open_interest.parse().unwrap_or(0.0),
            })
            .collect();

        Ok(OpenInterestSeries {
            symbol: symbol.to_string(),
            timeframe: timeframe.to_string(),
            rows,
        })
    }

    /// Raw candles, oldest first
    pub async fn klines(
        &self,
        market: Market,
        symbol: &str,
        interval: &str,
        limit: u32,
        range: TimeRange,
    ) -> Result<Vec<Candle>, UpstreamError> {
        self.limiter(market).acquire().await;
        let candles = self
            .retry
            .run(|| self.client.get_klines(market, symbol, interval, limit, range))
            .await?;

        debug!(%market, symbol, interval, count = candles.len(), "Fetched klines");
        Ok(candles)
    }

    /// Latest traded price
    ///
    /// # Errors
    /// `ParseError` when the price is not a finite positive number
    pub async fn latest_price(&self, market: Market, symbol: &str) -> Result<f64, UpstreamError> {
        self.limiter(market).acquire().await;
        let ticker = self
            .retry
            .run(|| self.client.get_ticker_price(market, symbol))
            .await?;

        finite_positive(&ticker.price, symbol)
    }

    /// 24h rolling statistics for a spot symbol
    pub async fn ticker_24hr(&self, symbol: &str) -> Result<Ticker24hr, UpstreamError> {
        self.spot_limiter.acquire().await;
        self.retry
            .run(|| self.client.get_24hr_ticker(symbol))
            .await
    }
}

fn finite_positive(raw: &str, symbol: &str) -> Result<f64, UpstreamError> {
    match raw.trim().parse::<f64>() {
        Ok(price) if price.is_finite() && price > 0.0 => Ok(price),
        _ => Err(UpstreamError::ParseError(format!(
            "Invalid price returned for {}",
            symbol
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finite_positive() {
        assert_eq!(finite_positive("12.5", "X").unwrap(), 12.5);
        assert!(finite_positive("0", "X").is_err());
        assert!(finite_positive("NaN", "X").is_err());
        assert!(finite_positive("", "X").is_err());
    }

    #[test]
    fn test_ohlcv_row_from_candle() {
        let candle = Candle {
            open_time: 1,
            open: "1.0".to_string(),
            high: "2.0".to_string(),
            low: "0.5".to_string(),
            close: "1.5".to_string(),
            volume: "10".to_string(),
            close_time: 2,
        };
        let row = OhlcvRow::from(&candle);
        assert_eq!(row.t, 1);
        assert_eq!(row.h, 2.0);
        assert_eq!(row.v, 10.0);
    }

    #[test]
    fn test_separate_limiters_per_market() {
        let client = BinanceClient::with_base_urls(
            "http://127.0.0.1:1",
            "http://127.0.0.1:2",
            std::time::Duration::from_secs(1),
        )
        .unwrap();
        let market = MarketData::new(client, &CoordinationConfig::default());

        while market.limiter(Market::Spot).try_acquire() {}
        assert!(market.limiter(Market::Futures).try_acquire());
    }
}
