//! Market-data and analysis tool handlers

use serde_json::{json, Value};
use std::sync::Arc;

use super::params::{
    require_symbol, DraftOrderParams, FundingRateParams, KlinesParams, OhlcvParams,
    OpenInterestParams, PriceActionParams, SymbolParams,
};
use super::{iso_millis, upstream_failure, SearchEntry, ToolContext, ToolOutput};
use crate::analysis::{self, OrderRequest};
use crate::binance::{normalize_futures_symbol, Candle, Market, TimeRange};
use crate::error::{ProviderError, Result};

const SPOT_KLINES_DEFAULT_LIMIT: u32 = 50;
const PERP_KLINES_DEFAULT_LIMIT: u32 = 120;
const PREVIEW_CANDLES: usize = 5;

pub async fn get_ohlcv(ctx: &Arc<ToolContext>, params: OhlcvParams) -> Result<ToolOutput> {
    params.validate()?;
    let symbol = require_symbol("symbol", &params.symbol)?;

    let series = match ctx
        .market
        .ohlcv(
            params.market,
            &symbol,
            params.timeframe.as_str(),
            params.limit,
            params.since,
        )
        .await
    {
        Ok(series) => series,
        Err(e) => return Ok(upstream_failure("Fetching OHLCV", e)),
    };

    let text = format!(
        "{} {} {}: {} candles",
        series.symbol,
        series.market,
        series.timeframe,
        series.rows.len()
    );
    Ok(ToolOutput::success(text, serde_json::to_value(&series)?))
}

pub async fn get_mark_price(ctx: &Arc<ToolContext>, params: SymbolParams) -> Result<ToolOutput> {
    let symbol = require_symbol("symbol", &params.symbol)?;

    match ctx.market.mark_price(&symbol).await {
        Ok(quote) => {
            let text = format!("{} mark price: {}", quote.symbol, quote.mark_price);
            Ok(ToolOutput::success(text, serde_json::to_value(&quote)?))
        }
        Err(e) => Ok(upstream_failure("Fetching mark price", e)),
    }
}

pub async fn get_funding_rate(
    ctx: &Arc<ToolContext>,
    params: FundingRateParams,
) -> Result<ToolOutput> {
    params.validate()?;
    let symbol = require_symbol("symbol", &params.symbol)?;

    match ctx.market.funding_rates(&symbol, params.limit).await {
        Ok(series) => {
            let latest = series
                .rows
                .last()
                .map(|row| format!(", latest {}", row.rate))
                .unwrap_or_default();
            let text = format!(
                "{} funding rates: {} periods{}",
                series.symbol,
                series.rows.len(),
                latest
            );
            Ok(ToolOutput::success(text, serde_json::to_value(&series)?))
        }
        Err(e) => Ok(upstream_failure("Fetching funding rates", e)),
    }
}

pub async fn get_open_interest(
    ctx: &Arc<ToolContext>,
    params: OpenInterestParams,
) -> Result<ToolOutput> {
    params.validate()?;
    let symbol = require_symbol("symbol", &params.symbol)?;

    match ctx
        .market
        .open_interest(&symbol, params.timeframe.as_str(), params.limit)
        .await
    {
        Ok(series) => {
            let text = format!(
                "{} open interest ({}): {} points",
                series.symbol,
                series.timeframe,
                series.rows.len()
            );
            Ok(ToolOutput::success(text, serde_json::to_value(&series)?))
        }
        Err(e) => Ok(upstream_failure("Fetching open interest", e)),
    }
}

/// Spot klines; remembers a search entry so `fetch` can resolve the id later
pub async fn get_binance_klines(
    ctx: &Arc<ToolContext>,
    params: KlinesParams,
) -> Result<ToolOutput> {
    params.validate()?;
    let symbol = require_symbol("symbol", &params.symbol)?;
    let interval = params.interval.as_str();
    let limit = params.limit.unwrap_or(SPOT_KLINES_DEFAULT_LIMIT);
    let range = TimeRange {
        start_time: params.start_time,
        end_time: params.end_time,
    };

    let candles = match ctx
        .market
        .klines(Market::Spot, &symbol, interval, limit, range)
        .await
    {
        Ok(candles) => candles,
        Err(e) => return Ok(upstream_failure("Fetching Binance klines", e)),
    };

    let Some(summary) = kline_summary(&candles, limit) else {
        return Ok(ToolOutput::text(format!(
            "Binance returned no klines for {} ({}).",
            symbol, interval
        )));
    };

    let entry = SearchEntry::new(
        &symbol,
        interval,
        "Latest kline summary; use fetch for 24h market data.",
    );
    ctx.search_cache.set(entry.id.clone(), entry.clone());

    let text = kline_text(&symbol, interval, &candles, limit, "Last 5 candles:");
    Ok(ToolOutput::success(
        text,
        json!({
            "id": entry.id,
            "symbol": symbol,
            "interval": interval,
            "candles": candles,
            "summary": summary,
        }),
    ))
}

pub async fn get_binance_perp_klines(
    ctx: &Arc<ToolContext>,
    params: KlinesParams,
) -> Result<ToolOutput> {
    params.validate()?;
    let symbol = normalize_futures_symbol(&params.symbol).ok_or_else(|| {
        ProviderError::Validation(format!("Invalid futures symbol: {}", params.symbol))
    })?;
    let interval = params.interval.as_str();
    let limit = params.limit.unwrap_or(PERP_KLINES_DEFAULT_LIMIT);
    let range = TimeRange {
        start_time: params.start_time,
        end_time: params.end_time,
    };

    let candles = match ctx
        .market
        .klines(Market::Futures, &symbol, interval, limit, range)
        .await
    {
        Ok(candles) => candles,
        Err(e) => return Ok(upstream_failure("Fetching Binance perpetual klines", e)),
    };

    let Some(summary) = kline_summary(&candles, limit) else {
        return Ok(ToolOutput::text(format!(
            "Binance returned no perpetual klines for {} ({}).",
            symbol, interval
        )));
    };

    let text = kline_text(
        &symbol,
        interval,
        &candles,
        limit,
        "Last 5 perpetual candles:",
    );
    Ok(ToolOutput::success(
        text,
        json!({
            "symbol": symbol,
            "interval": interval,
            "market": "USD-M Perpetual",
            "candles": candles,
            "summary": summary,
        }),
    ))
}

fn kline_summary(candles: &[Candle], limit: u32) -> Option<Value> {
    let (first, last) = (candles.first()?, candles.last()?);
    Some(json!({
        "count": candles.len(),
        "limit": limit,
        "openTime": iso_millis(first.open_time),
        "closeTime": iso_millis(last.close_time),
        "lastCandle": {
            "open": last.open,
            "high": last.high,
            "low": last.low,
            "close": last.close,
            "volume": last.volume,
            "closeTime": iso_millis(last.close_time),
        },
    }))
}

fn kline_text(symbol: &str, interval: &str, candles: &[Candle], limit: u32, heading: &str) -> String {
    let (Some(first), Some(last)) = (candles.first(), candles.last()) else {
        return String::new();
    };

    let preview: Vec<String> = candles
        .iter()
        .skip(candles.len().saturating_sub(PREVIEW_CANDLES))
        .map(|c| {
            format!(
                "{} O:{} H:{} L:{} C:{} V:{}",
                iso_millis(c.close_time),
                c.open,
                c.high,
                c.low,
                c.close,
                c.volume
            )
        })
        .collect();

    let mut lines = vec![
        format!("Symbol: {}", symbol),
        format!("Interval: {}", interval),
        format!("Candles: {} (limit={})", candles.len(), limit),
        format!(
            "Range: {} → {}",
            iso_millis(first.open_time),
            iso_millis(last.close_time)
        ),
        format!(
            "Last close: {} (high {} / low {})",
            last.close, last.high, last.low
        ),
        String::new(),
        heading.to_string(),
    ];
    lines.extend(preview);
    lines.join("\n")
}

pub async fn price_action_summary(
    ctx: &Arc<ToolContext>,
    params: PriceActionParams,
) -> Result<ToolOutput> {
    params.validate()?;
    let symbol = require_symbol("symbol", &params.symbol)?;
    let interval = params.interval.as_str();

    let candles = match ctx
        .market
        .klines(
            params.market.market(),
            &symbol,
            interval,
            params.lookback,
            TimeRange::default(),
        )
        .await
    {
        Ok(candles) => candles,
        Err(e) => return Ok(upstream_failure("Price action summary", e)),
    };

    let Some(report) = analysis::summarize(&symbol, interval, params.lookback, &candles) else {
        return Ok(ToolOutput::error(format!(
            "Binance did not return enough candles for {}",
            symbol
        )));
    };

    let summary = &report.summary;
    let level = |i: usize| {
        summary
            .sr_levels
            .get(i)
            .map(|l| (format!("{:.2}", l.price), l.touches))
            .unwrap_or_else(|| ("N/A".to_string(), 0))
    };
    let (support, support_touches) = level(0);
    let (resistance, resistance_touches) = level(1);

    let mut lines = vec![
        format!("Symbol: {} ({})", summary.symbol, params.market.as_str()),
        format!("Interval: {}", interval),
        format!("Lookback: {} candles", summary.lookback),
        format!("Structure: {}", summary.structure),
        format!("Close change: {:.2}%", report.close_change_pct),
        format!("Support: {} (touches {})", support, support_touches),
        format!("Resistance: {} (touches {})", resistance, resistance_touches),
        "Breakout ideas:".to_string(),
    ];
    lines.extend(
        summary
            .breakout_candidates
            .iter()
            .enumerate()
            .map(|(i, c)| format!("{}. {}", i + 1, c.rule)),
    );

    Ok(ToolOutput::success(
        lines.join("\n"),
        json!({
            "summary": summary,
            "window": {
                "start": iso_millis(report.window_start),
                "end": iso_millis(report.window_end),
            },
        }),
    ))
}

pub async fn draft_order(ctx: &Arc<ToolContext>, params: DraftOrderParams) -> Result<ToolOutput> {
    params.validate()?;
    let symbol = require_symbol("symbol", &params.symbol)?;
    let policy = ctx.registries.risk_policy.get();

    let entry_price = match ctx
        .market
        .latest_price(params.market.market(), &symbol)
        .await
    {
        Ok(price) => price,
        Err(e) => return Ok(upstream_failure("Drafting order", e)),
    };

    let request = OrderRequest {
        symbol,
        side: params.side,
        notional_usd: params.notional_usd,
        stop_loss_pct: params.stop_loss_pct,
        take_profit_pct: params.take_profit_pct,
        leverage: params.leverage,
        equity_usd: params.equity_usd,
    };
    let draft = analysis::draft_order(&request, params.market.as_str(), entry_price, &policy);

    let lines = [
        format!("Symbol: {} ({})", draft.symbol, draft.market),
        format!("Side: {}", draft.side),
        format!("Latest price: {:.4}", draft.entry_price),
        format!(
            "Notional: ${:.2} (leverage x{})",
            draft.notional_usd, draft.leverage
        ),
        format!(
            "Stop loss: {}% ({:.4})",
            draft.stop_loss_pct, draft.stop_loss_price
        ),
        format!(
            "Take profit: {}% ({:.4})",
            draft.take_profit_pct, draft.take_profit_price
        ),
        format!(
            "Risk USD: ${:.2} ({:.2}% of equity)",
            draft.risk_usd, draft.risk_pct
        ),
        format!("Reward USD: ${:.2} (RR {:.2})", draft.reward_usd, draft.rr),
        format!(
            "Needs confirmation: {}",
            if draft.needs_confirm { "YES" } else { "No" }
        ),
        "Policy check:".to_string(),
        draft.policy_summary(&policy),
    ];

    Ok(ToolOutput::success(
        lines.join("\n"),
        json!({
            "draft": draft,
            "policySnapshot": policy,
        }),
    ))
}
