//! Price-action summary over a window of candles
//!
//! Structure is read from the first and last close; support and resistance
//! are the window extremes, with touches counted within 0.2% of each level.

use serde::Serialize;

use crate::binance::Candle;

/// Close-to-close move (as a fraction) beyond which a window trends
const TREND_THRESHOLD: f64 = 0.02;

/// Relative distance from a level that still counts as a touch
const TOUCH_TOLERANCE: f64 = 0.002;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Structure {
    Uptrend,
    Downtrend,
    Range,
}

impl std::fmt::Display for Structure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Structure::Uptrend => "uptrend",
            Structure::Downtrend => "downtrend",
            Structure::Range => "range",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LevelKind {
    Support,
    Resistance,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SupportResistanceLevel {
    pub price: f64,
    pub touches: usize,
    pub kind: LevelKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakoutCandidate {
    pub window: String,
    pub confirm_close_pct: f64,
    pub pullback_max_pct: f64,
    pub rule: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceActionSummary {
    pub symbol: String,
    pub interval: String,
    pub lookback: u32,
    pub structure: Structure,
    pub sr_levels: Vec<SupportResistanceLevel>,
    pub breakout_candidates: Vec<BreakoutCandidate>,
}

/// Summary plus the figures only shown in the text rendering
#[derive(Debug, Clone, PartialEq)]
pub struct PriceActionReport {
    pub summary: PriceActionSummary,
    pub close_change_pct: f64,
    /// Open time of the first sampled candle, ms
    pub window_start: i64,
    /// Close time of the last sampled candle, ms
    pub window_end: i64,
}

/// Analyzes the last `lookback` candles
///
/// Returns `None` for an empty input.
pub fn summarize(
    symbol: &str,
    interval: &str,
    lookback: u32,
    candles: &[Candle],
) -> Option<PriceActionReport> {
    let skip = candles.len().saturating_sub(lookback as usize);
    let sampled = &candles[skip..];
    let (first, last) = (sampled.first()?, sampled.last()?);

    let structure = determine_structure(sampled);
    let sr_levels = support_resistance(sampled);
    let breakout_candidates = breakout_candidates(&sr_levels, structure);

    let first_close = first.close_f64();
    let close_change_pct = (last.close_f64() - first_close) / first_close * 100.0;

    Some(PriceActionReport {
        summary: PriceActionSummary {
            symbol: symbol.to_string(),
            interval: interval.to_string(),
            lookback,
            structure,
            sr_levels,
            breakout_candidates,
        },
        close_change_pct,
        window_start: first.open_time,
        window_end: last.close_time,
    })
}

pub fn determine_structure(candles: &[Candle]) -> Structure {
    let (Some(first), Some(last)) = (candles.first(), candles.last()) else {
        return Structure::Range;
    };

    let first_close = first.close_f64();
    let change = (last.close_f64() - first_close) / first_close;
    if change > TREND_THRESHOLD {
        Structure::Uptrend
    } else if change < -TREND_THRESHOLD {
        Structure::Downtrend
    } else {
        Structure::Range
    }
}

/// Support (lowest low) followed by resistance (highest high)
pub fn support_resistance(candles: &[Candle]) -> Vec<SupportResistanceLevel> {
    let lows: Vec<f64> = candles.iter().map(Candle::low_f64).collect();
    let highs: Vec<f64> = candles.iter().map(Candle::high_f64).collect();

    let min_low = lows.iter().copied().fold(f64::INFINITY, f64::min);
    let max_high = highs.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    vec![
        SupportResistanceLevel {
            price: min_low,
            touches: count_touches(&lows, min_low),
            kind: LevelKind::Support,
        },
        SupportResistanceLevel {
            price: max_high,
            touches: count_touches(&highs, max_high),
            kind: LevelKind::Resistance,
        },
    ]
}

fn count_touches(prices: &[f64], level: f64) -> usize {
    prices
        .iter()
        .filter(|price| ((*price - level) / level).abs() < TOUCH_TOLERANCE)
        .count()
}

pub fn breakout_candidates(
    levels: &[SupportResistanceLevel],
    structure: Structure,
) -> Vec<BreakoutCandidate> {
    let support = levels.iter().find(|l| l.kind == LevelKind::Support);
    let resistance = levels.iter().find(|l| l.kind == LevelKind::Resistance);

    let mut candidates = Vec::new();
    if let Some(resistance) = resistance {
        candidates.push(BreakoutCandidate {
            window: "recent-high".to_string(),
            confirm_close_pct: 0.5,
            pullback_max_pct: 0.3,
            rule: format!(
                "Close above {:.2} with volume confirmation",
                resistance.price
            ),
        });
    }
    if let Some(support) = support {
        candidates.push(BreakoutCandidate {
            window: "recent-low".to_string(),
            confirm_close_pct: 0.5,
            pullback_max_pct: 0.3,
            rule: format!(
                "Close below {:.2} with strong follow-through",
                support.price
            ),
        });
    }
    if let (Structure::Range, Some(support), Some(resistance)) = (structure, support, resistance) {
        candidates.push(BreakoutCandidate {
            window: "range-trading".to_string(),
            confirm_close_pct: 0.0,
            pullback_max_pct: 0.5,
            rule: format!(
                "Fade the range {:.2} - {:.2} with tight stops",
                support.price, resistance.price
            ),
        });
    }
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candle(t: i64, low: f64, high: f64, close: f64) -> Candle {
        Candle {
            open_time: t,
            open: close.to_string(),
            high: high.to_string(),
            low: low.to_string(),
            close: close.to_string(),
            volume: "1".to_string(),
            close_time: t + 59_999,
        }
    }

    #[test]
    fn test_uptrend_structure() {
        let candles = vec![candle(0, 99.0, 101.0, 100.0), candle(60_000, 103.0, 106.0, 105.0)];
        assert_eq!(determine_structure(&candles), Structure::Uptrend);
    }

    #[test]
    fn test_downtrend_structure() {
        let candles = vec![candle(0, 99.0, 101.0, 100.0), candle(60_000, 94.0, 96.0, 95.0)];
        assert_eq!(determine_structure(&candles), Structure::Downtrend);
    }

    #[test]
    fn test_range_adds_fade_candidate() {
        let candles = vec![
            candle(0, 99.0, 101.0, 100.0),
            candle(60_000, 99.1, 100.9, 100.5),
            candle(120_000, 98.0, 101.0, 101.0),
        ];
        let report = summarize("BTCUSDT", "1h", 180, &candles).unwrap();

        assert_eq!(report.summary.structure, Structure::Range);
        assert_eq!(report.summary.breakout_candidates.len(), 3);
        assert_eq!(report.summary.breakout_candidates[2].window, "range-trading");
        assert_eq!(
            report.summary.breakout_candidates[2].rule,
            "Fade the range 98.00 - 101.00 with tight stops"
        );
        assert_eq!(report.window_start, 0);
        assert_eq!(report.window_end, 179_999);
    }

    #[test]
    fn test_touches_within_tolerance() {
        let candles = vec![
            candle(0, 100.0, 110.0, 105.0),
            candle(1, 100.1, 109.9, 105.0),
            candle(2, 101.0, 105.0, 105.0),
        ];
        let levels = support_resistance(&candles);

        assert_eq!(levels[0].kind, LevelKind::Support);
        assert_eq!(levels[0].price, 100.0);
        assert_eq!(levels[0].touches, 2);
        assert_eq!(levels[1].price, 110.0);
        assert_eq!(levels[1].touches, 2);
    }

    #[test]
    fn test_lookback_samples_tail() {
        let candles: Vec<Candle> = (0..10)
            .map(|i| candle(i * 60_000, 100.0, 101.0, 100.0 + i as f64))
            .collect();
        let report = summarize("ETHUSDT", "1m", 3, &candles).unwrap();

        assert_eq!(report.window_start, 7 * 60_000);
        assert!((report.close_change_pct - (2.0 / 107.0 * 100.0)).abs() < 1e-9);
    }

    #[test]
    fn test_empty_input() {
        assert!(summarize("BTCUSDT", "1h", 50, &[]).is_none());
    }
}
