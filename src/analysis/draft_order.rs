//! Order drafting with reward/risk math and risk-policy checks
//!
//! Nothing here places an order; the draft only reports what an order would
//! risk and whether it breaches the current policy.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::state::RiskPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        })
    }
}

/// Sizing inputs for a draft
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRequest {
    pub symbol: String,
    pub side: Side,
    pub notional_usd: f64,
    pub stop_loss_pct: f64,
    pub take_profit_pct: f64,
    pub leverage: f64,
    pub equity_usd: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyFlags {
    pub risk_exceeded: bool,
    pub leverage_exceeded: bool,
    pub symbol_restricted: bool,
}

impl PolicyFlags {
    pub fn any(&self) -> bool {
        self.risk_exceeded || self.leverage_exceeded || self.symbol_restricted
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDraft {
    pub symbol: String,
    pub market: String,
    pub side: Side,
    pub entry_price: f64,
    pub stop_loss_price: f64,
    pub take_profit_price: f64,
    pub stop_loss_pct: f64,
    pub take_profit_pct: f64,
    pub notional_usd: f64,
    pub equity_usd: f64,
    pub leverage: f64,
    pub risk_usd: f64,
    pub risk_pct: f64,
    pub reward_usd: f64,
    pub rr: f64,
    pub needs_confirm: bool,
    pub policy_flags: PolicyFlags,
}

impl OrderDraft {
    /// One bullet per breached limit, or a single all-clear line
    pub fn policy_summary(&self, policy: &RiskPolicy) -> String {
        let mut lines = Vec::new();
        if self.policy_flags.risk_exceeded {
            lines.push(format!(
                "• Risk per trade {:.2}% > policy {}%",
                self.risk_pct, policy.per_trade_max_risk_pct
            ));
        }
        if self.policy_flags.leverage_exceeded {
            lines.push(format!(
                "• Leverage {}x > policy {}x",
                self.leverage, policy.max_leverage
            ));
        }
        if self.policy_flags.symbol_restricted {
            lines.push(format!("• {} not in allowlist", self.symbol));
        }

        if lines.is_empty() {
            "• Within policy limits".to_string()
        } else {
            lines.join("\n")
        }
    }
}

/// Builds a draft at `entry_price` and checks it against `policy`
pub fn draft_order(
    request: &OrderRequest,
    market: &str,
    entry_price: f64,
    policy: &RiskPolicy,
) -> OrderDraft {
    let stop_loss_ratio = request.stop_loss_pct / 100.0;
    let take_profit_ratio = request.take_profit_pct / 100.0;

    let risk_usd = request.notional_usd * stop_loss_ratio;
    let reward_usd = request.notional_usd * take_profit_ratio;
    let risk_pct = risk_usd / request.equity_usd * 100.0;
    let rr = reward_usd / if risk_usd == 0.0 { 1.0 } else { risk_usd };

    let (stop_loss_price, take_profit_price) = match request.side {
        Side::Buy => (
            entry_price * (1.0 - stop_loss_ratio),
            entry_price * (1.0 + take_profit_ratio),
        ),
        Side::Sell => (
            entry_price * (1.0 + stop_loss_ratio),
            entry_price * (1.0 - take_profit_ratio),
        ),
    };

    let policy_flags = PolicyFlags {
        risk_exceeded: risk_pct > policy.per_trade_max_risk_pct,
        leverage_exceeded: request.leverage > policy.max_leverage,
        symbol_restricted: !policy.allows_symbol(&request.symbol),
    };

    OrderDraft {
        symbol: request.symbol.clone(),
        market: market.to_string(),
        side: request.side,
        entry_price,
        stop_loss_price,
        take_profit_price,
        stop_loss_pct: request.stop_loss_pct,
        take_profit_pct: request.take_profit_pct,
        notional_usd: request.notional_usd,
        equity_usd: request.equity_usd,
        leverage: request.leverage,
        risk_usd,
        risk_pct,
        reward_usd,
        rr,
        needs_confirm: policy_flags.any(),
        policy_flags,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(side: Side) -> OrderRequest {
        OrderRequest {
            symbol: "BTCUSDT".to_string(),
            side,
            notional_usd: 1000.0,
            stop_loss_pct: 2.0,
            take_profit_pct: 6.0,
            leverage: 2.0,
            equity_usd: 10_000.0,
        }
    }

    #[test]
    fn test_buy_draft_within_policy() {
        let draft = draft_order(&request(Side::Buy), "perp", 100.0, &RiskPolicy::default());

        assert!((draft.risk_usd - 20.0).abs() < 1e-9);
        assert!((draft.reward_usd - 60.0).abs() < 1e-9);
        assert!((draft.risk_pct - 0.2).abs() < 1e-9);
        assert!((draft.rr - 3.0).abs() < 1e-9);
        assert!((draft.stop_loss_price - 98.0).abs() < 1e-9);
        assert!((draft.take_profit_price - 106.0).abs() < 1e-9);
        assert!(!draft.needs_confirm);
    }

    #[test]
    fn test_sell_mirrors_prices() {
        let draft = draft_order(&request(Side::Sell), "spot", 100.0, &RiskPolicy::default());
        assert!((draft.stop_loss_price - 102.0).abs() < 1e-9);
        assert!((draft.take_profit_price - 94.0).abs() < 1e-9);
    }

    #[test]
    fn test_policy_flags() {
        let policy = RiskPolicy {
            allowlist: vec!["ETHUSDT".to_string()],
            ..RiskPolicy::default()
        };
        let mut req = request(Side::Buy);
        req.leverage = 10.0;
        req.equity_usd = 500.0;

        let draft = draft_order(&req, "perp", 100.0, &policy);
        assert!(draft.policy_flags.risk_exceeded);
        assert!(draft.policy_flags.leverage_exceeded);
        assert!(draft.policy_flags.symbol_restricted);
        assert!(draft.needs_confirm);

        let summary = draft.policy_summary(&policy);
        assert!(summary.contains("Leverage 10x > policy 3x"));
        assert!(summary.contains("BTCUSDT not in allowlist"));
    }

    #[test]
    fn test_side_serialization() {
        assert_eq!(serde_json::to_value(Side::Buy).unwrap(), "BUY");
        let side: Side = serde_json::from_str(r#""SELL""#).unwrap();
        assert_eq!(side, Side::Sell);
    }
}
