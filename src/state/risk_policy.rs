//! Process-wide risk policy
//!
//! Holds the limits `draft_order` checks against. Reads hand out copies, so
//! callers never alias the stored policy.

use parking_lot::RwLock;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Risk limits applied to drafted orders
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskPolicy {
    /// Max loss per trade as % of equity
    pub per_trade_max_risk_pct: f64,
    /// Max leverage multiplier
    pub max_leverage: f64,
    /// Daily drawdown at which trading stops, % of equity
    pub daily_drawdown_stop_pct: f64,
    /// Tradable symbols; empty means every symbol is allowed
    pub allowlist: Vec<String>,
}

impl Default for RiskPolicy {
    fn default() -> Self {
        Self {
            per_trade_max_risk_pct: 2.0,
            max_leverage: 3.0,
            daily_drawdown_stop_pct: 3.0,
            allowlist: Vec::new(),
        }
    }
}

impl RiskPolicy {
    /// True when the allowlist is empty or contains `symbol`
    pub fn allows_symbol(&self, symbol: &str) -> bool {
        self.allowlist.is_empty() || self.allowlist.iter().any(|s| s == symbol)
    }
}

/// Partial update; `None` fields keep their current value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RiskPolicyUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(description = "Max risk per trade as % of equity (0.1-20)")]
    pub per_trade_max_risk_pct: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(description = "Max leverage (1-100)")]
    pub max_leverage: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(description = "Daily drawdown stop as % of equity (0.5-50)")]
    pub daily_drawdown_stop_pct: Option<f64>,

    /// Replaces the whole allowlist when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(description = "Symbols allowed for trading; replaces the current list")]
    pub allowlist: Option<Vec<String>>,
}

/// Holder of the single live policy
#[derive(Debug, Default)]
pub struct RiskPolicyStore {
    current: RwLock<RiskPolicy>,
}

impl RiskPolicyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the current policy
    pub fn get(&self) -> RiskPolicy {
        self.current.read().clone()
    }

    /// Merges the supplied fields over the current policy and returns the result
    pub fn set(&self, update: RiskPolicyUpdate) -> RiskPolicy {
        let mut current = self.current.write();

        if let Some(pct) = update.per_trade_max_risk_pct {
            current.per_trade_max_risk_pct = pct;
        }
        if let Some(leverage) = update.max_leverage {
            current.max_leverage = leverage;
        }
        if let Some(pct) = update.daily_drawdown_stop_pct {
            current.daily_drawdown_stop_pct = pct;
        }
        if let Some(allowlist) = update.allowlist {
            current.allowlist = allowlist;
        }

        current.clone()
    }

    /// Restores the compiled-in defaults
    pub fn reset(&self) -> RiskPolicy {
        let mut current = self.current.write();
        *current = RiskPolicy::default();
        current.clone()
    }
}
