//! Risk policy tools

use serde_json::json;
use std::sync::Arc;

use super::params::validate_risk_update;
use super::{ToolContext, ToolOutput};
use crate::error::Result;
use crate::state::{RiskPolicy, RiskPolicyUpdate};

fn policy_lines(policy: &RiskPolicy) -> Vec<String> {
    let allowlist = if policy.allowlist.is_empty() {
        "All symbols allowed".to_string()
    } else {
        policy.allowlist.join(", ")
    };
    vec![
        format!("Per-trade max risk %: {}", policy.per_trade_max_risk_pct),
        format!("Max leverage: {}", policy.max_leverage),
        format!("Daily drawdown stop %: {}", policy.daily_drawdown_stop_pct),
        format!("Allowlist: {}", allowlist),
    ]
}

fn policy_output(heading: Option<&str>, policy: RiskPolicy) -> ToolOutput {
    let mut lines: Vec<String> = heading.map(str::to_string).into_iter().collect();
    lines.extend(policy_lines(&policy));
    ToolOutput::success(lines.join("\n"), json!({ "policy": policy }))
}

pub fn get_risk_policy(ctx: &Arc<ToolContext>) -> Result<ToolOutput> {
    Ok(policy_output(None, ctx.registries.risk_policy.get()))
}

pub fn set_risk_policy(ctx: &Arc<ToolContext>, update: RiskPolicyUpdate) -> Result<ToolOutput> {
    validate_risk_update(&update)?;
    let update = RiskPolicyUpdate {
        allowlist: update.allowlist.map(|list| {
            list.iter()
                .map(|s| crate::binance::sanitize_symbol(s))
                .filter(|s| !s.is_empty())
                .collect()
        }),
        ..update
    };

    let policy = ctx.registries.risk_policy.set(update);
    tracing::info!(?policy, "Risk policy updated");
    Ok(policy_output(
        Some("Risk policy updated successfully."),
        policy,
    ))
}

pub fn reset_risk_policy(ctx: &Arc<ToolContext>) -> Result<ToolOutput> {
    let policy = ctx.registries.risk_policy.reset();
    tracing::info!("Risk policy reset to defaults");
    Ok(policy_output(Some("Risk policy reset to defaults."), policy))
}
