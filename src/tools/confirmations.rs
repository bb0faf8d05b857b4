//! Confirmation ticket tools

use serde_json::{json, Value};
use std::sync::Arc;

use super::params::{GetConfirmationParams, RequestConfirmationParams};
use super::{iso, ToolContext, ToolOutput};
use crate::error::Result;
use crate::state::ConfirmationTicket;

fn ticket_json(ticket: &ConfirmationTicket) -> Value {
    json!({
        "id": ticket.id,
        "createdAt": iso(&ticket.created_at),
        "expiresAt": iso(&ticket.expires_at),
        "reason": ticket.reason,
        "draft": ticket.draft,
    })
}

fn reason_or_na(ticket: &ConfirmationTicket) -> &str {
    ticket.reason.as_deref().unwrap_or("N/A")
}

pub fn request_confirmation(
    ctx: &Arc<ToolContext>,
    params: RequestConfirmationParams,
) -> Result<ToolOutput> {
    params.validate()?;
    let reason = params.reason.map(|r| r.trim().to_string());

    let ticket = ctx
        .registries
        .confirmations
        .create(params.draft, reason, params.ttl_seconds);
    tracing::info!(confirmation_id = %ticket.id, "Confirmation requested");

    let text = [
        format!("Confirmation ID: {}", ticket.id),
        format!("Expires at: {}", iso(&ticket.expires_at)),
        format!("Reason: {}", reason_or_na(&ticket)),
        "Draft snapshot stored. Awaiting approval.".to_string(),
    ]
    .join("\n");

    Ok(ToolOutput::success(
        text,
        json!({ "confirmation": ticket_json(&ticket) }),
    ))
}

pub fn get_confirmation(
    ctx: &Arc<ToolContext>,
    params: GetConfirmationParams,
) -> Result<ToolOutput> {
    params.validate()?;

    let Some(ticket) = ctx.registries.confirmations.get(&params.confirmation_id) else {
        return Ok(ToolOutput::error(format!(
            "No confirmation ticket found with ID {}.",
            params.confirmation_id
        )));
    };

    let text = [
        format!("Confirmation ID: {}", ticket.id),
        format!("Created at: {}", iso(&ticket.created_at)),
        format!("Expires at: {}", iso(&ticket.expires_at)),
        format!("Reason: {}", reason_or_na(&ticket)),
    ]
    .join("\n");

    Ok(ToolOutput::success(
        text,
        json!({ "confirmation": ticket_json(&ticket) }),
    ))
}

pub fn list_confirmations(ctx: &Arc<ToolContext>) -> Result<ToolOutput> {
    let tickets = ctx.registries.confirmations.list();
    if tickets.is_empty() {
        return Ok(ToolOutput::success(
            "No pending confirmation tickets.",
            json!({ "confirmations": [] }),
        ));
    }

    let text = tickets
        .iter()
        .map(|t| {
            format!(
                "{} → expires {} reason: {}",
                t.id,
                iso(&t.expires_at),
                reason_or_na(t)
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    let confirmations: Vec<Value> = tickets.iter().map(ticket_json).collect();

    Ok(ToolOutput::success(
        text,
        json!({ "confirmations": confirmations }),
    ))
}
