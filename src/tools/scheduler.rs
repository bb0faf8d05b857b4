//! Scheduler tools
//!
//! Jobs fire a callback that logs the task; nothing else runs on a tick.

use futures::future::BoxFuture;
use serde_json::json;
use std::sync::Arc;

use super::params::{require_symbol, CancelJobParams, ScheduleTaskParams};
use super::{iso, ToolContext, ToolOutput};
use crate::error::Result;
use crate::state::{JobCallback, JobKind, JobRecord, JobSpec};

fn job_text(job: &JobRecord) -> String {
    let mut lines = vec![
        format!("Job {} ({})", job.id, job.kind.name()),
        format!("Cron: {}", job.cron_expression),
    ];
    if let Some(description) = &job.description {
        lines.push(format!("Description: {}", description));
    }
    lines.push(format!("Created at: {}", iso(&job.created_at)));
    if let Some(last_run) = &job.last_run_at {
        lines.push(format!("Last run: {}", iso(last_run)));
    }
    if job.failure_count > 0 {
        lines.push(format!("Failures: {}", job.failure_count));
    }
    lines.join("\n")
}

/// Callback that records each firing in the log
pub fn log_firing() -> JobCallback {
    Arc::new(|job: JobRecord| -> BoxFuture<'static, anyhow::Result<()>> {
        Box::pin(async move {
            match &job.kind {
                JobKind::Analysis {
                    symbol,
                    interval,
                    lookback,
                } => tracing::info!(
                    job_id = %job.id,
                    kind = "analysis",
                    symbol = %symbol,
                    interval = %interval,
                    lookback,
                    "Scheduled task fired"
                ),
                JobKind::Alert { symbol, condition } => tracing::info!(
                    job_id = %job.id,
                    kind = "alert",
                    symbol = %symbol,
                    crossing = ?condition.crossing,
                    price = condition.price,
                    "Scheduled task fired"
                ),
            }
            Ok(())
        })
    })
}

pub fn schedule_task(ctx: &Arc<ToolContext>, params: ScheduleTaskParams) -> Result<ToolOutput> {
    params.validate()?;

    let kind = match params.kind {
        JobKind::Analysis {
            symbol,
            interval,
            lookback,
        } => JobKind::Analysis {
            symbol: require_symbol("symbol", &symbol)?,
            interval,
            lookback,
        },
        JobKind::Alert { symbol, condition } => JobKind::Alert {
            symbol: require_symbol("symbol", &symbol)?,
            condition,
        },
    };
    let spec = JobSpec {
        cron_expression: params.cron.trim().to_string(),
        description: params
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty()),
        kind,
    };

    match ctx.registries.jobs.create(spec, log_firing()) {
        Ok(job) => Ok(ToolOutput::success(
            format!("{} job scheduled.\n{}", job.kind.name(), job_text(&job)),
            json!({ "job": job }),
        )),
        Err(e) => Ok(ToolOutput::error(e.to_string())),
    }
}

pub fn list_jobs(ctx: &Arc<ToolContext>) -> Result<ToolOutput> {
    let jobs = ctx.registries.jobs.list();
    if jobs.is_empty() {
        return Ok(ToolOutput::success(
            "No scheduled jobs.",
            json!({ "jobs": [] }),
        ));
    }

    let text = jobs.iter().map(job_text).collect::<Vec<_>>().join("\n\n");
    Ok(ToolOutput::success(text, json!({ "jobs": jobs })))
}

pub fn cancel_job(ctx: &Arc<ToolContext>, params: CancelJobParams) -> Result<ToolOutput> {
    params.validate()?;

    match ctx.registries.jobs.remove(&params.job_id) {
        Some(job) => Ok(ToolOutput::success(
            format!("Job {} cancelled.", job.id),
            json!({ "jobId": job.id, "job": job }),
        )),
        None => Ok(ToolOutput::error(format!(
            "No scheduled job with ID {}.",
            params.job_id
        ))),
    }
}
