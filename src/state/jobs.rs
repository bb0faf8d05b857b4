//! In-memory scheduler for recurring analysis and alert jobs
//!
//! Each job owns a tokio task that sleeps until the next cron tick and then
//! invokes the job callback. Callback failures are logged and recorded on the
//! job, never propagated, and never stop the schedule. Jobs only end through
//! `remove` / `remove_all`.

use chrono::{DateTime, Utc};
use cron::Schedule;
use futures::future::BoxFuture;
use parking_lot::Mutex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use super::random_id;

const ID_LENGTH: usize = 10;

/// Scheduler errors
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("Invalid cron expression '{expression}': {reason}")]
    InvalidCron { expression: String, reason: String },
}

/// Price-crossing direction for alert jobs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum CrossingType {
    CrossesAbove,
    CrossesBelow,
}

/// Alert trigger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AlertCondition {
    #[serde(rename = "type")]
    pub crossing: CrossingType,
    pub price: f64,
}

/// What a job does when it fires
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum JobKind {
    /// Periodic price-action analysis
    Analysis {
        symbol: String,
        interval: String,
        lookback: u32,
    },
    /// Price alert
    Alert {
        symbol: String,
        condition: AlertCondition,
    },
}

impl JobKind {
    pub fn name(&self) -> &'static str {
        match self {
            JobKind::Analysis { .. } => "analysis",
            JobKind::Alert { .. } => "alert",
        }
    }

    pub fn symbol(&self) -> &str {
        match self {
            JobKind::Analysis { symbol, .. } | JobKind::Alert { symbol, .. } => symbol,
        }
    }
}

/// Caller-supplied part of a job
#[derive(Debug, Clone, PartialEq)]
pub struct JobSpec {
    pub cron_expression: String,
    pub description: Option<String>,
    pub kind: JobKind,
}

/// A scheduled job as stored by the registry
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    pub id: String,
    #[serde(rename = "cron")]
    pub cron_expression: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub kind: JobKind,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_run_at: Option<DateTime<Utc>>,
    /// Callback failures since creation
    pub failure_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// Invoked on every tick with a snapshot of the job
pub type JobCallback = Arc<dyn Fn(JobRecord) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

struct JobSlot {
    record: JobRecord,
    cancel: CancellationToken,
}

type JobMap = Arc<Mutex<HashMap<String, JobSlot>>>;

/// Registry of live jobs keyed by id
#[derive(Default)]
pub struct JobRegistry {
    jobs: JobMap,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the job and starts its schedule
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    /// `InvalidCron` if the expression does not parse; nothing is stored.
    pub fn create(&self, spec: JobSpec, on_fire: JobCallback) -> Result<JobRecord, JobError> {
        let schedule = parse_cron(&spec.cron_expression)?;
        let cancel = CancellationToken::new();

        let record = {
            let mut jobs = self.jobs.lock();
            let mut id = random_id(ID_LENGTH);
            while jobs.contains_key(&id) {
                id = random_id(ID_LENGTH);
            }

            let record = JobRecord {
                id: id.clone(),
                cron_expression: spec.cron_expression,
                description: spec.description,
                kind: spec.kind,
                created_at: Utc::now(),
                last_run_at: None,
                failure_count: 0,
                last_error: None,
            };
            jobs.insert(
                id,
                JobSlot {
                    record: record.clone(),
                    cancel: cancel.clone(),
                },
            );
            record
        };

        tokio::spawn(run_schedule(
            record.id.clone(),
            schedule,
            self.jobs.clone(),
            cancel,
            on_fire,
        ));

        info!(
            job_id = %record.id,
            kind = record.kind.name(),
            cron = %record.cron_expression,
            "Scheduled job"
        );
        Ok(record)
    }

    pub fn get(&self, id: &str) -> Option<JobRecord> {
        self.jobs.lock().get(id).map(|slot| slot.record.clone())
    }

    /// All live jobs, oldest first
    pub fn list(&self) -> Vec<JobRecord> {
        let mut records: Vec<JobRecord> = self
            .jobs
            .lock()
            .values()
            .map(|slot| slot.record.clone())
            .collect();
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        records
    }

    /// Stops the job's schedule and deletes it
    ///
    /// Returns the removed record, or `None` if no such job exists.
    pub fn remove(&self, id: &str) -> Option<JobRecord> {
        let slot = self.jobs.lock().remove(id)?;
        slot.cancel.cancel();
        info!(job_id = %id, "Cancelled job");
        Some(slot.record)
    }

    /// Stops every schedule and clears the registry, returning how many jobs were live
    pub fn remove_all(&self) -> usize {
        let drained: Vec<JobSlot> = self.jobs.lock().drain().map(|(_, slot)| slot).collect();
        for slot in &drained {
            slot.cancel.cancel();
        }
        if !drained.is_empty() {
            info!(count = drained.len(), "Stopped all scheduled jobs");
        }
        drained.len()
    }

    pub fn len(&self) -> usize {
        self.jobs.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.lock().is_empty()
    }
}

impl Drop for JobRegistry {
    fn drop(&mut self) {
        for slot in self.jobs.lock().values() {
            slot.cancel.cancel();
        }
    }
}

/// Parses a 5-field (minute resolution) or 6-field (leading seconds) cron expression
///
/// Day-of-week uses standard cron numbering: 0-7 with Sunday as 0 or 7.
pub fn parse_cron(expression: &str) -> Result<Schedule, JobError> {
    let invalid = |reason: String| JobError::InvalidCron {
        expression: expression.to_string(),
        reason,
    };

    let mut fields: Vec<String> = expression.split_whitespace().map(str::to_string).collect();
    match fields.len() {
        5 => fields.insert(0, "0".to_string()),
        6 => {}
        n => return Err(invalid(format!("expected 5 or 6 fields, got {}", n))),
    }
    fields[5] = day_of_week_names(&fields[5]).map_err(invalid)?;

    Schedule::from_str(&fields.join(" ")).map_err(|e| invalid(e.to_string()))
}

const WEEKDAY_NAMES: [&str; 7] = ["SUN", "MON", "TUE", "WED", "THU", "FRI", "SAT"];

fn parse_weekday(raw: &str) -> Result<u32, String> {
    match raw.parse::<u32>() {
        Ok(day) if day <= 7 => Ok(day),
        _ => Err(format!("day of week '{}' is not in 0-7", raw)),
    }
}

/// Rewrites numeric day-of-week items as day names
///
/// The `cron` crate counts weekdays 1-7 from Sunday, so numbers are expanded
/// into explicit name lists. Items already using names pass through.
fn day_of_week_names(field: &str) -> Result<String, String> {
    if field == "*" || field == "?" {
        return Ok(field.to_string());
    }

    let mut items: Vec<String> = Vec::new();
    let mut push = |item: String| {
        if !items.contains(&item) {
            items.push(item);
        }
    };

    for item in field.split(',') {
        if item.chars().any(|c| c.is_ascii_alphabetic()) {
            push(item.to_string());
            continue;
        }

        let (base, step) = match item.split_once('/') {
            Some((base, step)) => match step.parse::<u32>() {
                Ok(step) if step > 0 => (base, Some(step)),
                _ => return Err(format!("invalid step in '{}'", item)),
            },
            None => (item, None),
        };
        let (start, end) = match (base, base.split_once('-')) {
            ("*", _) => (0, 6),
            (_, Some((from, to))) => (parse_weekday(from)?, parse_weekday(to)?),
            (_, None) => {
                let day = parse_weekday(base)?;
                (day, if step.is_some() { 7 } else { day })
            }
        };
        if start > end {
            return Err(format!("day-of-week range '{}' is reversed", base));
        }

        let mut day = start;
        while day <= end {
            push(WEEKDAY_NAMES[(day % 7) as usize].to_string());
            day += step.unwrap_or(1);
        }
    }

    Ok(items.join(","))
}

async fn run_schedule(
    id: String,
    schedule: Schedule,
    jobs: JobMap,
    cancel: CancellationToken,
    on_fire: JobCallback,
) {
    let mut cursor = Utc::now();

    loop {
        let Some(next_tick) = schedule.after(&cursor.max(Utc::now())).next() else {
            debug!(job_id = %id, "Cron schedule has no further ticks");
            break;
        };
        let wait = (next_tick - Utc::now()).to_std().unwrap_or(Duration::ZERO);

        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(wait) => {}
        }
        cursor = next_tick;

        let snapshot = jobs.lock().get(&id).map(|slot| slot.record.clone());
        let Some(snapshot) = snapshot else {
            break;
        };

        debug!(job_id = %id, tick = %next_tick, "Job fired");
        let outcome = on_fire(snapshot).await;

        let mut guard = jobs.lock();
        let Some(slot) = guard.get_mut(&id) else {
            break;
        };
        match outcome {
            Ok(()) => slot.record.last_run_at = Some(Utc::now()),
            Err(err) => {
                error!(job_id = %id, error = %err, "Scheduled job failed");
                slot.record.failure_count += 1;
                slot.record.last_error = Some(err.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_five_field_cron() {
        assert!(parse_cron("*/5 * * * *").is_ok());
    }

    #[test]
    fn test_parse_six_field_cron() {
        assert!(parse_cron("*/10 * * * * *").is_ok());
    }

    #[test]
    fn test_parse_rejects_bad_field_count() {
        let err = parse_cron("* *").unwrap_err();
        assert!(err.to_string().contains("expected 5 or 6 fields"));
    }

    fn upcoming_weekdays(expression: &str, count: usize) -> Vec<chrono::Weekday> {
        use chrono::Datelike;
        parse_cron(expression)
            .unwrap()
            .upcoming(Utc)
            .take(count)
            .map(|tick| tick.weekday())
            .collect()
    }

    #[test]
    fn test_weekday_range_skips_weekend() {
        use chrono::Weekday;
        let days = upcoming_weekdays("0 9 * * 1-5", 15);
        assert!(days.iter().all(|d| *d != Weekday::Sun && *d != Weekday::Sat));
        assert!(days.contains(&Weekday::Mon));
        assert!(days.contains(&Weekday::Fri));
    }

    #[test]
    fn test_sunday_is_zero_or_seven() {
        use chrono::Weekday;
        for expression in ["0 0 * * 0", "0 0 * * 7"] {
            let days = upcoming_weekdays(expression, 3);
            assert_eq!(days, vec![Weekday::Sun; 3], "{}", expression);
        }
        let days = upcoming_weekdays("0 0 * * 5-7", 6);
        assert!(days.iter().all(|d| matches!(d, Weekday::Fri | Weekday::Sat | Weekday::Sun)));
    }

    #[test]
    fn test_day_of_week_lists_and_steps() {
        assert_eq!(day_of_week_names("1,3").unwrap(), "MON,WED");
        assert_eq!(day_of_week_names("*/2").unwrap(), "SUN,TUE,THU,SAT");
        assert_eq!(day_of_week_names("1-5/2").unwrap(), "MON,WED,FRI");
        assert_eq!(day_of_week_names("0,7").unwrap(), "SUN");
        assert_eq!(day_of_week_names("MON-FRI").unwrap(), "MON-FRI");
        assert!(day_of_week_names("8").is_err());
        assert!(day_of_week_names("5-1").is_err());
        assert!(parse_cron("0 0 * * 9").is_err());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_cron("a b c d e").is_err());
    }

    #[test]
    fn test_record_serializes_flat() {
        let record = JobRecord {
            id: "abc".to_string(),
            cron_expression: "0 * * * *".to_string(),
            description: None,
            kind: JobKind::Alert {
                symbol: "BTCUSDT".to_string(),
                condition: AlertCondition {
                    crossing: CrossingType::CrossesAbove,
                    price: 70000.0,
                },
            },
            created_at: Utc::now(),
            last_run_at: None,
            failure_count: 0,
            last_error: None,
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["kind"], "alert");
        assert_eq!(json["cron"], "0 * * * *");
        assert_eq!(json["condition"]["type"], "crossesAbove");
        assert!(json.get("lastRunAt").is_none());
    }

    #[tokio::test]
    async fn test_invalid_cron_stores_nothing() {
        let registry = JobRegistry::new();
        let callback: JobCallback =
            Arc::new(|_: JobRecord| -> BoxFuture<'static, anyhow::Result<()>> { Box::pin(async { Ok(()) }) });
        let spec = JobSpec {
            cron_expression: "not a cron".to_string(),
            description: None,
            kind: JobKind::Analysis {
                symbol: "BTCUSDT".to_string(),
                interval: "1h".to_string(),
                lookback: 100,
            },
        };

        assert!(registry.create(spec, callback).is_err());
        assert!(registry.is_empty());
    }
}
