// Integration tests for the in-memory registries
//
// Confirmation expiry, job scheduling and cancellation, and risk policy
// merge/reset semantics.

use crypto_binance_provider::state::{
    ConfirmationRegistry, JobCallback, JobKind, JobRecord, JobRegistry, JobSpec, RiskPolicy,
    RiskPolicyStore, RiskPolicyUpdate,
};
use futures::future::BoxFuture;
use serde_json::{json, Map, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn draft() -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("symbol".to_string(), json!("BTCUSDT"));
    map.insert("side".to_string(), json!("BUY"));
    map
}

fn analysis_spec(cron: &str) -> JobSpec {
    JobSpec {
        cron_expression: cron.to_string(),
        description: Some("every second".to_string()),
        kind: JobKind::Analysis {
            symbol: "BTCUSDT".to_string(),
            interval: "1h".to_string(),
            lookback: 100,
        },
    }
}

fn counting_callback(counter: Arc<AtomicUsize>) -> JobCallback {
    Arc::new(move |_job: JobRecord| -> BoxFuture<'static, anyhow::Result<()>> {
        let counter = counter.clone();
        Box::pin(async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    })
}

#[tokio::test]
async fn test_confirmation_expires_after_ttl() {
    let registry = ConfirmationRegistry::new();
    let ticket = registry.create(draft(), Some("large size".to_string()), Some(1));

    assert!(registry.get(&ticket.id).is_some());
    assert_eq!(registry.list().len(), 1);

    tokio::time::sleep(Duration::from_millis(1100)).await;

    assert!(registry.get(&ticket.id).is_none());
    assert!(registry.list().is_empty());
    assert_eq!(registry.resident_count(), 0);
}

#[test]
fn test_confirmation_ids_are_unique() {
    let registry = ConfirmationRegistry::new();
    let a = registry.create(draft(), None, None);
    let b = registry.create(draft(), None, None);

    assert_ne!(a.id, b.id);
    assert_eq!(a.id.len(), 12);
    assert_eq!(registry.list().len(), 2);
}

#[tokio::test]
async fn test_job_fires_and_stops_after_cancel() {
    let registry = JobRegistry::new();
    let counter = Arc::new(AtomicUsize::new(0));

    let job = registry
        .create(analysis_spec("* * * * * *"), counting_callback(counter.clone()))
        .unwrap();
    assert_eq!(registry.len(), 1);

    tokio::time::sleep(Duration::from_millis(2500)).await;
    let fired = counter.load(Ordering::SeqCst);
    assert!(fired >= 1, "job never fired");

    let removed = registry.remove(&job.id).unwrap();
    assert_eq!(removed.id, job.id);
    assert!(registry.get(&job.id).is_none());

    let after_cancel = counter.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(counter.load(Ordering::SeqCst), after_cancel);
}

#[tokio::test]
async fn test_job_failures_are_recorded() {
    let registry = JobRegistry::new();
    let failing: JobCallback = Arc::new(|_job: JobRecord| -> BoxFuture<'static, anyhow::Result<()>> {
        Box::pin(async { anyhow::bail!("upstream down") })
    });

    let job = registry.create(analysis_spec("* * * * * *"), failing).unwrap();
    tokio::time::sleep(Duration::from_millis(2500)).await;

    // The schedule survives a failed tick and keeps firing
    let record = registry.get(&job.id).unwrap();
    assert!(record.failure_count >= 2, "failures: {}", record.failure_count);
    assert_eq!(record.last_error.as_deref(), Some("upstream down"));
    assert!(record.last_run_at.is_none());

    assert_eq!(registry.remove_all(), 1);
    assert!(registry.is_empty());
}

#[tokio::test]
async fn test_remove_unknown_job() {
    let registry = JobRegistry::new();
    assert!(registry.remove("missing").is_none());
}

#[test]
fn test_risk_policy_partial_update_and_reset() {
    let store = RiskPolicyStore::new();

    store.set(RiskPolicyUpdate {
        allowlist: Some(vec!["ETHUSDT".to_string()]),
        ..Default::default()
    });
    let updated = store.set(RiskPolicyUpdate {
        max_leverage: Some(5.0),
        ..Default::default()
    });

    assert_eq!(updated.max_leverage, 5.0);
    assert_eq!(updated.per_trade_max_risk_pct, 2.0);
    assert_eq!(updated.daily_drawdown_stop_pct, 3.0);
    assert_eq!(updated.allowlist, vec!["ETHUSDT".to_string()]);
    assert!(!updated.allows_symbol("BTCUSDT"));
    assert_eq!(store.get(), updated);

    let reset = store.reset();
    assert_eq!(reset, RiskPolicy::default());
    assert_eq!(reset.per_trade_max_risk_pct, 2.0);
    assert_eq!(reset.max_leverage, 3.0);
    assert_eq!(reset.daily_drawdown_stop_pct, 3.0);
    assert!(reset.allowlist.is_empty());
    assert!(store.get().allows_symbol("BTCUSDT"));
}
