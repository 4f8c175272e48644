use crate::broker::Broker;
use crate::counters::Counters;
use crate::metrics::Metrics;
use crate::models::{Event, InsertOutcome};
use crate::store::Store;
use chrono::{DateTime, NaiveDateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const POP_TIMEOUT: Duration = Duration::from_secs(1);

/// Runs a single worker loop (C4) until `cancel` is triggered. Never
/// returns an `Err` — per-item failures are logged and the loop continues;
/// the only way out is cancellation.
pub async fn run(
    worker_id: usize,
    broker: Arc<dyn Broker>,
    store: Arc<dyn Store>,
    counters: Arc<Counters>,
    metrics: Arc<Metrics>,
    cancel: CancellationToken,
) {
    tracing::info!(worker_id, "worker started");
    let worker_label = worker_id.to_string();

    loop {
        if cancel.is_cancelled() {
            break;
        }

        let popped = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            result = broker.blocking_pop_right(POP_TIMEOUT) => {
                match result {
                    Ok(item) => item,
                    Err(e) => {
                        tracing::warn!(worker_id, error = %e, "broker pop failed");
                        None
                    }
                }
            }
        };

        metrics
            .worker_loop_iterations_total
            .with_label_values(&[&worker_label])
            .inc();

        let Some(raw) = popped else {
            continue;
        };

        process_item(worker_id, &raw, store.as_ref(), &counters, &metrics).await;
    }

    tracing::info!(worker_id, "worker stopped");
}

async fn process_item(
    worker_id: usize,
    raw: &str,
    store: &dyn Store,
    counters: &Counters,
    metrics: &Metrics,
) {
    let event: Event = match serde_json::from_str(raw) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!(worker_id, error = %e, "dropping undecodable queue item");
            return;
        }
    };

    if let Some(latency) = latency_seconds(&event.timestamp) {
        if latency > 0.0 {
            counters.add_latency(latency);
        }
    }

    match store.insert_if_absent(&event).await {
        Ok(InsertOutcome::Inserted) => {
            counters.incr_unique_processed();
            metrics.events_unique_total.inc();
        }
        Ok(InsertOutcome::Skipped) => {
            counters.incr_duplicate_dropped();
            metrics.events_duplicate_total.inc();
        }
        Err(e) => {
            tracing::warn!(
                worker_id,
                topic = %event.topic,
                event_id = %event.event_id,
                error = %e,
                "store error, dropping item"
            );
        }
    }
}

/// Best-effort latency computation: tries RFC 3339 first (offset-aware),
/// then a bare `YYYY-MM-DDTHH:MM:SS[.ffffff]` form (offset-naive,
/// interpreted as UTC) to match what Python's `datetime.fromisoformat`
/// accepts. Any parse failure returns `None` and is silently ignored.
fn latency_seconds(timestamp: &str) -> Option<f64> {
    let event_time = DateTime::parse_from_rfc3339(timestamp)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%dT%H:%M:%S%.f")
                .map(|naive| DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc))
        })
        .ok()?;

    let delta = Utc::now().signed_duration_since(event_time);
    Some(delta.num_milliseconds() as f64 / 1000.0)
}
