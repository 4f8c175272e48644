use aggregator::broker::fake::InMemoryBroker;
use aggregator::broker::Broker;
use aggregator::counters::Counters;
use aggregator::metrics::Metrics;
use aggregator::routes::router;
use aggregator::state::AppState;
use aggregator::store::fake::InMemoryStore;
use aggregator::store::Store;
use aggregator::worker;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

/// Wires an `AppState` over in-memory fakes plus a single running worker,
/// the way `main` wires `PgStore`/`RedisBroker` plus `WORKER_COUNT` workers,
/// but sized down to what an integration test needs.
struct Pipeline {
    state: AppState,
    cancel: CancellationToken,
    handle: tokio::task::JoinHandle<()>,
}

impl Pipeline {
    fn start() -> Self {
        let store: Arc<dyn Store> = Arc::new(InMemoryStore::new());
        let broker: Arc<dyn Broker> = Arc::new(InMemoryBroker::new());
        let counters = Arc::new(Counters::new());
        let metrics = Arc::new(Metrics::new());
        let cancel = CancellationToken::new();

        let handle = tokio::spawn(worker::run(
            0,
            broker.clone(),
            store.clone(),
            counters.clone(),
            metrics.clone(),
            cancel.clone(),
        ));

        let state = AppState {
            store,
            broker,
            counters,
            metrics,
            service_name: "aggregator",
        };

        Self {
            state,
            cancel,
            handle,
        }
    }

    async fn stop(self) {
        self.cancel.cancel();
        let _ = tokio::time::timeout(Duration::from_secs(2), self.handle).await;
    }

    async fn publish(&self, body: Value) -> (StatusCode, Value) {
        let app = router(self.state.clone());
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/publish")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let parsed = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, parsed)
    }

    async fn events(&self, query: &str) -> (StatusCode, Value) {
        let app = router(self.state.clone());
        let uri = if query.is_empty() {
            "/events".to_string()
        } else {
            format!("/events?{query}")
        };
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let parsed = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, parsed)
    }

    async fn stats(&self) -> Value {
        let app = router(self.state.clone());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/stats")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    /// Gives the spawned worker a chance to drain the queue.
    async fn settle(&self) {
        for _ in 0..200 {
            if self.state.broker.length().await.unwrap_or(-1) == 0 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

// S1: single publish drains to exactly one persisted row.
#[tokio::test]
async fn single_publish_is_persisted_exactly_once() {
    let pipeline = Pipeline::start();

    let (status, body) = pipeline
        .publish(json!({"topic": "orders", "event_id": "e1", "timestamp": "2025-01-01T00:00:00Z"}))
        .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["status"], "queued");
    assert_eq!(body["id"], "e1");

    pipeline.settle().await;

    let (status, events) = pipeline.events("").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(events.as_array().unwrap().len(), 1);
    assert_eq!(events[0]["event_id"], "e1");

    pipeline.stop().await;
}

// S2: republishing the same (topic, event_id) is accepted by /publish but
// dropped at persistence time — the store never grows past one row.
#[tokio::test]
async fn duplicate_publish_is_accepted_but_not_duplicated_in_store() {
    let pipeline = Pipeline::start();

    for _ in 0..3 {
        let (status, _) = pipeline
            .publish(
                json!({"topic": "orders", "event_id": "dup-1", "timestamp": "2025-01-01T00:00:00Z"}),
            )
            .await;
        assert_eq!(status, StatusCode::ACCEPTED);
    }

    pipeline.settle().await;

    let (_, events) = pipeline.events("").await;
    assert_eq!(events.as_array().unwrap().len(), 1);

    let stats = pipeline.stats().await;
    assert_eq!(stats["uptime_stats"]["received_api"], 3);
    assert_eq!(stats["uptime_stats"]["unique_processed"], 1);
    assert_eq!(stats["uptime_stats"]["duplicate_dropped"], 2);

    pipeline.stop().await;
}

// S3: the same event_id under different topics is not a duplicate — the
// uniqueness key is the (topic, event_id) pair, not event_id alone.
#[tokio::test]
async fn same_event_id_different_topics_both_persist() {
    let pipeline = Pipeline::start();

    pipeline
        .publish(json!({"topic": "orders", "event_id": "shared", "timestamp": "2025-01-01T00:00:00Z"}))
        .await;
    pipeline
        .publish(json!({"topic": "shipments", "event_id": "shared", "timestamp": "2025-01-01T00:00:00Z"}))
        .await;

    pipeline.settle().await;

    let (_, events) = pipeline.events("").await;
    assert_eq!(events.as_array().unwrap().len(), 2);

    pipeline.stop().await;
}

// S4: an empty body is a 422, and never reaches the broker or the counters.
#[tokio::test]
async fn empty_body_is_rejected_and_never_enqueued() {
    let pipeline = Pipeline::start();

    let app = router(pipeline.state.clone());
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/publish")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    pipeline.settle().await;
    let stats = pipeline.stats().await;
    assert_eq!(stats["uptime_stats"]["received_api"], 0);
    assert_eq!(stats["system_state"]["database_rows"], 0);

    pipeline.stop().await;
}

// S5: a nested payload round-trips through the queue and into the store
// unchanged.
#[tokio::test]
async fn nested_payload_round_trips_through_the_queue() {
    let pipeline = Pipeline::start();
    let payload = json!({
        "nested": {"a": [1, 2, 3], "b": null},
        "flag": true,
    });

    pipeline
        .publish(json!({
            "topic": "orders",
            "event_id": "e-payload",
            "timestamp": "2025-01-01T00:00:00Z",
            "source": "checkout",
            "payload": payload,
        }))
        .await;

    pipeline.settle().await;

    let (_, events) = pipeline.events("topic=orders").await;
    let row = &events[0];
    assert_eq!(row["source"], "checkout");
    assert_eq!(row["payload"], payload);

    pipeline.stop().await;
}

// S6: limit=0 returns an empty list without error, and topic filtering
// excludes non-matching rows.
#[tokio::test]
async fn limit_zero_and_topic_filter_are_respected() {
    let pipeline = Pipeline::start();

    pipeline
        .publish(json!({"topic": "orders", "event_id": "o1", "timestamp": "2025-01-01T00:00:00Z"}))
        .await;
    pipeline
        .publish(json!({"topic": "shipments", "event_id": "s1", "timestamp": "2025-01-01T00:00:00Z"}))
        .await;

    pipeline.settle().await;

    let (status, events) = pipeline.events("limit=0").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(events.as_array().unwrap().len(), 0);

    let (_, events) = pipeline.events("topic=shipments").await;
    assert_eq!(events.as_array().unwrap().len(), 1);
    assert_eq!(events[0]["event_id"], "s1");

    pipeline.stop().await;
}

// S7: /stats reports a consistent, internally coherent shape: received
// equals unique plus duplicate, and database_rows matches the events list.
#[tokio::test]
async fn stats_shape_is_internally_consistent() {
    let pipeline = Pipeline::start();

    for event_id in ["a", "b", "a", "c", "b"] {
        pipeline
            .publish(
                json!({"topic": "orders", "event_id": event_id, "timestamp": "2025-01-01T00:00:00Z"}),
            )
            .await;
    }

    pipeline.settle().await;

    let stats = pipeline.stats().await;
    let received = stats["uptime_stats"]["received_api"].as_u64().unwrap();
    let unique = stats["uptime_stats"]["unique_processed"].as_u64().unwrap();
    let duplicate = stats["uptime_stats"]["duplicate_dropped"].as_u64().unwrap();
    assert_eq!(received, unique + duplicate);
    assert_eq!(unique, 3);
    assert_eq!(duplicate, 2);

    let (_, events) = pipeline.events("limit=100").await;
    assert_eq!(
        events.as_array().unwrap().len() as i64,
        stats["system_state"]["database_rows"].as_i64().unwrap()
    );

    pipeline.stop().await;
}

// Boundary: missing required field is a 422, missing only optional fields
// is a 202 — covered at unit level in routes::publish::tests too, repeated
// here end-to-end with a running worker attached.
#[tokio::test]
async fn missing_required_field_short_circuits_before_enqueue() {
    let pipeline = Pipeline::start();

    let (status, _) = pipeline
        .publish(json!({"event_id": "e1", "timestamp": "2025-01-01T00:00:00Z"}))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    pipeline.settle().await;
    assert_eq!(pipeline.state.store.count_events().await.unwrap(), 0);

    pipeline.stop().await;
}

// GET /events on an empty store returns 200 with an empty array, not 404.
#[tokio::test]
async fn events_on_empty_store_is_empty_array_not_error() {
    let pipeline = Pipeline::start();

    let (status, events) = pipeline.events("").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(events.as_array().unwrap().len(), 0);

    pipeline.stop().await;
}
