use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Registry, TextEncoder};

/// Ambient Prometheus surface (SPEC_FULL AMBIENT-4). Distinct from the
/// spec'd `/stats` endpoint: this is a separate, additive exposition format
/// for scraping, not a reshaping of `/stats`'s documented fields.
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,

    pub events_received_total: IntCounter,
    pub events_unique_total: IntCounter,
    pub events_duplicate_total: IntCounter,
    pub worker_loop_iterations_total: IntCounterVec,
    pub http_request_duration_seconds: HistogramVec,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let events_received_total =
            IntCounter::new("events_received_total", "Total events accepted by /publish")
                .expect("metric");
        let events_unique_total = IntCounter::new(
            "events_unique_total",
            "Total events persisted as new rows",
        )
        .expect("metric");
        let events_duplicate_total = IntCounter::new(
            "events_duplicate_total",
            "Total events skipped by the uniqueness constraint",
        )
        .expect("metric");
        let worker_loop_iterations_total = IntCounterVec::new(
            prometheus::Opts::new(
                "worker_loop_iterations_total",
                "Worker loop iterations by worker id",
            ),
            &["worker_id"],
        )
        .expect("metric");
        let http_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "http_request_duration_seconds",
                "HTTP request duration seconds",
            ),
            &["path", "method", "status"],
        )
        .expect("metric");

        registry
            .register(Box::new(events_received_total.clone()))
            .unwrap();
        registry
            .register(Box::new(events_unique_total.clone()))
            .unwrap();
        registry
            .register(Box::new(events_duplicate_total.clone()))
            .unwrap();
        registry
            .register(Box::new(worker_loop_iterations_total.clone()))
            .unwrap();
        registry
            .register(Box::new(http_request_duration_seconds.clone()))
            .unwrap();

        Self {
            registry,
            events_received_total,
            events_unique_total,
            events_duplicate_total,
            worker_loop_iterations_total,
            http_request_duration_seconds,
        }
    }

    pub fn render(&self) -> Result<String, String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buf = Vec::new();
        encoder
            .encode(&metric_families, &mut buf)
            .map_err(|e| e.to_string())?;
        String::from_utf8(buf).map_err(|e| e.to_string())
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
