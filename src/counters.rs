use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide, monotonically increasing pipeline counters (C3).
///
/// Every field is an independent atomic; the spec only requires each field
/// to reflect some past value on read, not that all four are sampled at the
/// same instant, so `Ordering::Relaxed` is sufficient and matches the cost
/// profile of a hot ingress/worker path.
#[derive(Debug, Default)]
pub struct Counters {
    received: AtomicU64,
    unique_processed: AtomicU64,
    duplicate_dropped: AtomicU64,
    total_latency_bits: AtomicU64,
}

impl Counters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn incr_received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn incr_unique_processed(&self) {
        self.unique_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn incr_duplicate_dropped(&self) {
        self.duplicate_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Adds `seconds` to the latency accumulator. Only positive deltas are
    /// meant to be passed in by callers (§4.4 step 3) — this method itself
    /// doesn't filter, since the worker already only calls it for positive
    /// latencies.
    pub fn add_latency(&self, seconds: f64) {
        let mut current = self.total_latency_bits.load(Ordering::Relaxed);
        loop {
            let new = f64::from_bits(current) + seconds;
            match self.total_latency_bits.compare_exchange_weak(
                current,
                new.to_bits(),
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }
    }

    pub fn received(&self) -> u64 {
        self.received.load(Ordering::Relaxed)
    }

    pub fn unique_processed(&self) -> u64 {
        self.unique_processed.load(Ordering::Relaxed)
    }

    pub fn duplicate_dropped(&self) -> u64 {
        self.duplicate_dropped.load(Ordering::Relaxed)
    }

    pub fn total_latency(&self) -> f64 {
        f64::from_bits(self.total_latency_bits.load(Ordering::Relaxed))
    }
}
