mod postgres;

pub use postgres::PgStore;

use crate::error::StoreError;
use crate::models::{Event, InsertOutcome, ProcessedEvent};
use async_trait::async_trait;

/// Store adapter (C1): insert-if-absent persistence over `ProcessedEvent`.
///
/// `insert_if_absent` is the only write path — there is no update path.
/// Implementations must realize it as a single round-trip that leans on the
/// store's native conflict resolution; a select-then-insert implementation
/// would race two workers onto the same uniqueness key.
#[async_trait]
pub trait Store: Send + Sync {
    async fn insert_if_absent(&self, event: &Event) -> Result<InsertOutcome, StoreError>;
    async fn count_events(&self) -> Result<i64, StoreError>;
    async fn list_events(
        &self,
        topic: Option<&str>,
        limit: i64,
    ) -> Result<Vec<ProcessedEvent>, StoreError>;
    async fn ensure_schema(&self) -> Result<(), StoreError>;
}

/// An in-memory `Store` so the pipeline's logic can be exercised without a
/// live Postgres instance, mirroring the role `InMemoryBus` plays for
/// `EventBus` in the platform's event-bus crate: a first-class, always
/// available implementation of the trait, not a test-only shim.
pub mod fake {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct InMemoryStore {
        rows: Mutex<Vec<ProcessedEvent>>,
        next_id: Mutex<i64>,
    }

    impl InMemoryStore {
        pub fn new() -> Self {
            Self {
                rows: Mutex::new(Vec::new()),
                next_id: Mutex::new(1),
            }
        }
    }

    #[async_trait]
    impl Store for InMemoryStore {
        async fn insert_if_absent(&self, event: &Event) -> Result<InsertOutcome, StoreError> {
            let mut rows = self.rows.lock().unwrap();
            if rows
                .iter()
                .any(|r| r.topic == event.topic && r.event_id == event.event_id)
            {
                return Ok(InsertOutcome::Skipped);
            }

            let mut next_id = self.next_id.lock().unwrap();
            let id = *next_id;
            *next_id += 1;

            rows.push(ProcessedEvent {
                id,
                topic: event.topic.clone(),
                event_id: event.event_id.clone(),
                timestamp: event.timestamp.clone(),
                source: event.source.clone(),
                payload: event.payload.clone(),
                created_at: chrono::Utc::now(),
            });

            Ok(InsertOutcome::Inserted)
        }

        async fn count_events(&self) -> Result<i64, StoreError> {
            Ok(self.rows.lock().unwrap().len() as i64)
        }

        async fn list_events(
            &self,
            topic: Option<&str>,
            limit: i64,
        ) -> Result<Vec<ProcessedEvent>, StoreError> {
            let rows = self.rows.lock().unwrap();
            let mut matching: Vec<ProcessedEvent> = rows
                .iter()
                .filter(|r| topic.map(|t| t == r.topic).unwrap_or(true))
                .cloned()
                .collect();
            matching.sort_by(|a, b| b.id.cmp(&a.id));
            matching.truncate(limit.max(0) as usize);
            Ok(matching)
        }

        async fn ensure_schema(&self) -> Result<(), StoreError> {
            Ok(())
        }
    }
}
