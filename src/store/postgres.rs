use super::Store;
use crate::error::StoreError;
use crate::models::{Event, InsertOutcome, ProcessedEvent};
use async_trait::async_trait;
use sqlx::PgPool;

/// Postgres-backed `Store`. Holds a connection pool shared across ingress
/// reads and every worker's inserts — the pool itself is the concurrency
/// arbiter for the uniqueness constraint, so no in-process locking is
/// needed here.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn insert_if_absent(&self, event: &Event) -> Result<InsertOutcome, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO processed_events (topic, event_id, timestamp, source, payload)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT ON CONSTRAINT uq_topic_event_id DO NOTHING
            "#,
        )
        .bind(&event.topic)
        .bind(&event.event_id)
        .bind(&event.timestamp)
        .bind(&event.source)
        .bind(&event.payload)
        .execute(&self.pool)
        .await
        .map_err(StoreError::Transient)?;

        if result.rows_affected() > 0 {
            Ok(InsertOutcome::Inserted)
        } else {
            Ok(InsertOutcome::Skipped)
        }
    }

    async fn count_events(&self) -> Result<i64, StoreError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM processed_events")
            .fetch_one(&self.pool)
            .await
            .map_err(StoreError::Transient)?;
        Ok(count)
    }

    async fn list_events(
        &self,
        topic: Option<&str>,
        limit: i64,
    ) -> Result<Vec<ProcessedEvent>, StoreError> {
        let limit = limit.max(0);
        let rows = match topic {
            Some(topic) => {
                sqlx::query_as::<_, ProcessedEvent>(
                    r#"
                    SELECT id, topic, event_id, timestamp, source, payload, created_at
                    FROM processed_events
                    WHERE topic = $1
                    ORDER BY id DESC
                    LIMIT $2
                    "#,
                )
                .bind(topic)
                .bind(limit)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query_as::<_, ProcessedEvent>(
                    r#"
                    SELECT id, topic, event_id, timestamp, source, payload, created_at
                    FROM processed_events
                    ORDER BY id DESC
                    LIMIT $1
                    "#,
                )
                .bind(limit)
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(StoreError::Transient)?;

        Ok(rows)
    }

    async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(StoreError::Migration)?;
        Ok(())
    }
}
