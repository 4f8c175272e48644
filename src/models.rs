use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Client-submitted event, as received by `POST /publish` and as serialized
/// verbatim into the broker queue item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub topic: String,
    pub event_id: String,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<JsonValue>,
}

/// Wire-form request body for `POST /publish`. Every field is optional at
/// the parse layer so that a missing/malformed field is reported as a 422
/// validation error by `into_event`, rather than a generic 400 from the
/// JSON extractor rejecting the body before our handler runs.
#[derive(Debug, Default, Deserialize)]
pub struct PublishRequest {
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub event_id: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub payload: Option<JsonValue>,
}

impl PublishRequest {
    /// Validates the required, non-empty string fields and converts to an
    /// `Event`. Does not validate that `timestamp` parses — unparseable
    /// timestamps are accepted and simply skipped during worker-side
    /// latency accounting (§4.4).
    pub fn into_event(self) -> Result<Event, String> {
        let topic = non_empty(self.topic, "topic")?;
        let event_id = non_empty(self.event_id, "event_id")?;
        let timestamp = non_empty(self.timestamp, "timestamp")?;

        Ok(Event {
            topic,
            event_id,
            timestamp,
            source: self.source,
            payload: self.payload,
        })
    }
}

fn non_empty(field: Option<String>, name: &str) -> Result<String, String> {
    match field {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(format!("{name} must be a non-empty string")),
    }
}

/// A persisted `Event` row, returned by `GET /events`.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProcessedEvent {
    pub id: i64,
    pub topic: String,
    pub event_id: String,
    pub timestamp: String,
    pub source: Option<String>,
    pub payload: Option<JsonValue>,
    pub created_at: DateTime<Utc>,
}

/// Outcome of an `insert_if_absent` attempt (C1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    Skipped,
}

/// Query parameters for `GET /events`.
#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    pub topic: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

pub fn default_limit() -> i64 {
    20
}

#[derive(Debug, Serialize)]
pub struct PublishResponse {
    pub status: &'static str,
    pub id: String,
}

#[derive(Debug, Serialize)]
pub struct UptimeStats {
    pub received_api: u64,
    pub unique_processed: u64,
    pub duplicate_dropped: u64,
}

#[derive(Debug, Serialize)]
pub struct SystemState {
    pub database_rows: i64,
    pub queue_depth: i64,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub uptime_stats: UptimeStats,
    pub system_state: SystemState,
}
