use crate::error::AppError;
use crate::models::{EventsQuery, ProcessedEvent};
use crate::state::AppState;
use axum::extract::{Query, State};
use axum::Json;

/// `GET /events?topic=&limit=` (§4.5). `limit` defaults to 20; `limit=0`
/// returns an empty list (§8 boundary case) without any special-casing —
/// the store layer's `LIMIT 0`/truncate(0) naturally yields zero rows.
pub async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<EventsQuery>,
) -> Result<Json<Vec<ProcessedEvent>>, AppError> {
    let events = state
        .store
        .list_events(query.topic.as_deref(), query.limit)
        .await?;
    Ok(Json(events))
}
