use crate::error::AppError;
use crate::models::{PublishRequest, PublishResponse};
use crate::state::AppState;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

/// `POST /publish` (§4.5). Validation failures never touch `received` or
/// enqueue anything; a broker failure after a successful validation has
/// already incremented `received` — that is accepted, it counts "attempts
/// accepted by validation".
///
/// Takes the raw body rather than `Json<PublishRequest>` so that a missing
/// or malformed body (including a genuinely empty one) is reported as our
/// own 422, rather than Axum's generic 400 JSON-extractor rejection.
pub async fn publish(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<PublishResponse>), AppError> {
    let request: PublishRequest = if body.is_empty() {
        PublishRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| AppError::Validation(format!("invalid JSON body: {e}")))?
    };

    let event = request.into_event().map_err(AppError::Validation)?;

    state.counters.incr_received();
    state.metrics.events_received_total.inc();

    let item = serde_json::to_string(&event).expect("Event always serializes");
    state.broker.push_left(item).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(PublishResponse {
            status: "queued",
            id: event.event_id,
        }),
    ))
}
