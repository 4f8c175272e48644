use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;

/// `GET /metrics` — ambient Prometheus text exposition (SPEC_FULL AMBIENT-4).
pub async fn metrics(State(state): State<AppState>) -> Result<String, (StatusCode, String)> {
    state
        .metrics
        .render()
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e))
}
