use crate::state::AppState;
use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

/// `GET /` — liveness only (§4.5).
pub async fn root(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "alive",
        "service": state.service_name,
    }))
}
