use crate::error::AppError;
use crate::models::{StatsResponse, SystemState, UptimeStats};
use crate::state::AppState;
use axum::extract::State;
use axum::Json;

/// `GET /stats` (§4.5). `queue_depth` falls back to 0 if the broker is
/// unreachable; `database_rows` surfaces a real store error, since an
/// unreadable row count means the observability surface itself is broken.
pub async fn stats(State(state): State<AppState>) -> Result<Json<StatsResponse>, AppError> {
    let database_rows = state.store.count_events().await?;
    let queue_depth = state.broker.length().await.unwrap_or(0);

    Ok(Json(StatsResponse {
        uptime_stats: UptimeStats {
            received_api: state.counters.received(),
            unique_processed: state.counters.unique_processed(),
            duplicate_dropped: state.counters.duplicate_dropped(),
        },
        system_state: SystemState {
            database_rows,
            queue_depth,
        },
    }))
}
