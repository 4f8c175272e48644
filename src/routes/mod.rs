mod events;
mod health;
mod metrics;
mod publish;
mod stats;

use crate::middleware::track_http_metrics;
use crate::state::AppState;
use axum::routing::{get, post};
use axum::Router;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health::root))
        .route("/publish", post(publish::publish))
        .route("/events", get(events::list_events))
        .route("/stats", get(stats::stats))
        .route("/metrics", get(metrics::metrics))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            track_http_metrics,
        ))
        .with_state(state)
}
