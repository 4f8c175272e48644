use crate::broker::Broker;
use crate::counters::Counters;
use crate::metrics::Metrics;
use crate::store::Store;
use std::sync::Arc;

/// Shared ingress state, handed to every Axum handler. Holds the ingress's
/// own broker handle (shared across all request tasks, per §5) and the
/// store pool; workers hold their own independent handles and are not part
/// of this struct.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub broker: Arc<dyn Broker>,
    pub counters: Arc<Counters>,
    pub metrics: Arc<Metrics>,
    pub service_name: &'static str,
}
