use aggregator::broker::{Broker, RedisBroker};
use aggregator::config::{Config, WORKER_COUNT};
use aggregator::counters::Counters;
use aggregator::metrics::Metrics;
use aggregator::state::AppState;
use aggregator::store::{PgStore, Store};
use aggregator::{routes, worker};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

const SCHEMA_RETRY_ATTEMPTS: u32 = 5;
const SCHEMA_RETRY_DELAY: Duration = Duration::from_secs(3);

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cfg = Config::from_env().expect("invalid configuration");
    tracing::info!("config loaded");

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(10))
        .connect(&cfg.database_url)
        .await
        .expect("failed to connect to Postgres");

    let store: Arc<dyn Store> = Arc::new(PgStore::new(pool));
    ensure_schema_with_retry(store.as_ref()).await;

    let ingress_broker: Arc<dyn Broker> = Arc::new(
        RedisBroker::connect(&cfg.broker_url)
            .await
            .expect("failed to connect to broker"),
    );
    tracing::info!("connected to broker");

    let counters = Arc::new(Counters::new());
    let metrics = Arc::new(Metrics::new());
    let cancel = CancellationToken::new();

    let mut worker_handles = Vec::with_capacity(WORKER_COUNT);
    for worker_id in 0..WORKER_COUNT {
        let worker_broker: Arc<dyn Broker> = Arc::new(
            RedisBroker::connect(&cfg.broker_url)
                .await
                .expect("failed to connect worker broker"),
        );
        let worker_store = store.clone();
        let worker_counters = counters.clone();
        let worker_metrics = metrics.clone();
        let worker_cancel = cancel.clone();
        worker_handles.push(tokio::spawn(worker::run(
            worker_id,
            worker_broker,
            worker_store,
            worker_counters,
            worker_metrics,
            worker_cancel,
        )));
    }

    let state = AppState {
        store,
        broker: ingress_broker,
        counters,
        metrics,
        service_name: "aggregator",
    };

    let app = routes::router(state)
        .layer(
            CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        .layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", cfg.host, cfg.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind");
    tracing::info!(%addr, "aggregator listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server failed");

    tracing::info!("HTTP server stopped, cancelling workers");
    cancel.cancel();
    for handle in worker_handles {
        let _ = handle.await;
    }
    tracing::info!("shutdown complete");
}

async fn ensure_schema_with_retry(store: &dyn Store) {
    for attempt in 1..=SCHEMA_RETRY_ATTEMPTS {
        match store.ensure_schema().await {
            Ok(()) => {
                tracing::info!("schema ready");
                return;
            }
            Err(e) => {
                tracing::warn!(
                    attempt,
                    max_attempts = SCHEMA_RETRY_ATTEMPTS,
                    error = %e,
                    "store not ready, retrying"
                );
                tokio::time::sleep(SCHEMA_RETRY_DELAY).await;
            }
        }
    }

    tracing::error!("store unreachable after {SCHEMA_RETRY_ATTEMPTS} attempts, aborting startup");
    std::process::exit(1);
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
