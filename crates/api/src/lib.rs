//! HTTP order gateway with observability.
//!
//! Turns each `POST /api/process-order` into one saga run over the broker
//! and maps the saga's ending onto a single HTTP response. Structured
//! logging (tracing) and Prometheus metrics come along.

pub mod backend;
pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use broker::{FanOut, MessageBroker};
use metrics_exporter_prometheus::PrometheusHandle;
use saga::SagaCoordinator;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use backend::{Backend, MONITORED_SERVICES, start_workers};
pub use config::Config;

/// Shared application state accessible from all handlers.
pub struct AppState<B> {
    pub coordinator: SagaCoordinator<B>,
    pub health: FanOut<B>,
    pub config: Config,
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<B>(state: Arc<AppState<B>>, metrics_handle: PrometheusHandle) -> Router
where
    B: MessageBroker + Clone + 'static,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check::<B>))
        .route("/api/process-order", post(routes::orders::process::<B>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the gateway state on top of a broker connection.
pub fn create_default_state<B>(broker: B, config: Config) -> Arc<AppState<B>>
where
    B: MessageBroker + Clone,
{
    let coordinator = SagaCoordinator::with_config(broker.clone(), config.saga_config());
    Arc::new(AppState {
        coordinator,
        health: FanOut::new(broker),
        config,
    })
}
