pub mod analytics;
pub mod api;
pub mod authentication;
pub mod config;
pub mod db;
pub mod errors;
pub mod store;
pub mod system;
pub mod video;
pub mod youtube;

use axum::{routing::get, Router};
use axum_prometheus::PrometheusMetricLayer;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api::common::tracing::{
    make_custom_span, on_custom_failure, on_custom_request, on_custom_response,
};
use crate::config::Config;
use crate::youtube::YoutubeClient;

#[derive(Clone)]
pub struct InnerState {
    pub db: SqlitePool,
    pub config: Arc<Config>,
    pub youtube: YoutubeClient,
}

impl InnerState {
    pub fn new(db: SqlitePool, config: Config) -> anyhow::Result<Self> {
        let youtube = YoutubeClient::new(&config.provider)?;
        Ok(Self {
            db,
            config: Arc::new(config),
            youtube,
        })
    }
}

/// Every route of the service with CORS and request tracing applied.
pub fn build_app(state: InnerState) -> Router {
    Router::new()
        .nest("/api", api::create_api_router(state.clone()))
        .merge(system::create_system_router())
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(make_custom_span)
                .on_request(on_custom_request)
                .on_response(on_custom_response)
                .on_failure(on_custom_failure),
        )
        .with_state(state)
}

/// Adds the Prometheus layer and the `/metrics` route. Installs a global
/// recorder, so it can only be called once per process.
pub fn with_metrics(app: Router) -> Router {
    let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();

    app.route("/metrics", get(|| async move { metric_handle.render() }))
        .layer(prometheus_layer)
}

#[cfg(test)]
pub(crate) async fn test_state() -> InnerState {
    InnerState::new(db::test_pool().await, Config::for_tests()).expect("Failed to build test state")
}
