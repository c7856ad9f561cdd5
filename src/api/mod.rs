//! Versioned JSON API.

pub mod common;
pub mod v1;

use axum::Router;

use crate::InnerState;

#[tracing::instrument(name = "create_api_router", skip(state))]
pub fn create_api_router(state: InnerState) -> Router<InnerState> {
    tracing::info!("Creating API router with versioned endpoints");

    Router::new().nest("/v1", v1::create_v1_routes(state))
}
