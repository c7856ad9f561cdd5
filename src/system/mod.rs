//! Unauthenticated, non-API routes.

pub mod health_check;
pub mod sitemap;

use axum::{routing::get, Router};

use crate::InnerState;

#[tracing::instrument(name = "create_system_router")]
pub fn create_system_router() -> Router<InnerState> {
    tracing::info!("Creating system router");

    Router::new()
        .route("/health", get(health_check::health_check))
        .route("/video-sitemap.xml", get(sitemap::video_sitemap))
}
