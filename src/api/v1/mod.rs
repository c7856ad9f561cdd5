//! Version 1 endpoints.
//!
//! Three groups share one router: public rendering data, visitor endpoints
//! that accept an optional token, and editor/administrator endpoints that
//! require one. Mutating endpoints check the capability first and the nonce
//! second, and only then touch the store.

pub mod analytics;
pub mod nonce;
pub mod player;
pub mod posts;
pub mod scan;
pub mod settings;
pub mod video;
pub mod views;
pub mod youtube;

use axum::{
    http::HeaderMap,
    middleware,
    routing::{get, post, put},
    Router,
};
use chrono::Utc;

use crate::api::common::middleware::{auth_middleware, optional_auth_middleware, CurrentUser};
use crate::authentication::claims::{Capability, Claims};
use crate::authentication::nonce::check_nonce;
use crate::errors::AppError;
use crate::InnerState;

/// Nonce action names, one per mutating operation.
pub mod actions {
    pub const TRACK_VIDEO_VIEW: &str = "track_video_view";
    pub const SAVE_POST: &str = "save_post";
    pub const ENABLE_VIDEO_FEATURES: &str = "enable_video_features";
    pub const FETCH_YOUTUBE_DATA: &str = "fetch_youtube_data";
    pub const CLEANUP_ANALYTICS: &str = "cleanup_analytics";
    pub const SCAN_VIDEO_POSTS: &str = "scan_video_posts";
    pub const SAVE_SETTINGS: &str = "save_settings";

    pub const ALL: &[&str] = &[
        TRACK_VIDEO_VIEW,
        SAVE_POST,
        ENABLE_VIDEO_FEATURES,
        FETCH_YOUTUBE_DATA,
        CLEANUP_ANALYTICS,
        SCAN_VIDEO_POSTS,
        SAVE_SETTINGS,
    ];
}

pub(crate) fn authorize(user: &CurrentUser, capability: Capability) -> Result<&Claims, AppError> {
    let claims = user
        .0
        .as_ref()
        .ok_or_else(|| AppError::Authentication(anyhow::anyhow!("Missing authentication token")))?;
    claims.require(capability)?;
    Ok(claims)
}

pub(crate) fn authorize_action(
    state: &InnerState,
    user: &CurrentUser,
    headers: &HeaderMap,
    capability: Capability,
    action: &str,
) -> Result<(), AppError> {
    let claims = authorize(user, capability)?;
    check_nonce(headers, action, claims.sub, &state.config.nonce_secret, Utc::now())
}

#[tracing::instrument(name = "create_v1_routes", skip(state))]
pub fn create_v1_routes(state: InnerState) -> Router<InnerState> {
    tracing::info!("Setting up V1 API routes");

    let public = Router::new().route("/posts/:id/player", get(player::render));

    let visitor = Router::new()
        .route("/nonce", get(nonce::issue_nonce))
        .route("/views", post(views::track_view))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            optional_auth_middleware,
        ));

    let editor = Router::new()
        // Content
        .route("/posts", post(posts::create_post))
        .route("/posts/:id", get(posts::get_post))
        .route("/posts/:id/video", put(video::save_video))
        .route("/posts/:id/enable-video", post(video::enable_video))
        .route("/posts/:id/import", post(video::import_video))
        .route("/youtube/fetch", post(youtube::fetch_youtube_data))
        // Analytics
        .route("/posts/:id/analytics", get(analytics::post_analytics))
        .route("/analytics", get(analytics::dashboard))
        .route("/analytics/cleanup", post(analytics::cleanup))
        // Administration
        .route("/scan", post(scan::scan))
        .route(
            "/settings",
            get(settings::get_settings).put(settings::save_settings),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new().merge(public).merge(visitor).merge(editor)
}
