use axum::{
    extract::{ConnectInfo, State},
    http::{header, HeaderMap},
    Extension, Json,
};
use chrono::Utc;
use std::net::SocketAddr;

use crate::analytics::tracker::{self, IdentityHints, ViewAck, ViewSubmission};
use crate::api::common::extractors::ApiJson;
use crate::api::common::middleware::CurrentUser;
use crate::api::common::utils::timeout_query;
use crate::api::common::ApiResponse;
use crate::authentication::nonce::check_nonce;
use crate::errors::AppError;
use crate::store::{posts, settings};
use crate::InnerState;

use super::actions;

/// First hop of `X-Forwarded-For`, then `X-Real-IP`, then the socket peer.
fn client_ip(headers: &HeaderMap, peer: Option<&ConnectInfo<SocketAddr>>) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    let real_ip = headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    forwarded
        .or(real_ip)
        .map(str::to_string)
        .or_else(|| peer.map(|ConnectInfo(addr)| addr.ip().to_string()))
        .unwrap_or_default()
}

#[tracing::instrument(name = "Track video view", skip_all)]
pub async fn track_view(
    State(state): State<InnerState>,
    Extension(user): Extension<CurrentUser>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    ApiJson(submission): ApiJson<ViewSubmission>,
) -> Result<Json<ApiResponse<ViewAck>>, AppError> {
    let now = Utc::now();
    check_nonce(
        &headers,
        actions::TRACK_VIDEO_VIEW,
        user.user_id(),
        &state.config.nonce_secret,
        now,
    )?;

    let settings = timeout_query(settings::load(&state.db)).await?;
    if !settings.enable_analytics {
        tracing::debug!("Analytics disabled, view for post {} not stored", submission.post_id);
        return Ok(ApiResponse::success(ViewAck { recorded: false }));
    }

    timeout_query(posts::get(&state.db, submission.post_id)).await?;

    let hints = IdentityHints {
        user_id: user.0.as_ref().map(|claims| claims.sub),
        ip_address: client_ip(&headers, peer.as_ref()),
        user_agent: headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string(),
    };

    let ack = tracker::record(&state.db, &submission, &hints, now).await?;
    Ok(ApiResponse::success(ack))
}
