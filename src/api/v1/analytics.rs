use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Extension, Json,
};
use serde::Serialize;

use crate::analytics::tracker::{self, PostAnalytics, PostStats};
use crate::api::common::middleware::CurrentUser;
use crate::api::common::utils::timeout_query;
use crate::api::common::ApiResponse;
use crate::authentication::claims::Capability;
use crate::errors::AppError;
use crate::store::posts;
use crate::InnerState;

use super::{actions, authorize, authorize_action};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupResult {
    pub deleted: u64,
}

#[tracing::instrument(name = "Post analytics", skip(state, user))]
pub async fn post_analytics(
    State(state): State<InnerState>,
    Extension(user): Extension<CurrentUser>,
    Path(post_id): Path<i64>,
) -> Result<Json<ApiResponse<PostStats>>, AppError> {
    authorize(&user, Capability::EditPosts)?;

    timeout_query(posts::get(&state.db, post_id)).await?;
    let stats = timeout_query(tracker::post_stats(&state.db, post_id)).await?;

    Ok(ApiResponse::success(stats))
}

#[tracing::instrument(name = "Analytics dashboard", skip_all)]
pub async fn dashboard(
    State(state): State<InnerState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<Vec<PostAnalytics>>>, AppError> {
    authorize(&user, Capability::ManageOptions)?;

    let rows = timeout_query(tracker::dashboard(&state.db, state.config.strategy)).await?;
    Ok(ApiResponse::success(rows))
}

#[tracing::instrument(name = "Cleanup analytics handler", skip_all)]
pub async fn cleanup(
    State(state): State<InnerState>,
    Extension(user): Extension<CurrentUser>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<CleanupResult>>, AppError> {
    authorize_action(
        &state,
        &user,
        &headers,
        Capability::ManageOptions,
        actions::CLEANUP_ANALYTICS,
    )?;

    let deleted = tracker::cleanup_orphans(&state.db).await?;
    Ok(ApiResponse::success(CleanupResult { deleted }))
}
