use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Extension, Json,
};
use chrono::Utc;
use serde::Serialize;

use crate::api::common::extractors::ApiJson;
use crate::api::common::middleware::CurrentUser;
use crate::api::common::utils::timeout_query;
use crate::api::common::ApiResponse;
use crate::authentication::claims::Capability;
use crate::errors::AppError;
use crate::store::posts::{self, NewPost, Post};
use crate::store::videos;
use crate::video::{lifecycle, video_enabled, VideoLifecycle, VideoRecord};
use crate::InnerState;

use super::{actions, authorize, authorize_action};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDetail {
    pub post: Post,
    pub video: Option<VideoRecord>,
    pub video_enabled: bool,
    pub lifecycle: VideoLifecycle,
    pub permalink: String,
}

#[tracing::instrument(name = "Create post handler", skip_all)]
pub async fn create_post(
    State(state): State<InnerState>,
    Extension(user): Extension<CurrentUser>,
    headers: HeaderMap,
    ApiJson(new_post): ApiJson<NewPost>,
) -> Result<Json<ApiResponse<Post>>, AppError> {
    authorize_action(&state, &user, &headers, Capability::EditPosts, actions::SAVE_POST)?;

    if new_post.title.trim().is_empty() {
        return Err(AppError::Validation("Title is required".to_string()));
    }
    if !matches!(new_post.status.as_str(), "publish" | "draft") {
        return Err(AppError::Validation(format!("Unsupported status: {}", new_post.status)));
    }

    let post = timeout_query(posts::create(&state.db, &new_post, Utc::now())).await?;
    Ok(ApiResponse::success(post))
}

#[tracing::instrument(name = "Get post handler", skip(state, user))]
pub async fn get_post(
    State(state): State<InnerState>,
    Extension(user): Extension<CurrentUser>,
    Path(post_id): Path<i64>,
) -> Result<Json<ApiResponse<PostDetail>>, AppError> {
    authorize(&user, Capability::EditPosts)?;

    let post = timeout_query(posts::get(&state.db, post_id)).await?;
    let video = videos::find(&state.db, post_id).await?;
    let strategy = state.config.strategy;

    Ok(ApiResponse::success(PostDetail {
        video_enabled: video_enabled(strategy, &post, video.as_ref()),
        lifecycle: lifecycle(strategy, &post, video.as_ref()),
        permalink: post.permalink(&state.config.site_url),
        post,
        video,
    }))
}
