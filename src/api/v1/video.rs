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
use crate::config::ContentStrategy;
use crate::errors::AppError;
use crate::store::posts::{self, Post};
use crate::store::{settings, videos};
use crate::video::classifier::Provider;
use crate::video::{lifecycle, merge_submission, VideoLifecycle, VideoRecord, VideoSubmission};
use crate::youtube::ProviderMetadata;
use crate::InnerState;

use super::{actions, authorize_action};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSaved {
    pub video: Option<VideoRecord>,
    pub lifecycle: VideoLifecycle,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoImported {
    pub video: VideoRecord,
    pub metadata: ProviderMetadata,
}

fn ensure_supported(strategy: ContentStrategy, post: &Post) -> Result<(), AppError> {
    if post.post_type == strategy.post_type() {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "Video features are not available for {} items",
            post.post_type
        )))
    }
}

/// Fills only what the record does not already know.
fn fill_from_provider(record: &mut VideoRecord, metadata: &ProviderMetadata) {
    if record.positive_duration().is_none() && metadata.duration > 0 {
        record.duration_seconds = Some(metadata.duration);
    }
    if record.thumbnail_url.as_deref().map_or(true, |t| t.trim().is_empty()) {
        record.thumbnail_url = metadata.thumbnail.clone();
    }
    if record.upload_date.is_none() {
        record.upload_date = metadata.upload_date;
    }
}

#[tracing::instrument(name = "Save video meta", skip(state, user, headers, submission))]
pub async fn save_video(
    State(state): State<InnerState>,
    Extension(user): Extension<CurrentUser>,
    Path(post_id): Path<i64>,
    headers: HeaderMap,
    ApiJson(submission): ApiJson<VideoSubmission>,
) -> Result<Json<ApiResponse<VideoSaved>>, AppError> {
    authorize_action(&state, &user, &headers, Capability::EditPosts, actions::SAVE_POST)?;

    if submission.duration_seconds.is_some_and(|d| d < 0) {
        return Err(AppError::Validation("duration_seconds must not be negative".to_string()));
    }

    let strategy = state.config.strategy;
    let post = timeout_query(posts::get(&state.db, post_id)).await?;
    ensure_supported(strategy, &post)?;

    let existing = videos::find(&state.db, post_id).await?;
    let had_record = existing.is_some();
    let record = merge_submission(strategy, &post, existing, &submission, Utc::now());

    // No record is created for a post that was never flagged.
    if !had_record && !record.is_video {
        return Ok(ApiResponse::success(VideoSaved {
            video: None,
            lifecycle: VideoLifecycle::NotVideo,
        }));
    }

    timeout_query(videos::save(&state.db, &record)).await?;
    tracing::info!(post_id, provider = ?record.provider, "Saved video meta");

    Ok(ApiResponse::success(VideoSaved {
        lifecycle: lifecycle(strategy, &post, Some(&record)),
        video: Some(record),
    }))
}

#[tracing::instrument(name = "Enable video features", skip(state, user, headers))]
pub async fn enable_video(
    State(state): State<InnerState>,
    Extension(user): Extension<CurrentUser>,
    Path(post_id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<VideoSaved>>, AppError> {
    authorize_action(
        &state,
        &user,
        &headers,
        Capability::EditPosts,
        actions::ENABLE_VIDEO_FEATURES,
    )?;

    let post = timeout_query(posts::get(&state.db, post_id)).await?;
    ensure_supported(state.config.strategy, &post)?;

    let record = timeout_query(videos::enable(&state.db, post_id, Utc::now())).await?;

    Ok(ApiResponse::success(VideoSaved {
        lifecycle: lifecycle(state.config.strategy, &post, Some(&record)),
        video: Some(record),
    }))
}

#[tracing::instrument(name = "Import YouTube metadata", skip(state, user, headers))]
pub async fn import_video(
    State(state): State<InnerState>,
    Extension(user): Extension<CurrentUser>,
    Path(post_id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<VideoImported>>, AppError> {
    authorize_action(
        &state,
        &user,
        &headers,
        Capability::EditPosts,
        actions::FETCH_YOUTUBE_DATA,
    )?;

    let post = timeout_query(posts::get(&state.db, post_id)).await?;
    ensure_supported(state.config.strategy, &post)?;

    let mut record = videos::find(&state.db, post_id)
        .await?
        .filter(|r| r.is_video)
        .ok_or_else(|| AppError::Validation("Video features are not enabled for this post".to_string()))?;

    let video_id = match (record.provider, record.provider_id.as_deref()) {
        (Some(Provider::YouTube), Some(id)) => id.to_string(),
        _ => return Err(AppError::Validation("Invalid YouTube URL".to_string())),
    };

    let settings = settings::load(&state.db).await?;
    let metadata = state
        .youtube
        .fetch_video(&video_id, settings.youtube_api_key.as_ref())
        .await?;

    fill_from_provider(&mut record, &metadata);
    record.updated_at = Utc::now();
    timeout_query(videos::save(&state.db, &record)).await?;

    Ok(ApiResponse::success(VideoImported {
        video: record,
        metadata,
    }))
}
