use axum::{extract::State, http::HeaderMap, Extension, Json};
use serde::Deserialize;

use crate::api::common::extractors::ApiJson;
use crate::api::common::middleware::CurrentUser;
use crate::api::common::ApiResponse;
use crate::authentication::claims::Capability;
use crate::errors::AppError;
use crate::store::settings;
use crate::video::classifier::extract_youtube_id;
use crate::youtube::ProviderMetadata;
use crate::InnerState;

use super::{actions, authorize_action};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchRequest {
    pub url: String,
}

/// Looks up a YouTube URL and returns its metadata without storing anything.
#[tracing::instrument(name = "Fetch YouTube data", skip_all)]
pub async fn fetch_youtube_data(
    State(state): State<InnerState>,
    Extension(user): Extension<CurrentUser>,
    headers: HeaderMap,
    ApiJson(request): ApiJson<FetchRequest>,
) -> Result<Json<ApiResponse<ProviderMetadata>>, AppError> {
    authorize_action(
        &state,
        &user,
        &headers,
        Capability::EditPosts,
        actions::FETCH_YOUTUBE_DATA,
    )?;

    let video_id = extract_youtube_id(&request.url)
        .ok_or_else(|| AppError::Validation("Invalid YouTube URL".to_string()))?;

    let settings = settings::load(&state.db).await?;
    let metadata = state
        .youtube
        .fetch_video(&video_id, settings.youtube_api_key.as_ref())
        .await?;

    Ok(ApiResponse::success(metadata))
}
