use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use serde_json::Value;

use crate::api::common::utils::timeout_query;
use crate::api::common::ApiResponse;
use crate::errors::AppError;
use crate::store::{posts, settings, videos};
use crate::video::player::{auto_embed, render_player, video_schema};
use crate::video::video_enabled;
use crate::InnerState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub post_id: i64,
    pub video_enabled: bool,
    pub player: String,
    pub schema: Option<Value>,
    pub content: String,
}

/// Public rendering data for a published post.
#[tracing::instrument(name = "Render player", skip(state))]
pub async fn render(
    State(state): State<InnerState>,
    Path(post_id): Path<i64>,
) -> Result<Json<ApiResponse<PlayerView>>, AppError> {
    let post = timeout_query(posts::get(&state.db, post_id)).await?;
    if !post.is_published() {
        return Err(AppError::NotFound(format!("Post {} not found", post_id)));
    }

    let record = videos::find(&state.db, post_id).await?;
    let settings = settings::load(&state.db).await?;
    let enabled = video_enabled(state.config.strategy, &post, record.as_ref());

    let player = match (&record, enabled) {
        (Some(record), true) => render_player(record),
        _ => String::new(),
    };

    Ok(ApiResponse::success(PlayerView {
        post_id,
        video_enabled: enabled,
        player,
        schema: video_schema(&post, record.as_ref(), enabled),
        content: auto_embed(&post.content, record.as_ref(), enabled, &settings),
    }))
}
