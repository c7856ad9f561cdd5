use axum::{extract::State, http::HeaderMap, Extension, Json};
use serde::Serialize;

use crate::api::common::middleware::CurrentUser;
use crate::api::common::utils::timeout_query;
use crate::api::common::ApiResponse;
use crate::authentication::claims::Capability;
use crate::config::ContentStrategy;
use crate::errors::AppError;
use crate::store::posts::{self, Post};
use crate::store::videos;
use crate::video::classifier::{classify, Provider};
use crate::video::{video_enabled, VideoRecord};
use crate::InnerState;

use super::{actions, authorize_action};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScannedVideo {
    pub id: i64,
    pub title: String,
    pub url: Option<String>,
    pub has_video_url: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PotentialVideo {
    pub id: i64,
    pub title: String,
    pub provider: Provider,
    pub native_id: Option<String>,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanReport {
    pub total_scanned: usize,
    pub video_posts: Vec<ScannedVideo>,
    pub potential_video_posts: Vec<PotentialVideo>,
}

/// Splits posts into video posts and posts whose content embeds a hosted
/// video without the video features being turned on.
pub fn scan_posts(
    strategy: ContentStrategy,
    posts: &[Post],
    records: &std::collections::HashMap<i64, VideoRecord>,
) -> ScanReport {
    let mut report = ScanReport {
        total_scanned: posts.len(),
        ..Default::default()
    };

    for post in posts {
        let record = records.get(&post.id);

        if video_enabled(strategy, post, record) {
            report.video_posts.push(ScannedVideo {
                id: post.id,
                title: post.title.clone(),
                url: record.and_then(|r| r.video_url.clone()),
                has_video_url: record.is_some_and(|r| r.has_url()),
            });
            continue;
        }

        let classified = classify(&post.content);
        if matches!(classified.provider, Provider::YouTube | Provider::Vimeo) {
            report.potential_video_posts.push(PotentialVideo {
                id: post.id,
                title: post.title.clone(),
                provider: classified.provider,
                native_id: classified.native_id,
            });
        }
    }

    report
}

#[tracing::instrument(name = "Scan video posts", skip_all)]
pub async fn scan(
    State(state): State<InnerState>,
    Extension(user): Extension<CurrentUser>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<ScanReport>>, AppError> {
    authorize_action(
        &state,
        &user,
        &headers,
        Capability::ManageOptions,
        actions::SCAN_VIDEO_POSTS,
    )?;

    let strategy = state.config.strategy;
    let posts = timeout_query(posts::list_by_type(&state.db, strategy.post_type())).await?;
    let ids: Vec<i64> = posts.iter().map(|p| p.id).collect();
    let records = timeout_query(videos::find_many(&state.db, &ids)).await?;

    let report = scan_posts(strategy, &posts, &records);
    tracing::info!(
        scanned = report.total_scanned,
        videos = report.video_posts.len(),
        potential = report.potential_video_posts.len(),
        "Scan finished"
    );

    Ok(ApiResponse::success(report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::tests::sample_post;
    use chrono::Utc;
    use std::collections::HashMap;

    #[test]
    fn separates_video_and_potential_posts() {
        let video_post = sample_post(1, "post");
        let mut embedded = sample_post(2, "post");
        embedded.content = r#"<iframe src="https://www.youtube.com/embed/dQw4w9WgXcQ"></iframe>"#.to_string();
        let plain = sample_post(3, "post");

        let mut record = VideoRecord::new(1, Utc::now());
        record.is_video = true;
        let records = HashMap::from([(1, record)]);

        let report = scan_posts(
            ContentStrategy::FlaggedPost,
            &[video_post, embedded, plain],
            &records,
        );

        assert_eq!(report.total_scanned, 3);
        assert_eq!(report.video_posts.len(), 1);
        assert!(!report.video_posts[0].has_video_url);
        assert_eq!(report.potential_video_posts.len(), 1);
        assert_eq!(report.potential_video_posts[0].id, 2);
        assert_eq!(report.potential_video_posts[0].native_id.as_deref(), Some("dQw4w9WgXcQ"));
    }
}
