use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
};

use crate::api::common::utils::timeout_query;
use crate::errors::AppError;
use crate::store::videos;
use crate::video::sitemap::{build_sitemap, SitemapEntry};
use crate::InnerState;

#[tracing::instrument(name = "Render video sitemap", skip(state))]
pub async fn video_sitemap(State(state): State<InnerState>) -> Result<impl IntoResponse, AppError> {
    let rows = timeout_query(videos::published_video_posts(&state.db, state.config.strategy)).await?;

    let entries: Vec<SitemapEntry> = rows
        .iter()
        .map(|row| SitemapEntry::from_parts(&row.post, &row.video, &state.config.site_url))
        .collect();

    tracing::debug!("Sitemap contains {} entries", entries.len());

    Ok((
        [(header::CONTENT_TYPE, "application/xml; charset=utf-8")],
        build_sitemap(&entries),
    ))
}
