use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use std::collections::HashMap;

use crate::config::ContentStrategy;
use crate::errors::AppError;
use crate::store::posts::Post;
use crate::video::VideoRecord;

const RECORD_COLUMNS: &str = "post_id, is_video, video_url, provider, provider_id, duration_seconds, \
     upload_date, thumbnail_url, seo_title, seo_description, updated_at";

pub async fn find(db: &SqlitePool, post_id: i64) -> Result<Option<VideoRecord>, AppError> {
    let record = sqlx::query_as::<_, VideoRecord>(&format!(
        "SELECT {} FROM video_records WHERE post_id = ?",
        RECORD_COLUMNS
    ))
    .bind(post_id)
    .fetch_optional(db)
    .await?;

    Ok(record)
}

/// Records for a set of posts, keyed by post id.
pub async fn find_many(db: &SqlitePool, post_ids: &[i64]) -> Result<HashMap<i64, VideoRecord>, AppError> {
    if post_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let placeholders = vec!["?"; post_ids.len()].join(", ");
    let sql = format!(
        "SELECT {} FROM video_records WHERE post_id IN ({})",
        RECORD_COLUMNS, placeholders
    );

    let mut query = sqlx::query_as::<_, VideoRecord>(&sql);
    for id in post_ids {
        query = query.bind(id);
    }

    let records = query.fetch_all(db).await?;
    Ok(records.into_iter().map(|r| (r.post_id, r)).collect())
}

#[tracing::instrument(name = "Save video record", skip(db, record), fields(post_id = record.post_id, is_video = record.is_video))]
pub async fn save(db: &SqlitePool, record: &VideoRecord) -> Result<(), AppError> {
    sqlx::query(
        r#"INSERT INTO video_records
               (post_id, is_video, video_url, provider, provider_id, duration_seconds,
                upload_date, thumbnail_url, seo_title, seo_description, updated_at)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
           ON CONFLICT(post_id) DO UPDATE SET
               is_video = excluded.is_video,
               video_url = excluded.video_url,
               provider = excluded.provider,
               provider_id = excluded.provider_id,
               duration_seconds = excluded.duration_seconds,
               upload_date = excluded.upload_date,
               thumbnail_url = excluded.thumbnail_url,
               seo_title = excluded.seo_title,
               seo_description = excluded.seo_description,
               updated_at = excluded.updated_at"#,
    )
    .bind(record.post_id)
    .bind(record.is_video)
    .bind(&record.video_url)
    .bind(record.provider)
    .bind(&record.provider_id)
    .bind(record.duration_seconds)
    .bind(record.upload_date)
    .bind(&record.thumbnail_url)
    .bind(&record.seo_title)
    .bind(&record.seo_description)
    .bind(record.updated_at)
    .execute(db)
    .await?;

    Ok(())
}

/// Turns the video flag on, creating an empty record when none exists yet.
pub async fn enable(db: &SqlitePool, post_id: i64, now: DateTime<Utc>) -> Result<VideoRecord, AppError> {
    let mut record = find(db, post_id)
        .await?
        .unwrap_or_else(|| VideoRecord::new(post_id, now));
    record.is_video = true;
    record.updated_at = now;
    save(db, &record).await?;
    Ok(record)
}

#[derive(Debug, Clone, FromRow)]
pub struct VideoPost {
    #[sqlx(flatten)]
    pub post: Post,
    #[sqlx(flatten)]
    pub video: VideoRecord,
}

/// Published, video-bearing posts in the host's listing order. Posts without
/// a stored record carry no video data and are left out.
pub async fn published_video_posts(
    db: &SqlitePool,
    strategy: ContentStrategy,
) -> Result<Vec<VideoPost>, AppError> {
    let rows = sqlx::query_as::<_, VideoPost>(
        r#"SELECT p.id, p.post_type, p.title, p.content, p.excerpt, p.status, p.slug,
                  p.featured_image_url, p.published_at,
                  v.post_id, v.is_video, v.video_url, v.provider, v.provider_id, v.duration_seconds,
                  v.upload_date, v.thumbnail_url, v.seo_title, v.seo_description, v.updated_at
           FROM posts p
           JOIN video_records v ON v.post_id = p.id
           WHERE p.status = 'publish'
             AND p.post_type = ?
             AND (v.is_video = 1 OR ? = 1)
           ORDER BY p.published_at DESC, p.id DESC"#,
    )
    .bind(strategy.post_type())
    .bind(strategy == ContentStrategy::DedicatedType)
    .fetch_all(db)
    .await?;

    Ok(rows)
}
