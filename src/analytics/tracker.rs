use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

use crate::config::ContentStrategy;
use crate::errors::AppError;

const MAX_SESSION_ID_CHARS: usize = 255;

/// Who the viewer appears to be. Captured on the first submission of a
/// session and never overwritten afterwards.
#[derive(Debug, Clone, Default)]
pub struct IdentityHints {
    pub user_id: Option<i64>,
    pub ip_address: String,
    pub user_agent: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewSubmission {
    pub post_id: i64,
    pub session_id: String,
    #[serde(default)]
    pub watch_time: i64,
    #[serde(default)]
    pub completed: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewAck {
    pub recorded: bool,
}

/// A stored row, read back by tests to check upsert semantics.
#[cfg(test)]
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct ViewEvent {
    pub id: i64,
    pub post_id: i64,
    pub user_id: Option<i64>,
    pub session_id: String,
    pub recorded_at: DateTime<Utc>,
    pub watch_time: i64,
    pub completed: bool,
    pub user_agent: String,
    pub ip_address: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PostStats {
    pub view_count: i64,
    pub avg_watch_time: f64,
    pub completion_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PostAnalytics {
    pub post_id: i64,
    pub title: String,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub stats: PostStats,
}

fn validate(submission: &ViewSubmission) -> Result<(), AppError> {
    let session_id = submission.session_id.trim();
    if session_id.is_empty() {
        return Err(AppError::Validation("session_id is required".to_string()));
    }
    if session_id.chars().count() > MAX_SESSION_ID_CHARS {
        return Err(AppError::Validation(format!(
            "session_id must be at most {} characters",
            MAX_SESSION_ID_CHARS
        )));
    }
    if submission.watch_time < 0 {
        return Err(AppError::Validation("watch_time must not be negative".to_string()));
    }
    Ok(())
}

/// Records one view event, keyed by `(post_id, session_id)`.
///
/// A repeat submission overwrites `watch_time` and `completed` with the latest
/// values, even when the watch time is lower than the stored one.
#[tracing::instrument(
    name = "Record video view",
    skip(db, submission, hints, now),
    fields(post_id = submission.post_id, session_id = %submission.session_id)
)]
pub async fn record(
    db: &SqlitePool,
    submission: &ViewSubmission,
    hints: &IdentityHints,
    now: DateTime<Utc>,
) -> Result<ViewAck, AppError> {
    validate(submission)?;

    sqlx::query(
        r#"INSERT INTO video_analytics
               (post_id, user_id, session_id, recorded_at, watch_time, completed, user_agent, ip_address)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?)
           ON CONFLICT(post_id, session_id) DO UPDATE SET
               watch_time = excluded.watch_time,
               completed = excluded.completed"#,
    )
    .bind(submission.post_id)
    .bind(hints.user_id)
    .bind(submission.session_id.trim())
    .bind(now)
    .bind(submission.watch_time)
    .bind(submission.completed)
    .bind(&hints.user_agent)
    .bind(&hints.ip_address)
    .execute(db)
    .await?;

    Ok(ViewAck { recorded: true })
}

#[cfg(test)]
pub async fn find_event(db: &SqlitePool, post_id: i64, session_id: &str) -> Result<Option<ViewEvent>, AppError> {
    let event = sqlx::query_as::<_, ViewEvent>(
        r#"SELECT id, post_id, user_id, session_id, recorded_at, watch_time, completed, user_agent, ip_address
           FROM video_analytics
           WHERE post_id = ? AND session_id = ?"#,
    )
    .bind(post_id)
    .bind(session_id)
    .fetch_optional(db)
    .await?;

    Ok(event)
}

/// Aggregates for one post. A post nobody watched yields all zeros.
pub async fn post_stats(db: &SqlitePool, post_id: i64) -> Result<PostStats, AppError> {
    let stats = sqlx::query_as::<_, PostStats>(
        r#"SELECT COUNT(id) AS view_count,
                  CAST(COALESCE(AVG(watch_time), 0) AS REAL) AS avg_watch_time,
                  CAST(COALESCE(100.0 * SUM(completed) / COUNT(id), 0) AS REAL) AS completion_rate
           FROM video_analytics
           WHERE post_id = ?"#,
    )
    .bind(post_id)
    .fetch_one(db)
    .await?;

    Ok(stats)
}

/// Aggregates for every video post, most viewed first.
pub async fn dashboard(db: &SqlitePool, strategy: ContentStrategy) -> Result<Vec<PostAnalytics>, AppError> {
    let rows = sqlx::query_as::<_, PostAnalytics>(
        r#"SELECT p.id AS post_id,
                  p.title AS title,
                  COUNT(a.id) AS view_count,
                  CAST(COALESCE(AVG(a.watch_time), 0) AS REAL) AS avg_watch_time,
                  CAST(COALESCE(100.0 * SUM(a.completed) / COUNT(a.id), 0) AS REAL) AS completion_rate
           FROM posts p
           LEFT JOIN video_records v ON v.post_id = p.id
           LEFT JOIN video_analytics a ON a.post_id = p.id
           WHERE p.post_type = ?
             AND (? = 1 OR v.is_video = 1)
           GROUP BY p.id, p.title
           ORDER BY view_count DESC, p.id DESC"#,
    )
    .bind(strategy.post_type())
    .bind(strategy == ContentStrategy::DedicatedType)
    .fetch_all(db)
    .await?;

    Ok(rows)
}

/// Deletes view rows whose post no longer exists and returns how many went.
#[tracing::instrument(name = "Cleanup orphaned analytics", skip(db))]
pub async fn cleanup_orphans(db: &SqlitePool) -> Result<u64, AppError> {
    let result = sqlx::query(
        "DELETE FROM video_analytics WHERE post_id NOT IN (SELECT id FROM posts)",
    )
    .execute(db)
    .await?;

    let deleted = result.rows_affected();
    tracing::info!("Removed {} orphaned analytics rows", deleted);
    Ok(deleted)
}
