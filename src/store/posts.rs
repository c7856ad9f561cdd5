use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

use crate::errors::AppError;
use crate::video::seo::auto_excerpt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: i64,
    pub post_type: String,
    pub title: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub status: String,
    pub slug: String,
    pub featured_image_url: Option<String>,
    pub published_at: DateTime<Utc>,
}

impl Post {
    pub fn permalink(&self, site_url: &str) -> String {
        format!("{}/{}/", site_url.trim_end_matches('/'), self.slug)
    }

    pub fn is_published(&self) -> bool {
        self.status == "publish"
    }

    /// Manual excerpt when the author wrote one, automatic otherwise.
    pub fn excerpt_or_auto(&self) -> String {
        match self.excerpt.as_deref().map(str::trim) {
            Some(excerpt) if !excerpt.is_empty() => excerpt.to_string(),
            _ => auto_excerpt(&self.content),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    #[serde(default = "default_post_type")]
    pub post_type: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub excerpt: Option<String>,
    #[serde(default = "default_status")]
    pub status: String,
    pub slug: Option<String>,
    pub featured_image_url: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

fn default_post_type() -> String {
    "post".to_string()
}

fn default_status() -> String {
    "draft".to_string()
}

/// Lowercase ASCII slug built from the title, words joined by `-`.
pub fn slugify(title: &str) -> String {
    title
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(|part| part.to_ascii_lowercase())
        .collect::<Vec<_>>()
        .join("-")
}

#[tracing::instrument(name = "Create post", skip(db, new_post), fields(title = %new_post.title))]
pub async fn create(db: &SqlitePool, new_post: &NewPost, now: DateTime<Utc>) -> Result<Post, AppError> {
    let slug = new_post
        .slug
        .as_deref()
        .map(slugify)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| slugify(&new_post.title));

    let post = sqlx::query_as::<_, Post>(
        r#"INSERT INTO posts (post_type, title, content, excerpt, status, slug, featured_image_url, published_at)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?)
           RETURNING id, post_type, title, content, excerpt, status, slug, featured_image_url, published_at"#,
    )
    .bind(&new_post.post_type)
    .bind(&new_post.title)
    .bind(&new_post.content)
    .bind(&new_post.excerpt)
    .bind(&new_post.status)
    .bind(slug)
    .bind(&new_post.featured_image_url)
    .bind(new_post.published_at.unwrap_or(now))
    .fetch_one(db)
    .await?;

    tracing::debug!("Created post {}", post.id);
    Ok(post)
}

pub async fn find(db: &SqlitePool, post_id: i64) -> Result<Option<Post>, AppError> {
    let post = sqlx::query_as::<_, Post>(
        r#"SELECT id, post_type, title, content, excerpt, status, slug, featured_image_url, published_at
           FROM posts WHERE id = ?"#,
    )
    .bind(post_id)
    .fetch_optional(db)
    .await?;

    Ok(post)
}

/// Like [`find`] but a missing post is a `NotFound` error.
pub async fn get(db: &SqlitePool, post_id: i64) -> Result<Post, AppError> {
    find(db, post_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Post {} not found", post_id)))
}

/// Every post of one type regardless of status, newest first.
pub async fn list_by_type(db: &SqlitePool, post_type: &str) -> Result<Vec<Post>, AppError> {
    let posts = sqlx::query_as::<_, Post>(
        r#"SELECT id, post_type, title, content, excerpt, status, slug, featured_image_url, published_at
           FROM posts
           WHERE post_type = ?
           ORDER BY published_at DESC, id DESC"#,
    )
    .bind(post_type)
    .fetch_all(db)
    .await?;

    Ok(posts)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::db::test_pool;
    use chrono::TimeZone;

    pub(crate) fn new_post(title: &str, post_type: &str, status: &str) -> NewPost {
        NewPost {
            post_type: post_type.to_string(),
            title: title.to_string(),
            content: format!("<p>All about {}.</p>", title),
            excerpt: None,
            status: status.to_string(),
            slug: None,
            featured_image_url: Some(format!("https://example.com/{}.jpg", slugify(title))),
            published_at: None,
        }
    }

    #[test]
    fn slugify_collapses_punctuation() {
        assert_eq!(slugify("Hello, World! Rust 2024"), "hello-world-rust-2024");
        assert_eq!(slugify("  --  "), "");
    }

    #[test]
    fn permalink_uses_site_url() {
        let post = crate::video::tests::sample_post(1, "post");
        assert_eq!(post.permalink("https://example.com/"), "https://example.com/never-gonna/");
    }

    #[test]
    fn manual_excerpt_wins_over_auto_excerpt() {
        let mut post = crate::video::tests::sample_post(1, "post");
        assert_eq!(post.excerpt_or_auto(), "The official video for the 1987 single.");
        post.excerpt = Some("Hand picked".to_string());
        assert_eq!(post.excerpt_or_auto(), "Hand picked");
    }

    #[tokio::test]
    async fn create_and_find_round_trip() {
        let db = test_pool().await;
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();

        let created = create(&db, &new_post("First Clip", "post", "publish"), now).await.unwrap();
        assert_eq!(created.slug, "first-clip");
        assert_eq!(created.published_at, now);

        let found = get(&db, created.id).await.unwrap();
        assert_eq!(found, created);

        let missing = get(&db, created.id + 100).await.unwrap_err();
        assert!(matches!(missing, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn list_by_type_orders_newest_first() {
        let db = test_pool().await;
        let older = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let newer = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();

        let a = create(&db, &new_post("Older", "post", "publish"), older).await.unwrap();
        let b = create(&db, &new_post("Newer", "post", "publish"), newer).await.unwrap();
        let c = create(&db, &new_post("Draft", "post", "draft"), newer).await.unwrap();
        create(&db, &new_post("Other type", "video", "publish"), newer).await.unwrap();

        let ids: Vec<i64> = list_by_type(&db, "post").await.unwrap().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![c.id, b.id, a.id]);
    }
}
