use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

use crate::config::DatabaseConfig;

const SCHEMA: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS posts (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        post_type TEXT NOT NULL DEFAULT 'post',
        title TEXT NOT NULL DEFAULT '',
        content TEXT NOT NULL DEFAULT '',
        excerpt TEXT,
        status TEXT NOT NULL DEFAULT 'draft',
        slug TEXT NOT NULL,
        featured_image_url TEXT,
        published_at DATETIME NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS video_records (
        post_id INTEGER PRIMARY KEY,
        is_video BOOLEAN NOT NULL DEFAULT 0,
        video_url TEXT,
        provider TEXT,
        provider_id TEXT,
        duration_seconds INTEGER,
        upload_date DATE,
        thumbnail_url TEXT,
        seo_title TEXT,
        seo_description TEXT,
        updated_at DATETIME NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS video_analytics (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        post_id INTEGER NOT NULL,
        user_id INTEGER,
        session_id TEXT NOT NULL,
        recorded_at DATETIME NOT NULL,
        watch_time INTEGER NOT NULL DEFAULT 0,
        completed BOOLEAN NOT NULL DEFAULT 0,
        user_agent TEXT NOT NULL DEFAULT '',
        ip_address TEXT NOT NULL DEFAULT ''
    )"#,
    "CREATE UNIQUE INDEX IF NOT EXISTS video_analytics_post_session ON video_analytics (post_id, session_id)",
    "CREATE INDEX IF NOT EXISTS video_analytics_recorded_at ON video_analytics (recorded_at)",
    r#"CREATE TABLE IF NOT EXISTS settings (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    )"#,
];

#[tracing::instrument(name = "init_db", skip(config), fields(url = %config.url))]
pub async fn init_db(config: &DatabaseConfig) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&config.url)?.create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(options)
        .await?;

    migrate(&pool).await?;
    tracing::info!("Database ready");

    Ok(pool)
}

/// Creates the schema if it does not exist yet. Safe to run on every start.
pub async fn migrate(pool: &SqlitePool) -> anyhow::Result<()> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}

#[cfg(test)]
pub async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database");
    migrate(&pool).await.expect("Failed to create schema");
    pool
}
