use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::errors::AppError;

const YOUTUBE_API_KEY: &str = "youtube_api_key";
const ENABLE_ANALYTICS: &str = "enable_analytics";
const AUTO_EMBED: &str = "auto_embed";

/// Runtime settings, editable by administrators and read on every request
/// that depends on them.
#[derive(Debug)]
pub struct Settings {
    pub youtube_api_key: Option<Secret<String>>,
    pub enable_analytics: bool,
    pub auto_embed: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            youtube_api_key: None,
            enable_analytics: true,
            auto_embed: true,
        }
    }
}

impl Settings {
    /// Shape returned to administrators: the key itself never leaves the store.
    pub fn public_view(&self) -> SettingsView {
        let masked = self.youtube_api_key.as_ref().map(|key| {
            let key = key.expose_secret();
            let tail: String = key.chars().skip(key.chars().count().saturating_sub(4)).collect();
            format!("****{}", tail)
        });

        SettingsView {
            youtube_api_key: masked,
            has_youtube_api_key: self.youtube_api_key.is_some(),
            enable_analytics: self.enable_analytics,
            auto_embed: self.auto_embed,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsView {
    pub youtube_api_key: Option<String>,
    pub has_youtube_api_key: bool,
    pub enable_analytics: bool,
    pub auto_embed: bool,
}

/// Partial update; absent fields keep their stored value. An empty API key
/// removes the stored key.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdate {
    pub youtube_api_key: Option<String>,
    pub enable_analytics: Option<bool>,
    pub auto_embed: Option<bool>,
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim(), "1" | "true" | "yes" | "on")
}

pub async fn load(db: &SqlitePool) -> Result<Settings, AppError> {
    let rows: Vec<(String, String)> = sqlx::query_as("SELECT key, value FROM settings")
        .fetch_all(db)
        .await?;

    let mut settings = Settings::default();
    for (key, value) in rows {
        match key.as_str() {
            YOUTUBE_API_KEY if !value.trim().is_empty() => {
                settings.youtube_api_key = Some(Secret::new(value));
            }
            ENABLE_ANALYTICS => settings.enable_analytics = parse_flag(&value),
            AUTO_EMBED => settings.auto_embed = parse_flag(&value),
            _ => {}
        }
    }

    Ok(settings)
}

async fn put(db: &SqlitePool, key: &str, value: &str) -> Result<(), AppError> {
    sqlx::query(
        "INSERT INTO settings (key, value) VALUES (?, ?) ON CONFLICT(key) DO UPDATE SET value = excluded.value",
    )
    .bind(key)
    .bind(value)
    .execute(db)
    .await?;
    Ok(())
}

#[tracing::instrument(name = "Save settings", skip(db, update))]
pub async fn save(db: &SqlitePool, update: &SettingsUpdate) -> Result<Settings, AppError> {
    if let Some(key) = &update.youtube_api_key {
        let key = key.trim();
        if key.is_empty() {
            sqlx::query("DELETE FROM settings WHERE key = ?")
                .bind(YOUTUBE_API_KEY)
                .execute(db)
                .await?;
        } else {
            put(db, YOUTUBE_API_KEY, key).await?;
        }
    }

    if let Some(enabled) = update.enable_analytics {
        put(db, ENABLE_ANALYTICS, if enabled { "1" } else { "0" }).await?;
    }

    if let Some(enabled) = update.auto_embed {
        put(db, AUTO_EMBED, if enabled { "1" } else { "0" }).await?;
    }

    load(db).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    #[tokio::test]
    async fn defaults_when_nothing_is_stored() {
        let db = test_pool().await;
        let settings = load(&db).await.unwrap();
        assert!(settings.youtube_api_key.is_none());
        assert!(settings.enable_analytics);
        assert!(settings.auto_embed);
    }

    #[tokio::test]
    async fn partial_updates_keep_other_values() {
        let db = test_pool().await;

        save(
            &db,
            &SettingsUpdate {
                youtube_api_key: Some("AIzaSyExampleKey1234".to_string()),
                enable_analytics: Some(false),
                auto_embed: None,
            },
        )
        .await
        .unwrap();

        let settings = save(
            &db,
            &SettingsUpdate {
                auto_embed: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(
            settings.youtube_api_key.as_ref().map(|k| k.expose_secret().as_str()),
            Some("AIzaSyExampleKey1234")
        );
        assert!(!settings.enable_analytics);
        assert!(!settings.auto_embed);
    }

    #[tokio::test]
    async fn blank_key_clears_the_stored_key() {
        let db = test_pool().await;
        save(
            &db,
            &SettingsUpdate {
                youtube_api_key: Some("secret-key".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let settings = save(
            &db,
            &SettingsUpdate {
                youtube_api_key: Some(" ".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert!(settings.youtube_api_key.is_none());
    }

    #[test]
    fn public_view_masks_the_key() {
        let settings = Settings {
            youtube_api_key: Some(Secret::new("AIzaSyExampleKey1234".to_string())),
            ..Default::default()
        };
        let view = settings.public_view();
        assert_eq!(view.youtube_api_key.as_deref(), Some("****1234"));
        assert!(view.has_youtube_api_key);

        let json = serde_json::to_string(&view).unwrap();
        assert!(!json.contains("AIzaSy"));
    }
}
