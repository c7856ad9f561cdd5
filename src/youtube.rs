//! YouTube Data API client used to fill in video metadata.
//!
//! One `videos.list` call per lookup (1 quota unit). Failures are never
//! retried; each kind of failure maps to its own message for the editor.

use chrono::{DateTime, NaiveDate};
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::config::ProviderConfig;
use crate::errors::AppError;
use crate::video::classifier::parse_duration;

#[derive(Debug, Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoItem {
    id: String,
    snippet: Option<VideoSnippet>,
    content_details: Option<ContentDetails>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoSnippet {
    published_at: Option<String>,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    thumbnails: Thumbnails,
}

#[derive(Debug, Default, Deserialize)]
struct Thumbnails {
    high: Option<Thumbnail>,
    maxres: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ContentDetails {
    duration: String,
}

/// Metadata returned to editors and used to fill empty record fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderMetadata {
    pub title: String,
    pub description: String,
    pub thumbnail: Option<String>,
    pub duration: i64,
    pub upload_date: Option<NaiveDate>,
    pub youtube_id: String,
}

impl From<VideoItem> for ProviderMetadata {
    fn from(item: VideoItem) -> Self {
        let snippet = item.snippet;
        let duration = item
            .content_details
            .as_ref()
            .map(|cd| parse_duration(&cd.duration))
            .unwrap_or(0);

        let (title, description, thumbnail, upload_date) = match snippet {
            Some(s) => {
                let thumbnail = s
                    .thumbnails
                    .maxres
                    .or(s.thumbnails.high)
                    .map(|t| t.url);
                let upload_date = s
                    .published_at
                    .as_deref()
                    .and_then(|p| DateTime::parse_from_rfc3339(p).ok())
                    .map(|d| d.date_naive());
                (s.title, s.description, thumbnail, upload_date)
            }
            None => (String::new(), String::new(), None, None),
        };

        ProviderMetadata {
            title,
            description,
            thumbnail,
            duration,
            upload_date,
            youtube_id: item.id,
        }
    }
}

#[derive(Debug, Clone)]
pub struct YoutubeClient {
    http_client: Client,
    base_url: String,
}

impl YoutubeClient {
    pub fn new(config: &ProviderConfig) -> anyhow::Result<Self> {
        let http_client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http_client,
            base_url: config.youtube_api_base.trim_end_matches('/').to_string(),
        })
    }

    #[tracing::instrument(name = "Fetch YouTube video", skip(self, api_key))]
    pub async fn fetch_video(
        &self,
        video_id: &str,
        api_key: Option<&Secret<String>>,
    ) -> Result<ProviderMetadata, AppError> {
        let api_key = api_key
            .map(|k| k.expose_secret().trim())
            .filter(|k| !k.is_empty())
            .ok_or_else(|| AppError::ExternalService(anyhow::anyhow!("YouTube API key not configured")))?;

        let url = url::Url::parse_with_params(
            &format!("{}/videos", self.base_url),
            &[
                ("part", "snippet,contentDetails"),
                ("id", video_id),
                ("key", api_key),
            ],
        )
        .map_err(|e| AppError::Unexpected(anyhow::anyhow!("Invalid YouTube API base URL: {}", e)))?;

        let response = self.http_client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            error!("YouTube API returned {}", status);
            return Err(AppError::ExternalService(anyhow::anyhow!(
                "YouTube API error: {}",
                status.as_u16()
            )));
        }

        let data: VideoListResponse = response.json().await?;

        let item = data
            .items
            .into_iter()
            .next()
            .ok_or_else(|| AppError::ExternalService(anyhow::anyhow!("Video not found")))?;

        info!("Fetched metadata for YouTube video {}", item.id);
        Ok(item.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Query, http::StatusCode, routing::get, Json, Router};
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::time::Duration;

    async fn videos(Query(params): Query<HashMap<String, String>>) -> (StatusCode, Json<Value>) {
        if params.get("key").map(String::as_str) != Some("good-key") {
            return (StatusCode::FORBIDDEN, Json(json!({ "error": { "code": 403 } })));
        }

        match params.get("id").map(String::as_str) {
            Some("dQw4w9WgXcQ") => (
                StatusCode::OK,
                Json(json!({
                    "items": [{
                        "id": "dQw4w9WgXcQ",
                        "snippet": {
                            "publishedAt": "2009-10-25T06:57:33Z",
                            "title": "Never Gonna Give You Up",
                            "description": "The official video.",
                            "thumbnails": {
                                "high": { "url": "https://i.ytimg.com/vi/dQw4w9WgXcQ/hqdefault.jpg" },
                                "maxres": { "url": "https://i.ytimg.com/vi/dQw4w9WgXcQ/maxresdefault.jpg" }
                            }
                        },
                        "contentDetails": { "duration": "PT3M33S" }
                    }]
                })),
            ),
            _ => (StatusCode::OK, Json(json!({ "items": [] }))),
        }
    }

    async fn mock_client() -> YoutubeClient {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new().route("/videos", get(videos));
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        YoutubeClient::new(&ProviderConfig {
            youtube_api_base: format!("http://{}", addr),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    fn key(value: &str) -> Secret<String> {
        Secret::new(value.to_string())
    }

    #[tokio::test]
    async fn fetches_and_maps_metadata() {
        let client = mock_client().await;
        let meta = client.fetch_video("dQw4w9WgXcQ", Some(&key("good-key"))).await.unwrap();

        assert_eq!(meta.title, "Never Gonna Give You Up");
        assert_eq!(meta.duration, 213);
        assert_eq!(meta.upload_date, NaiveDate::from_ymd_opt(2009, 10, 25));
        assert_eq!(
            meta.thumbnail.as_deref(),
            Some("https://i.ytimg.com/vi/dQw4w9WgXcQ/maxresdefault.jpg")
        );
        assert_eq!(meta.youtube_id, "dQw4w9WgXcQ");
    }

    #[tokio::test]
    async fn missing_key_is_reported_without_a_request() {
        let client = mock_client().await;
        let err = client.fetch_video("dQw4w9WgXcQ", None).await.unwrap_err();
        assert_eq!(err.user_message(), "YouTube API key not configured");

        let err = client.fetch_video("dQw4w9WgXcQ", Some(&key("  "))).await.unwrap_err();
        assert_eq!(err.user_message(), "YouTube API key not configured");
    }

    #[tokio::test]
    async fn empty_items_is_video_not_found() {
        let client = mock_client().await;
        let err = client.fetch_video("aaaaaaaaaaa", Some(&key("good-key"))).await.unwrap_err();
        assert_eq!(err.user_message(), "Video not found");
    }

    #[tokio::test]
    async fn non_success_status_is_reported() {
        let client = mock_client().await;
        let err = client.fetch_video("dQw4w9WgXcQ", Some(&key("bad-key"))).await.unwrap_err();
        assert_eq!(err.user_message(), "YouTube API error: 403");
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn transport_failure_is_reported() {
        let client = YoutubeClient::new(&ProviderConfig {
            youtube_api_base: "http://127.0.0.1:9".to_string(),
            timeout: Duration::from_secs(2),
        })
        .unwrap();
        let err = client.fetch_video("dQw4w9WgXcQ", Some(&key("good-key"))).await.unwrap_err();
        assert!(err.user_message().starts_with("Failed to fetch YouTube data"));
        assert!(!err.user_message().contains("good-key"));
    }
}
