//! Player markup, auto-embedding and schema.org markup for video posts.

use chrono::SecondsFormat;
use serde_json::{json, Map, Value};

use super::classifier::{classify, format_iso_duration, Provider};
use super::{escape_markup, VideoRecord};
use crate::store::posts::Post;
use crate::store::settings::Settings;

fn provider_and_id(record: &VideoRecord) -> (Provider, Option<String>) {
    let url = record.video_url.as_deref().unwrap_or_default();
    match (record.provider, record.provider_id.clone()) {
        (Some(provider), Some(id)) => (provider, Some(id)),
        _ => {
            let classified = classify(url);
            (classified.provider, classified.native_id)
        }
    }
}

/// Embed URL for hosted providers. Direct files have none.
pub fn embed_url(record: &VideoRecord) -> Option<String> {
    match provider_and_id(record) {
        (Provider::YouTube, Some(id)) => Some(format!("https://www.youtube.com/embed/{}?rel=0", id)),
        (Provider::Vimeo, Some(id)) => Some(format!("https://player.vimeo.com/video/{}", id)),
        _ => None,
    }
}

/// Player fragment for the record's URL; empty when there is no URL.
pub fn render_player(record: &VideoRecord) -> String {
    if !record.has_url() {
        return String::new();
    }

    if let Some(src) = embed_url(record) {
        return format!(
            concat!(
                "<div class=\"video-seo-player video-seo-embed\">",
                "<iframe src=\"{}\" frameborder=\"0\" ",
                "allow=\"accelerometer; autoplay; encrypted-media; gyroscope; picture-in-picture\" ",
                "allowfullscreen></iframe></div>"
            ),
            escape_markup(&src)
        );
    }

    let url = record.video_url.as_deref().unwrap_or_default().trim();
    let poster = record
        .thumbnail_url
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .map(|t| format!(" poster=\"{}\"", escape_markup(t)))
        .unwrap_or_default();

    format!(
        "<div class=\"video-seo-player\"><video controls preload=\"metadata\"{}><source src=\"{}\" type=\"video/mp4\"></video></div>",
        poster,
        escape_markup(url)
    )
}

/// Prepends the player to post content when auto-embedding applies.
pub fn auto_embed(content: &str, record: Option<&VideoRecord>, enabled: bool, settings: &Settings) -> String {
    if !enabled || !settings.auto_embed {
        return content.to_string();
    }

    match record.map(render_player).filter(|player| !player.is_empty()) {
        Some(player) => format!("{}\n{}", player, content),
        None => content.to_string(),
    }
}

/// schema.org `VideoObject` describing the post's video.
pub fn video_schema(post: &Post, record: Option<&VideoRecord>, enabled: bool) -> Option<Value> {
    let record = record.filter(|r| enabled && r.has_url())?;

    let description = record
        .seo_description
        .clone()
        .filter(|d| !d.trim().is_empty())
        .unwrap_or_else(|| post.excerpt_or_auto());

    let thumbnail = record
        .thumbnail_url
        .clone()
        .filter(|t| !t.trim().is_empty())
        .or_else(|| post.featured_image_url.clone());

    let upload_date = match record.upload_date {
        Some(date) => date.format("%Y-%m-%d").to_string(),
        None => post.published_at.to_rfc3339_opts(SecondsFormat::Secs, false),
    };

    let mut schema = Map::new();
    schema.insert("@context".into(), json!("https://schema.org"));
    schema.insert("@type".into(), json!("VideoObject"));
    schema.insert("name".into(), json!(post.title));
    schema.insert("description".into(), json!(description));
    if let Some(thumbnail) = thumbnail {
        schema.insert("thumbnailUrl".into(), json!(thumbnail));
    }
    schema.insert("uploadDate".into(), json!(upload_date));
    schema.insert("contentUrl".into(), json!(record.video_url));
    if let Some(embed) = embed_url(record) {
        schema.insert("embedUrl".into(), json!(embed));
    }
    if let Some(seconds) = record.positive_duration() {
        schema.insert("duration".into(), json!(format_iso_duration(seconds)));
    }

    Some(Value::Object(schema))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::tests::sample_post;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn record(url: &str) -> VideoRecord {
        let mut record = VideoRecord::new(1, Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 0).unwrap());
        record.is_video = true;
        let classified = classify(url);
        record.video_url = Some(url.to_string());
        record.provider = Some(classified.provider);
        record.provider_id = classified.native_id;
        record
    }

    #[test]
    fn youtube_renders_an_iframe() {
        let html = render_player(&record("https://www.youtube.com/watch?v=dQw4w9WgXcQ"));
        assert!(html.contains("<iframe src=\"https://www.youtube.com/embed/dQw4w9WgXcQ?rel=0\""));
    }

    #[test]
    fn vimeo_renders_the_vimeo_player() {
        let html = render_player(&record("https://vimeo.com/76979871"));
        assert!(html.contains("https://player.vimeo.com/video/76979871"));
    }

    #[test]
    fn direct_files_render_a_video_element() {
        let mut direct = record("https://cdn.example.com/clip.mp4?a=1&b=2");
        direct.thumbnail_url = Some("https://cdn.example.com/poster.jpg".to_string());
        let html = render_player(&direct);
        assert!(html.contains("<video controls"));
        assert!(html.contains("poster=\"https://cdn.example.com/poster.jpg\""));
        assert!(html.contains("src=\"https://cdn.example.com/clip.mp4?a=1&amp;b=2\" type=\"video/mp4\""));
    }

    #[test]
    fn missing_url_renders_nothing() {
        let mut empty = record("https://youtu.be/dQw4w9WgXcQ");
        empty.video_url = None;
        assert_eq!(render_player(&empty), "");
    }

    #[test]
    fn auto_embed_prepends_when_enabled() {
        let rec = record("https://youtu.be/dQw4w9WgXcQ");
        let settings = Settings::default();

        let embedded = auto_embed("<p>Body</p>", Some(&rec), true, &settings);
        assert!(embedded.starts_with("<div class=\"video-seo-player"));
        assert!(embedded.ends_with("<p>Body</p>"));

        assert_eq!(auto_embed("<p>Body</p>", Some(&rec), false, &settings), "<p>Body</p>");

        let off = Settings {
            auto_embed: false,
            ..Default::default()
        };
        assert_eq!(auto_embed("<p>Body</p>", Some(&rec), true, &off), "<p>Body</p>");
        assert_eq!(auto_embed("<p>Body</p>", None, true, &settings), "<p>Body</p>");
    }

    #[test]
    fn schema_uses_fallbacks() {
        let post = sample_post(1, "post");
        let rec = record("https://youtu.be/dQw4w9WgXcQ");

        let schema = video_schema(&post, Some(&rec), true).unwrap();
        assert_eq!(schema["@type"], "VideoObject");
        assert_eq!(schema["name"], "Never Gonna Give You Up");
        assert_eq!(schema["description"], "The official video for the 1987 single.");
        assert_eq!(schema["thumbnailUrl"], "https://example.com/featured.jpg");
        assert_eq!(schema["uploadDate"], "2024-03-01T12:00:00+00:00");
        assert_eq!(schema["embedUrl"], "https://www.youtube.com/embed/dQw4w9WgXcQ?rel=0");
        assert!(schema.get("duration").is_none());
    }

    #[test]
    fn schema_prefers_record_values() {
        let post = sample_post(1, "post");
        let mut rec = record("https://cdn.example.com/clip.mp4");
        rec.duration_seconds = Some(95);
        rec.upload_date = NaiveDate::from_ymd_opt(2023, 12, 24);
        rec.thumbnail_url = Some("https://cdn.example.com/poster.jpg".to_string());
        rec.seo_description = Some("Custom".to_string());

        let schema = video_schema(&post, Some(&rec), true).unwrap();
        assert_eq!(schema["duration"], "PT95S");
        assert_eq!(schema["uploadDate"], "2023-12-24");
        assert_eq!(schema["thumbnailUrl"], "https://cdn.example.com/poster.jpg");
        assert_eq!(schema["description"], "Custom");
        assert_eq!(schema["contentUrl"], "https://cdn.example.com/clip.mp4");
        assert!(schema.get("embedUrl").is_none());
    }

    #[test]
    fn no_schema_without_video() {
        let post = sample_post(1, "post");
        let rec = record("https://youtu.be/dQw4w9WgXcQ");
        assert!(video_schema(&post, Some(&rec), false).is_none());
        assert!(video_schema(&post, None, true).is_none());
    }
}
