//! Video metadata attached to content items.

pub mod classifier;
pub mod player;
pub mod seo;
pub mod sitemap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::config::ContentStrategy;
use crate::store::posts::Post;
use classifier::{classify, Provider};
use seo::resolve_field;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct VideoRecord {
    pub post_id: i64,
    pub is_video: bool,
    pub video_url: Option<String>,
    pub provider: Option<Provider>,
    pub provider_id: Option<String>,
    pub duration_seconds: Option<i64>,
    pub upload_date: Option<NaiveDate>,
    pub thumbnail_url: Option<String>,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl VideoRecord {
    pub fn new(post_id: i64, now: DateTime<Utc>) -> Self {
        Self {
            post_id,
            is_video: false,
            video_url: None,
            provider: None,
            provider_id: None,
            duration_seconds: None,
            upload_date: None,
            thumbnail_url: None,
            seo_title: None,
            seo_description: None,
            updated_at: now,
        }
    }

    pub fn has_url(&self) -> bool {
        self.video_url.as_deref().is_some_and(|u| !u.trim().is_empty())
    }

    fn seo_complete(&self) -> bool {
        let filled = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        filled(&self.seo_title) && filled(&self.seo_description)
    }

    /// Duration worth advertising; zero counts as unknown.
    pub fn positive_duration(&self) -> Option<i64> {
        self.duration_seconds.filter(|d| *d > 0)
    }
}

/// Where a content item sits in its video lifecycle. Disabling the flag drops
/// back to `NotVideo` while the stored metadata stays in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoLifecycle {
    NotVideo,
    VideoEnabled,
    UrlSet,
    SeoComplete,
}

/// Whether the item carries video features under the configured strategy.
pub fn video_enabled(strategy: ContentStrategy, post: &Post, record: Option<&VideoRecord>) -> bool {
    match strategy {
        ContentStrategy::FlaggedPost => {
            post.post_type == strategy.post_type() && record.is_some_and(|r| r.is_video)
        }
        ContentStrategy::DedicatedType => post.post_type == strategy.post_type(),
    }
}

pub fn lifecycle(strategy: ContentStrategy, post: &Post, record: Option<&VideoRecord>) -> VideoLifecycle {
    if !video_enabled(strategy, post, record) {
        return VideoLifecycle::NotVideo;
    }

    match record {
        Some(r) if r.has_url() && r.seo_complete() => VideoLifecycle::SeoComplete,
        Some(r) if r.has_url() => VideoLifecycle::UrlSet,
        _ => VideoLifecycle::VideoEnabled,
    }
}

/// Fields submitted by an editor. `None` means "not submitted" and keeps the
/// stored value; a submitted blank string clears it, except for the SEO fields,
/// which are regenerated instead.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSubmission {
    #[serde(default)]
    pub is_video: bool,
    pub video_url: Option<String>,
    pub provider_id: Option<String>,
    pub duration_seconds: Option<i64>,
    pub upload_date: Option<NaiveDate>,
    pub thumbnail_url: Option<String>,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Applies a submission on top of the stored record.
///
/// When video is disabled only the flag changes. Otherwise the URL is
/// classified, an explicit provider id overrides the extracted one, and the
/// SEO fields go through [`resolve_field`] so that editor input always wins.
pub fn merge_submission(
    strategy: ContentStrategy,
    post: &Post,
    existing: Option<VideoRecord>,
    submission: &VideoSubmission,
    now: DateTime<Utc>,
) -> VideoRecord {
    let mut record = existing.unwrap_or_else(|| VideoRecord::new(post.id, now));
    record.updated_at = now;
    record.is_video = match strategy {
        ContentStrategy::FlaggedPost => submission.is_video,
        ContentStrategy::DedicatedType => true,
    };

    if !record.is_video {
        return record;
    }

    if let Some(url) = &submission.video_url {
        record.video_url = non_blank(url);
        match &record.video_url {
            Some(url) => {
                let classified = classify(url);
                record.provider = Some(classified.provider);
                record.provider_id = classified.native_id;
            }
            None => {
                record.provider = None;
                record.provider_id = None;
            }
        }
    }

    if let Some(explicit) = submission.provider_id.as_deref().and_then(non_blank) {
        record.provider_id = Some(explicit);
    }

    if let Some(duration) = submission.duration_seconds {
        record.duration_seconds = Some(duration);
    }

    if let Some(date) = submission.upload_date {
        record.upload_date = Some(date);
    }

    if let Some(thumbnail) = &submission.thumbnail_url {
        record.thumbnail_url = non_blank(thumbnail);
    }

    let seo_title = submission.seo_title.as_deref().or(record.seo_title.as_deref());
    record.seo_title = Some(resolve_field(seo_title, || seo::seo_title(&post.title)));

    let seo_description = submission
        .seo_description
        .as_deref()
        .or(record.seo_description.as_deref());
    record.seo_description = Some(resolve_field(seo_description, || {
        seo::seo_description(&post.title, &post.content)
    }));

    record
}

/// Escapes text for use inside HTML/XML element content and attribute values.
pub(crate) fn escape_markup(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
