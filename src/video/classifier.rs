//! Video URL classification.
//!
//! Turns whatever an editor pasted (a watch URL, a short link, an embed
//! snippet, a direct file link) into a provider and the provider's native id.
//! Nothing here fails: input that matches no provider is `Unknown`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Matches every YouTube URL shape we accept, including inside an iframe `src`.
/// Repeats stay inside a single URL so the first URL in free text wins.
static YOUTUBE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)(?:youtube\.com/(?:[^/\s"'<>]+/[^\s"'<>]+?/|(?:v|e(?:mbed)?|shorts)/|[^\s"'<>]*?[?&]v=)|youtu\.be/)([A-Za-z0-9_-]{11})"#,
    )
    .expect("Failed to compile YouTube regex")
});

static VIMEO_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)vimeo\.com/(?:video/)?(\d+)").expect("Failed to compile Vimeo regex")
});

static DIRECT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\.(mp4|webm|ogg|mov|avi|m4v|flv)(?:[?#][^\s]*)?$")
        .expect("Failed to compile direct video regex")
});

static DURATION_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"PT(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?").expect("Failed to compile duration regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Provider {
    YouTube,
    Vimeo,
    Direct,
    Unknown,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::YouTube => "youtube",
            Provider::Vimeo => "vimeo",
            Provider::Direct => "direct",
            Provider::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedUrl {
    pub provider: Provider,
    pub native_id: Option<String>,
}

impl ClassifiedUrl {
    fn unknown() -> Self {
        Self {
            provider: Provider::Unknown,
            native_id: None,
        }
    }
}

/// Classifies a URL or a content fragment. YouTube wins over Vimeo, which wins
/// over a direct file link.
pub fn classify(input: &str) -> ClassifiedUrl {
    let input = input.trim();
    if input.is_empty() {
        return ClassifiedUrl::unknown();
    }

    if let Some(id) = extract_youtube_id(input) {
        return ClassifiedUrl {
            provider: Provider::YouTube,
            native_id: Some(id),
        };
    }

    if let Some(id) = extract_vimeo_id(input) {
        return ClassifiedUrl {
            provider: Provider::Vimeo,
            native_id: Some(id),
        };
    }

    if DIRECT_REGEX.is_match(input) {
        return ClassifiedUrl {
            provider: Provider::Direct,
            native_id: None,
        };
    }

    ClassifiedUrl::unknown()
}

pub fn extract_youtube_id(input: &str) -> Option<String> {
    YOUTUBE_REGEX
        .captures(input)
        .and_then(|caps| caps.get(1).map(|m| m.as_str().to_owned()))
}

pub fn extract_vimeo_id(input: &str) -> Option<String> {
    VIMEO_REGEX
        .captures(input)
        .and_then(|caps| caps.get(1).map(|m| m.as_str().to_owned()))
}

/// Converts an ISO-8601 `PT#H#M#S` duration into seconds. Missing components
/// count as zero and anything unparseable is zero.
pub fn parse_duration(duration: &str) -> i64 {
    let Some(caps) = DURATION_REGEX.captures(duration) else {
        return 0;
    };

    let component = |idx: usize| -> i64 {
        caps.get(idx)
            .and_then(|m| m.as_str().parse::<i64>().ok())
            .unwrap_or(0)
    };

    component(1)
        .checked_mul(3600)
        .and_then(|hours| component(2).checked_mul(60).and_then(|minutes| hours.checked_add(minutes)))
        .and_then(|total| total.checked_add(component(3)))
        .unwrap_or(0)
}

/// `PT<seconds>S`, the form used by the sitemap and schema markup.
pub fn format_iso_duration(seconds: i64) -> String {
    format!("PT{}S", seconds)
}
