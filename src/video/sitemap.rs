//! Video sitemap generation.

use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt::{self, Write};

use super::classifier::format_iso_duration;
use super::{escape_markup, VideoRecord};
use crate::store::posts::Post;

const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";
const VIDEO_NS: &str = "http://www.google.com/schemas/sitemap-video/1.1";

/// One `<url>` entry, projected from a post and its video record.
#[derive(Debug, Clone, PartialEq)]
pub struct SitemapEntry {
    pub loc: String,
    pub thumbnail_loc: String,
    pub title: String,
    pub description: String,
    pub content_loc: String,
    pub duration_seconds: Option<i64>,
    pub publication_date: DateTime<Utc>,
}

impl SitemapEntry {
    pub fn from_parts(post: &Post, record: &VideoRecord, site_url: &str) -> Self {
        let thumbnail_loc = record
            .thumbnail_url
            .clone()
            .filter(|t| !t.trim().is_empty())
            .or_else(|| post.featured_image_url.clone())
            .unwrap_or_default();

        let description = record
            .seo_description
            .clone()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| post.excerpt_or_auto());

        Self {
            loc: post.permalink(site_url),
            thumbnail_loc,
            title: post.title.clone(),
            description,
            content_loc: record.video_url.clone().unwrap_or_default(),
            duration_seconds: record.positive_duration(),
            publication_date: post.published_at,
        }
    }
}

/// Renders entries in the order given.
pub fn build_sitemap(entries: &[SitemapEntry]) -> String {
    let mut xml = String::with_capacity(256 + entries.len() * 512);
    // Writing into a String cannot fail.
    let _ = write_sitemap(&mut xml, entries);
    xml
}

fn write_sitemap(xml: &mut String, entries: &[SitemapEntry]) -> fmt::Result {
    writeln!(xml, "<?xml version=\"1.0\" encoding=\"UTF-8\"?>")?;
    writeln!(xml, "<urlset xmlns=\"{}\" xmlns:video=\"{}\">", SITEMAP_NS, VIDEO_NS)?;
    for entry in entries {
        write_entry(xml, entry)?;
    }
    writeln!(xml, "</urlset>")
}

fn write_entry(xml: &mut String, entry: &SitemapEntry) -> fmt::Result {
    writeln!(xml, "  <url>")?;
    writeln!(xml, "    <loc>{}</loc>", escape_markup(&entry.loc))?;
    writeln!(xml, "    <video:video>")?;
    writeln!(
        xml,
        "      <video:thumbnail_loc>{}</video:thumbnail_loc>",
        escape_markup(&entry.thumbnail_loc)
    )?;
    writeln!(xml, "      <video:title>{}</video:title>", escape_markup(&entry.title))?;
    writeln!(
        xml,
        "      <video:description>{}</video:description>",
        escape_markup(&entry.description)
    )?;
    writeln!(
        xml,
        "      <video:content_loc>{}</video:content_loc>",
        escape_markup(&entry.content_loc)
    )?;
    if let Some(seconds) = entry.duration_seconds.filter(|d| *d > 0) {
        writeln!(xml, "      <video:duration>{}</video:duration>", format_iso_duration(seconds))?;
    }
    writeln!(
        xml,
        "      <video:publication_date>{}</video:publication_date>",
        entry.publication_date.to_rfc3339_opts(SecondsFormat::Secs, false)
    )?;
    writeln!(xml, "    </video:video>")?;
    writeln!(xml, "  </url>")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::tests::sample_post;
    use chrono::TimeZone;

    fn record(post_id: i64) -> VideoRecord {
        let mut record = VideoRecord::new(post_id, Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 0).unwrap());
        record.is_video = true;
        record.video_url = Some("https://youtu.be/dQw4w9WgXcQ".to_string());
        record.seo_description = Some("Rick & friends".to_string());
        record
    }

    #[test]
    fn thumbnail_falls_back_to_featured_image() {
        let post = sample_post(1, "post");
        let entry = SitemapEntry::from_parts(&post, &record(1), "https://example.com");
        assert_eq!(entry.thumbnail_loc, "https://example.com/featured.jpg");

        let mut with_thumb = record(1);
        with_thumb.thumbnail_url = Some("https://i.ytimg.com/vi/x/hq.jpg".to_string());
        let entry = SitemapEntry::from_parts(&post, &with_thumb, "https://example.com");
        assert_eq!(entry.thumbnail_loc, "https://i.ytimg.com/vi/x/hq.jpg");
    }

    #[test]
    fn description_falls_back_to_excerpt() {
        let post = sample_post(1, "post");
        let mut bare = record(1);
        bare.seo_description = None;
        let entry = SitemapEntry::from_parts(&post, &bare, "https://example.com");
        assert_eq!(entry.description, "The official video for the 1987 single.");
    }

    #[test]
    fn zero_duration_is_omitted() {
        let post = sample_post(1, "post");
        let mut zero = record(1);
        zero.duration_seconds = Some(0);
        let xml = build_sitemap(&[SitemapEntry::from_parts(&post, &zero, "https://example.com")]);
        assert!(!xml.contains("<video:duration>"));

        let mut timed = record(1);
        timed.duration_seconds = Some(212);
        let xml = build_sitemap(&[SitemapEntry::from_parts(&post, &timed, "https://example.com")]);
        assert!(xml.contains("<video:duration>PT212S</video:duration>"));
    }

    #[test]
    fn renders_escaped_entries_in_given_order() {
        let first = sample_post(1, "post");
        let mut second = sample_post(2, "post");
        second.slug = "second".to_string();

        let xml = build_sitemap(&[
            SitemapEntry::from_parts(&second, &record(2), "https://example.com"),
            SitemapEntry::from_parts(&first, &record(1), "https://example.com"),
        ]);

        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains(SITEMAP_NS) && xml.contains(VIDEO_NS));
        assert!(xml.contains("<video:description>Rick &amp; friends</video:description>"));
        assert!(xml.contains("<video:publication_date>2024-03-01T12:00:00+00:00</video:publication_date>"));

        let second_at = xml.find("https://example.com/second/").unwrap();
        let first_at = xml.find("https://example.com/never-gonna/").unwrap();
        assert!(second_at < first_at);
    }

    #[test]
    fn empty_sitemap_is_still_valid() {
        let xml = build_sitemap(&[]);
        assert!(xml.contains("<urlset"));
        assert!(xml.trim_end().ends_with("</urlset>"));
        assert!(!xml.contains("<url>"));
    }
}
