//! SEO title/description synthesis.

use once_cell::sync::Lazy;
use regex::Regex;

pub const TITLE_SUFFIX: &str = " - Watch Now | Video";
pub const TITLE_MAX_CHARS: usize = 60;
pub const DESCRIPTION_CUT_CHARS: usize = 152;
pub const DESCRIPTION_ELLIPSIS: &str = "...";
pub const EXCERPT_WORDS: usize = 55;

static SCRIPT_STYLE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<script[^>]*?>.*?</script>|<style[^>]*?>.*?</style>")
        .expect("Failed to compile script/style regex")
});

static TAG_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<[^>]*>").expect("Failed to compile tag regex"));

/// Removes every tag, dropping script and style bodies entirely, and trims.
pub fn strip_markup(html: &str) -> String {
    let without_code = SCRIPT_STYLE_REGEX.replace_all(html, "");
    TAG_REGEX.replace_all(&without_code, "").trim().to_string()
}

/// Title plus the fixed suffix, cut at 60 characters even mid-word.
pub fn seo_title(raw_title: &str) -> String {
    format!("{}{}", raw_title, TITLE_SUFFIX)
        .chars()
        .take(TITLE_MAX_CHARS)
        .collect()
}

/// Stripped content, cut at 152 characters plus `...` when longer. Empty
/// content falls back to a sentence built from the title.
pub fn seo_description(raw_title: &str, raw_content: &str) -> String {
    let content = strip_markup(raw_content);

    if content.chars().count() > DESCRIPTION_CUT_CHARS {
        let mut description: String = content.chars().take(DESCRIPTION_CUT_CHARS).collect();
        description.push_str(DESCRIPTION_ELLIPSIS);
        description
    } else if content.is_empty() {
        format!("Watch {}", raw_title)
    } else {
        content
    }
}

/// Host-style automatic excerpt: the first 55 words of the stripped content.
pub fn auto_excerpt(raw_content: &str) -> String {
    let content = strip_markup(raw_content);
    let words: Vec<&str> = content.split_whitespace().collect();

    if words.len() > EXCERPT_WORDS {
        format!("{} [...]", words[..EXCERPT_WORDS].join(" "))
    } else {
        words.join(" ")
    }
}

/// Caller-wins merge: a non-blank user value is kept, otherwise the generated
/// value is used.
pub fn resolve_field(user_value: Option<&str>, generated: impl FnOnce() -> String) -> String {
    match user_value.map(str::trim) {
        Some(value) if !value.is_empty() => value.to_string(),
        _ => generated(),
    }
}
