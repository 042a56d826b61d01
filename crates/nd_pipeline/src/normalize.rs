//! Markup cleanup and timestamp formatting for raw search items.

use chrono::{DateTime, Datelike, FixedOffset, Timelike};
use nd_core::{ArticleRecord, Error, RawArticle, Result, NOISE};
use regex::Regex;
use scraper::Html;
use std::sync::OnceLock;

fn tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"<[^>]*>").expect("valid tag pattern"))
}

/// Resolve HTML entities, then remove every tag.
///
/// Decoding runs first so that escaped markup such as `&lt;b&gt;` is
/// stripped too instead of surviving as a literal `<b>`.
pub fn clean_html(raw: &str) -> String {
    let decoded: String = Html::parse_fragment(raw).root_element().text().collect();
    tag_pattern().replace_all(&decoded, "").trim().to_string()
}

/// Render an RFC 2822 timestamp (`Mon, 14 Apr 2025 09:30:00 +0900`) as
/// `2025.04.14. 오전 9:30`, using the wall-clock time of its own offset.
pub fn format_published_at(raw: &str) -> Result<String> {
    let parsed: DateTime<FixedOffset> = DateTime::parse_from_rfc2822(raw.trim())
        .map_err(|e| Error::Normalization(format!("invalid pubDate {:?}: {}", raw, e)))?;

    let hour = parsed.hour();
    let meridiem = if hour < 12 { "오전" } else { "오후" };
    let hour12 = match hour {
        0 => 12,
        1..=12 => hour,
        _ => hour - 12,
    };

    Ok(format!(
        "{}.{:02}.{:02}. {} {}:{:02}",
        parsed.year(),
        parsed.month(),
        parsed.day(),
        meridiem,
        hour12,
        parsed.minute()
    ))
}

/// Build a clean record from a raw search item. Fails on a malformed timestamp.
pub fn normalize_record(raw: &RawArticle) -> Result<ArticleRecord> {
    let title = clean_html(&raw.title);
    let description = clean_html(&raw.description);
    let normalized_published_at = format_published_at(&raw.pub_date)?;
    let original_link = raw
        .original_link
        .as_deref()
        .map(str::trim)
        .filter(|link| !link.is_empty())
        .map(str::to_string);

    Ok(ArticleRecord {
        composite_text: format!("{} {}", title, description),
        title,
        description,
        raw_published_at: raw.pub_date.clone(),
        normalized_published_at,
        original_link,
        processed_text: String::new(),
        cluster_id: NOISE,
    })
}
