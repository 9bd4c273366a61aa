//! HTML meta tag extraction.
//!
//! Reads the page title and publication time from Open Graph, Twitter
//! card, Dublin Core and article meta tags.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use dom_query::{Document, Selection};

use crate::dom;
use crate::result::PageMetadata;

/// Meta names carrying the page title.
const TITLE_NAMES: &[&str] = &[
    "og:title",
    "twitter:title",
    "dc.title",
    "sailthru.title",
    "parsely-title",
];

/// Meta names carrying the publication time.
const PUBLISHED_NAMES: &[&str] = &[
    "article:published_time",
    "og:article:published_time",
    "article:published",
    "article.published",
    "article:created",
    "dc.date",
    "dc.date.issued",
    "dcterms.date",
    "dcterms.created",
    "datepublished",
    "sailthru.date",
    "parsely-pub-date",
    "pubdate",
    "publish_date",
    "publishdate",
];

/// Examine `<meta>` tags. The first usable value of each field wins.
#[must_use]
pub fn examine_meta(doc: &Document) -> PageMetadata {
    let mut result = PageMetadata::default();

    for node in doc.select("meta").nodes() {
        let meta = Selection::from(*node);

        let name = dom::get_attribute(&meta, "property")
            .or_else(|| dom::get_attribute(&meta, "name"))
            .or_else(|| dom::get_attribute(&meta, "itemprop"))
            .unwrap_or_default()
            .trim()
            .to_lowercase();
        let content = dom::get_attribute(&meta, "content").unwrap_or_default();
        let content = content.trim();
        if name.is_empty() || content.is_empty() {
            continue;
        }

        if result.title.is_none() && TITLE_NAMES.contains(&name.as_str()) {
            result.title = Some(content.to_string());
        } else if result.published.is_none() && PUBLISHED_NAMES.contains(&name.as_str()) {
            result.published = parse_meta_date(content);
        }
    }

    result
}

/// Parse a date string from meta tags or JSON-LD.
///
/// Supports RFC 3339, ISO 8601 without an offset, and common date-only
/// formats. Date-only values are taken as midnight UTC.
#[must_use]
pub fn parse_meta_date(date_str: &str) -> Option<DateTime<Utc>> {
    let date_str = date_str.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(date_str) {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(date_str, fmt) {
            return Some(dt.and_utc());
        }
    }

    let formats = [
        "%Y-%m-%d",
        "%Y/%m/%d",
        "%d/%m/%Y",
        "%B %d, %Y", // January 15, 2024
        "%b %d, %Y", // Jan 15, 2024
        "%d %B %Y",  // 15 January 2024
    ];
    for fmt in formats {
        if let Ok(date) = NaiveDate::parse_from_str(date_str, fmt) {
            return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
        }
    }

    None
}
