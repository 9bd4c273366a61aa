//! Page metadata read from the HTML itself.
//!
//! Used when the fetch layer supplies no title or publication time. The
//! sources are tried in order: JSON-LD, meta tags, then the `<title>`
//! element.

pub mod json_ld;
pub mod meta_tags;

use dom_query::Document;

use crate::dom;
use crate::patterns::{TITLE_SEPARATOR, WHITESPACE_NORMALIZE};
use crate::result::PageMetadata;

pub use json_ld::extract_json_ld;
pub use meta_tags::{examine_meta, parse_meta_date};

/// A `<title>` part must be longer than this to replace the full title.
const MIN_TITLE_PART_CHARS: usize = 10;

/// Extract metadata from raw HTML.
#[must_use]
pub fn extract_page_metadata(html: &str) -> PageMetadata {
    if html.trim().is_empty() {
        return PageMetadata::default();
    }
    extract_metadata(&dom::parse(html))
}

/// Extract metadata from a parsed document.
#[must_use]
pub fn extract_metadata(doc: &Document) -> PageMetadata {
    let mut metadata = extract_json_ld(doc).or(examine_meta(doc));
    if metadata.title.is_none() {
        metadata.title = examine_title_element(doc);
    }
    metadata
}

/// Title from the `<title>` element, with the site name split off.
///
/// `Story headline | Example News` becomes `Story headline`. The longest
/// part is used when it has more than ten characters; otherwise the full
/// title is kept.
#[must_use]
pub fn examine_title_element(doc: &Document) -> Option<String> {
    let raw = doc
        .select("title")
        .nodes()
        .first()
        .map(|node| node.text())
        .unwrap_or_default();
    let title = WHITESPACE_NORMALIZE.replace_all(raw.trim(), " ").to_string();
    if title.is_empty() {
        return None;
    }

    let parts: Vec<&str> = TITLE_SEPARATOR.split(&title).map(str::trim).collect();
    if parts.len() > 1 {
        if let Some(longest) = parts.iter().max_by_key(|p| p.chars().count()) {
            if longest.chars().count() > MIN_TITLE_PART_CHARS {
                return Some((*longest).to_string());
            }
        }
    }
    Some(title)
}
