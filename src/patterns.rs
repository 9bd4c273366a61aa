//! Compiled regex patterns, vocabularies and selectors shared by the
//! cleaner, the pruner, the strategies and the post-processor.
//!
//! All patterns are compiled once on first use via `LazyLock`.

#![allow(clippy::expect_used)]

use std::sync::LazyLock;

use regex::Regex;

// =============================================================================
// Boilerplate Detection Patterns
// =============================================================================

/// Matches class/id tokens indicating navigation elements.
///
/// "nav" is anchored to a token edge so layout wrappers such as
/// `in-page-nav-container` are not treated as menus.
pub static NAVIGATION_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(^nav$|^nav[-_]|[-_]nav$|navbar|navigation|top[-_]?nav|main[-_]?menu|site[-_]?nav|\bmenu\b|site[-_]?footer|site[-_]?header|breadcrumb(?:s)?|pagination|pager)",
    )
    .expect("NAVIGATION_CLASS regex")
});

/// Matches class/id tokens that are exactly an advertisement marker.
pub static ADVERTISEMENT_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(ad|ads|advert|advertisement|sponsor|sponsored|promo|promotion|banner)$")
        .expect("ADVERTISEMENT_CLASS regex")
});

/// Matches class/id tokens of sections that sit next to an article but are
/// not part of it.
pub static BOILERPLATE_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(comment|shar(?:e|ing)|social|related|recommend(?:ed)?|\bfooter\b|sidebar|widget|copyright|more[-_]?stories|also[-_]?read|read[-_]?more|cookie|consent|newsletter|subscribe|popup|modal|overlay|lightbox|author[-_]?(?:box|bio)|tag[-_]?cloud|trending|most[-_]?read)",
    )
    .expect("BOILERPLATE_CLASS regex")
});

// =============================================================================
// Scoring Vocabularies
// =============================================================================

/// Class/id word parts that signal article content.
pub const CONTENT_POSITIVE_WORDS: &[&str] = &[
    "content", "article", "post", "story", "body", "entry", "main", "text", "blog", "news",
];

/// Class/id word parts that signal page furniture.
pub const CONTENT_NEGATIVE_WORDS: &[&str] = &[
    "sidebar", "widget", "promo", "ad", "ads", "advert", "advertisement", "related", "nav",
    "navbar", "menu", "footer", "banner", "social", "share", "comment", "comments", "popup",
    "modal", "cookie", "newsletter", "subscribe", "sponsored", "breadcrumb", "breadcrumbs",
    "pagination", "tracking", "analytics",
];

/// Splits a class/id token into its `-`/`_` separated word parts.
pub fn token_parts(token: &str) -> impl Iterator<Item = &str> {
    token.split(['-', '_']).filter(|p| !p.is_empty())
}

// =============================================================================
// Visibility Patterns
// =============================================================================

/// Inline styles that hide an element.
pub static HIDDEN_STYLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)display\s*:\s*none|visibility\s*:\s*hidden").expect("HIDDEN_STYLE regex")
});

// =============================================================================
// Markdown Patterns
// =============================================================================

/// A level-1 ATX heading line.
pub static H1_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*#\s+(.+?)(?:\s+#+)?\s*$").expect("H1_LINE regex"));

/// An ATX heading of any level.
pub static HEADING_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s{0,3}#{1,6}(\s|$)").expect("HEADING_LINE regex"));

/// An ordered list item marker.
pub static ORDERED_LIST_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\d+[.)]\s").expect("ORDERED_LIST_ITEM regex"));

/// An unordered list item marker.
pub static UNORDERED_LIST_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[-*+]\s").expect("UNORDERED_LIST_ITEM regex"));

/// Matches multiple consecutive newlines.
pub static MULTIPLE_NEWLINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("MULTIPLE_NEWLINES regex"));

// =============================================================================
// Title Patterns
// =============================================================================

/// Matches multiple whitespace characters for normalization.
pub static WHITESPACE_NORMALIZE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("WHITESPACE_NORMALIZE regex"));

/// Characters that are unsafe in a document title used as a file name.
pub static TITLE_UNSAFE_CHARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"[<>:"/\\|?*\x00-\x1F]"#).expect("TITLE_UNSAFE_CHARS regex")
});

/// Characters dropped when deriving a name from a URL.
pub static URL_NAME_UNSAFE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9._ -]+").expect("URL_NAME_UNSAFE_CHARS regex"));

/// Separators between an article title and the site name in `<title>`.
pub static TITLE_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+[\|–—·]\s+|\s+-\s+|\s*\|\s*").expect("TITLE_SEPARATOR regex"));

// =============================================================================
// Sentence Detection
// =============================================================================

/// Sentence terminators followed by whitespace or end of text.
pub static SENTENCE_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?](\s|$)").expect("SENTENCE_END regex"));

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn navigation_class_matches_nav_elements() {
        assert!(NAVIGATION_CLASS.is_match("main-nav"));
        assert!(NAVIGATION_CLASS.is_match("site-footer"));
        assert!(NAVIGATION_CLASS.is_match("breadcrumbs"));
        assert!(!NAVIGATION_CLASS.is_match("in-page-nav-container"));
        assert!(!NAVIGATION_CLASS.is_match("article-content"));
    }

    #[test]
    fn advertisement_class_is_exact() {
        assert!(ADVERTISEMENT_CLASS.is_match("ads"));
        assert!(!ADVERTISEMENT_CLASS.is_match("header"));
    }

    #[test]
    fn boilerplate_class_matches_rails() {
        assert!(BOILERPLATE_CLASS.is_match("related-posts"));
        assert!(BOILERPLATE_CLASS.is_match("cookie-banner"));
        assert!(!BOILERPLATE_CLASS.is_match("post-content"));
    }

    #[test]
    fn token_parts_split_on_separators() {
        let parts: Vec<&str> = token_parts("post-content_part").collect();
        assert_eq!(parts, vec!["post", "content", "part"]);
    }

    #[test]
    fn hidden_style_detects_display_none() {
        assert!(HIDDEN_STYLE.is_match("color: red; display:none"));
        assert!(HIDDEN_STYLE.is_match("visibility: hidden"));
        assert!(!HIDDEN_STYLE.is_match("display: block"));
    }

    #[test]
    fn h1_line_captures_title() {
        let caps = H1_LINE.captures("  # Hello World  ").unwrap();
        assert_eq!(&caps[1], "Hello World");
        assert!(H1_LINE.captures("## Not H1").is_none());
    }

    #[test]
    fn whitespace_normalize_collapses_spaces() {
        let result = WHITESPACE_NORMALIZE.replace_all("hello   world", " ");
        assert_eq!(result, "hello world");
    }
}
