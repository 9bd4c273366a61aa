//! HTML noise cleaner.
//!
//! Removes page furniture from a raw document. The steps run in this order:
//!
//! 1. comments and non-content tags;
//! 2. denylisted structure (navigation, ads, sharing, comments, related
//!    rails, consent banners, overlays);
//! 3. hidden elements;
//! 4. empty shells.
//!
//! Steps 2 to 4 repeat until a round removes nothing. Cleaning never fails
//! and is idempotent.

use std::sync::LazyLock;

use dom_query::{Document, NodeRef, Selection};
use tracing::debug;

use crate::dom;
use crate::tree;

/// Subtrees that never carry readable content.
pub const REMOVE_TAGS: &[&str] = &[
    "script", "style", "noscript", "svg", "canvas", "math", "iframe", "object", "embed", "applet",
    "meta", "link", "template",
];

/// Structural tags dropped wholesale.
const STRUCTURAL_NOISE_TAGS: &[&str] = &["nav", "aside"];

/// Site headers and footers. Matches inside an `article` or `main` are the
/// article's own and are kept.
const PAGE_CHROME_SELECTORS: &[&str] = &["header", "footer", ".header", ".footer", "#header", "#footer"];

/// Denylist of selectors for page furniture.
pub const NOISE_SELECTORS: &[&str] = &[
    // ARIA roles
    r#"[role="navigation"]"#,
    r#"[role="banner"]"#,
    r#"[role="contentinfo"]"#,
    r#"[role="complementary"]"#,
    r#"[role="menu"]"#,
    r#"[role="menubar"]"#,
    r#"[role="search"]"#,
    r#"[role="dialog"]"#,
    // Navigation
    ".sidebar",
    ".menu",
    ".nav",
    ".navbar",
    ".navigation",
    ".site-header",
    ".site-footer",
    ".site-nav",
    ".breadcrumb",
    ".breadcrumbs",
    ".pagination",
    ".pager",
    ".skip-link",
    // Advertising
    ".advertisement",
    ".ad",
    ".ads",
    ".advert",
    ".sponsored",
    ".banner",
    ".promo",
    ".promotion",
    r#"[class*="ad-"]"#,
    r#"[class*="ads-"]"#,
    r#"[id*="ad-"]"#,
    r#"[id*="ads-"]"#,
    r#"[class*="advert"]"#,
    r#"[id^="google_ads"]"#,
    // Social sharing
    ".social-share",
    ".share-buttons",
    ".social-links",
    ".social-icons",
    ".sharing",
    ".share",
    r#"[class*="share"]"#,
    // Comment sections
    ".comments",
    ".comment-section",
    "#comments",
    "#disqus_thread",
    ".comment-list",
    ".comments-area",
    "#respond",
    // Related-content rails
    ".related-posts",
    ".related-articles",
    ".recommended",
    ".more-stories",
    ".also-read",
    ".read-more",
    r#"[class*="related-"]"#,
    // Overlays and consent
    ".popup",
    ".modal",
    ".overlay",
    ".lightbox",
    ".cookie-notice",
    ".cookie-banner",
    ".cookie-consent",
    r#"[id*="cookie"]"#,
    r#"[class*="consent"]"#,
    ".newsletter-popup",
    ".subscribe-popup",
    ".newsletter-signup",
    // Widgets and page chrome
    ".widget",
    ".widgets",
    ".sidebar-widget",
    ".tags",
    ".tag-cloud",
    ".author-bio",
    ".author-box",
    ".print-only",
    ".screen-reader-text",
    ".sr-only",
    // Ids
    "#sidebar",
    "#menu",
    "#nav",
    "#navigation",
    "#cookie-notice",
];

static NOISE_SELECTOR: LazyLock<String> = LazyLock::new(|| NOISE_SELECTORS.join(", "));

/// Descendants that make an otherwise text-free element worth keeping.
const MEDIA_SELECTOR: &str = "img, video, audio, picture, figure";

/// Elements that are meaningful without text.
const KEEP_WHEN_EMPTY: &[&str] = &[
    "img", "video", "audio", "picture", "figure", "source", "track", "br", "hr", "input", "wbr",
];

/// Upper bound on empty-shell passes per round.
const MAX_EMPTY_PASSES: usize = 32;

/// Upper bound on noise/hidden/empty rounds.
const MAX_CLEAN_ROUNDS: usize = 8;

/// What the cleaner removed, for logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanReport {
    /// Non-content tag subtrees.
    pub tags: usize,
    /// Denylist matches.
    pub noise: usize,
    /// Hidden elements.
    pub hidden: usize,
    /// Empty shells.
    pub empty: usize,
    /// Empty-shell passes, summed over rounds.
    pub passes: usize,
    /// Noise/hidden/empty rounds until nothing changed.
    pub rounds: usize,
}

impl CleanReport {
    /// Total removed elements.
    #[must_use]
    pub fn total(&self) -> usize {
        self.tags + self.noise + self.hidden + self.empty
    }
}

/// Clean raw HTML, returning the reduced document serialized as HTML.
#[must_use]
pub fn clean(raw_html: &str) -> String {
    clean_with_report(raw_html).0
}

/// [`clean`] plus a count of what was removed.
#[must_use]
pub fn clean_with_report(raw_html: &str) -> (String, CleanReport) {
    let doc = dom::parse(&dom::strip_comments(raw_html));
    let report = clean_document(&doc);
    debug!(
        tags = report.tags,
        noise = report.noise,
        hidden = report.hidden,
        empty = report.empty,
        passes = report.passes,
        rounds = report.rounds,
        "cleaned document"
    );
    (dom::serialize(&doc), report)
}

/// Clean a parsed document in place.
pub fn clean_document(doc: &Document) -> CleanReport {
    let mut report = CleanReport::default();

    let tags = doc.select(&REMOVE_TAGS.join(", "));
    report.tags = tags.length();
    tags.remove();

    // Collapsing empties can drop the content that protected a noise or
    // hidden element, so the passes repeat until a round removes nothing.
    while report.rounds < MAX_CLEAN_ROUNDS {
        report.rounds += 1;
        let noise = remove_noise(doc);
        let hidden = remove_hidden(doc);
        let (empty, passes) = collapse_empty(doc);
        report.noise += noise;
        report.hidden += hidden;
        report.empty += empty;
        report.passes += passes;
        if noise + hidden + empty == 0 {
            break;
        }
    }

    report
}

fn remove_noise(doc: &Document) -> usize {
    let mut removed = 0;

    for tag in STRUCTURAL_NOISE_TAGS {
        for node in doc.select(tag).nodes().to_vec() {
            if contains_main_content(&node) {
                continue;
            }
            dom::remove_node(&node);
            removed += 1;
        }
    }

    for node in doc.select(&PAGE_CHROME_SELECTORS.join(", ")).nodes().to_vec() {
        if has_content_ancestor(&node) || is_protected(&node) {
            continue;
        }
        dom::remove_node(&node);
        removed += 1;
    }

    for node in doc.select(&NOISE_SELECTOR).nodes().to_vec() {
        if is_protected(&node) {
            continue;
        }
        dom::remove_node(&node);
        removed += 1;
    }

    removed
}

fn remove_hidden(doc: &Document) -> usize {
    let mut removed = 0;
    for node in doc.select("[style], [hidden], [aria-hidden]").nodes().to_vec() {
        let sel = Selection::from(node);
        if !tree::is_hidden(&sel) || is_protected(&node) {
            continue;
        }
        let only_aria = !sel.has_attr("hidden")
            && !sel.attr("style").is_some_and(|s| crate::patterns::HIDDEN_STYLE.is_match(&s));
        if only_aria && sel.select("article, main, p").exists() {
            continue;
        }
        dom::remove_node(&node);
        removed += 1;
    }
    removed
}

/// Remove text-free, media-free elements until a pass removes nothing.
fn collapse_empty(doc: &Document) -> (usize, usize) {
    let Some(root) = dom::body(doc).nodes().first().copied() else {
        return (0, 0);
    };

    let mut removed = 0;
    let mut passes = 0;
    while passes < MAX_EMPTY_PASSES {
        passes += 1;
        let mut removed_this_pass = 0;
        for node in dom::elements_post_order(&root) {
            if is_empty_shell(&node) {
                dom::remove_node(&node);
                removed_this_pass += 1;
            }
        }
        removed += removed_this_pass;
        if removed_this_pass == 0 {
            break;
        }
    }
    (removed, passes)
}

fn is_empty_shell(node: &NodeRef) -> bool {
    let Some(tag) = dom::node_tag(node) else {
        return false;
    };
    if KEEP_WHEN_EMPTY.contains(&tag.as_str()) {
        return false;
    }
    let sel = Selection::from(*node);
    sel.text().trim().is_empty() && !sel.select(MEDIA_SELECTOR).exists()
}

fn is_protected(node: &NodeRef) -> bool {
    matches!(dom::node_tag(node).as_deref(), Some("html" | "head" | "body" | "article" | "main"))
        || contains_main_content(node)
}

fn contains_main_content(node: &NodeRef) -> bool {
    Selection::from(*node).select("article, main").exists()
}

fn has_content_ancestor(node: &NodeRef) -> bool {
    dom::has_ancestor_tag(node, &["article", "main"])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_denylist_is_broad() {
        assert!(NOISE_SELECTORS.len() + STRUCTURAL_NOISE_TAGS.len() + PAGE_CHROME_SELECTORS.len() >= 60);
    }

    #[test]
    fn test_removes_scripts_and_comments() {
        let out = clean("<body><p>Visible text</p><script>track()</script><!-- note --></body>");
        assert!(out.contains("Visible text"));
        assert!(!out.contains("track()"));
        assert!(!out.contains("note"));
    }

    #[test]
    fn test_article_header_survives() {
        let out = clean(
            "<body><header>Site masthead</header><article><header><h1>Story title</h1></header><p>Body copy</p></article></body>",
        );
        assert!(!out.contains("Site masthead"));
        assert!(out.contains("Story title"));
    }

    #[test]
    fn test_header_and_footer_classes_follow_the_article_exemption() {
        let out = clean(
            r#"<body><div class="header">SITEBANNER</div><article><div class="header"><h1>Own title</h1></div>
            <p>Body copy</p><div class="footer">Filed under news</div></article>
            <div class="footer">SITECOPYRIGHT</div></body>"#,
        );
        assert!(!out.contains("SITEBANNER"));
        assert!(!out.contains("SITECOPYRIGHT"));
        assert!(out.contains("Own title"));
        assert!(out.contains("Filed under news"));
    }

    #[test]
    fn test_wrapper_with_article_is_kept() {
        let out = clean(r#"<body><div class="lead-wrap ad-slot"><article><p>Kept body</p></article></div></body>"#);
        assert!(out.contains("Kept body"));
    }

    #[test]
    fn test_hidden_elements_removed() {
        let out = clean(
            r#"<body><p>shown</p><div style="display:none">secret one</div><span hidden>secret two</span></body>"#,
        );
        assert!(out.contains("shown"));
        assert!(!out.contains("secret one"));
        assert!(!out.contains("secret two"));
    }

    #[test]
    fn test_aria_hidden_with_paragraphs_is_kept() {
        let out = clean(r#"<body><div aria-hidden="true"><p>reader text</p></div><div aria-hidden="true">icon</div></body>"#);
        assert!(out.contains("reader text"));
        assert!(!out.contains("icon"));
    }

    #[test]
    fn test_empty_shells_collapse_to_fixed_point() {
        let (out, report) = clean_with_report(
            r#"<body><div id="outer"><div><span><a class="share" href="/s">Share</a></span></div></div><p>text</p></body>"#,
        );
        assert!(!out.contains("outer"));
        assert!(out.contains("text"));
        assert!(report.empty >= 3);
    }

    #[test]
    fn test_protection_lost_to_empty_collapse_is_rechecked() {
        let (out, report) =
            clean_with_report(r#"<body><div class="ad">Buy now<article></article></div><p>x</p></body>"#);
        assert!(!out.contains("Buy now"));
        assert!(out.contains("<p>x</p>"));
        assert!(report.rounds >= 2);

        let out = clean(r#"<body><div aria-hidden="true">icon<p></p></div><p>x</p></body>"#);
        assert!(!out.contains("icon"));
    }

    #[test]
    fn test_media_keeps_container() {
        let out = clean(r#"<body><div id="fig"><img src="a.png"></div></body>"#);
        assert!(out.contains("fig"));
        assert!(out.contains("a.png"));
    }

    #[test]
    fn test_malformed_markup_does_not_fail() {
        let out = clean("<div><p>unclosed <b>bold <i>mixed</div></p><<>>");
        assert!(out.contains("unclosed"));
    }
}
