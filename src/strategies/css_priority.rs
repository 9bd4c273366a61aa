//! CSS-priority extraction: the first substantial match from an ordered
//! list of common article selectors.

use dom_query::Selection;

use super::{prepare_document, ContentStrategy, MarkdownStyle};
use crate::dom;
use crate::result::StrategyKind;

/// Selectors tried in order, most specific first.
pub const PRIORITY_SELECTORS: &[&str] = &[
    "article.post-content",
    "article.article-content",
    "article.entry-content",
    "article",
    "main article",
    r#"[role="main"] article"#,
    r#"[role="main"]"#,
    "main",
    ".article-content",
    ".post-content",
    ".entry-content",
    ".content-body",
    ".article-body",
    ".story-body",
    ".post-body",
    "#article-body",
    "#content",
    ".content",
];

/// A match needs more than this many characters of trimmed text.
const MIN_MATCH_CHARS: usize = 200;

/// First substantial match of [`PRIORITY_SELECTORS`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CssPriorityStrategy {
    style: MarkdownStyle,
}

impl CssPriorityStrategy {
    /// Creates the strategy.
    #[must_use]
    pub fn new(style: MarkdownStyle) -> Self {
        Self { style }
    }
}

impl ContentStrategy for CssPriorityStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::CssPriority
    }

    fn extract(&self, html: &str) -> Option<String> {
        let doc = prepare_document(html);
        for selector in PRIORITY_SELECTORS {
            for node in doc.select(selector).nodes() {
                let sel = Selection::from(*node);
                if dom::text_content(&sel).trim().chars().count() > MIN_MATCH_CHARS {
                    return self.style.convert(&dom::outer_html(&sel));
                }
            }
        }
        None
    }
}
