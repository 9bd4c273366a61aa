//! Content extraction strategies.
//!
//! Each strategy takes one HTML variant and either returns the article body
//! as Markdown or `None` when it finds nothing usable on that variant.
//!
//! - [`generic::GenericStrategy`]: heuristic single-block detector
//! - [`multi_container::MultiContainerStrategy`]: joins every article part
//! - [`css_priority::CssPriorityStrategy`]: first match of an ordered
//!   selector list

pub mod css_priority;
pub mod generic;
pub mod multi_container;

use dom_query::Document;
use quick_html2md::{html_to_markdown_with_options, MarkdownOptions};

use crate::dom;
use crate::patterns::MULTIPLE_NEWLINES;
use crate::result::StrategyKind;
use crate::Options;

pub use css_priority::CssPriorityStrategy;
pub use generic::GenericStrategy;
pub use multi_container::MultiContainerStrategy;

/// Tags whose text never reaches the Markdown, stripped before any strategy
/// looks at a document.
const NON_CONTENT_SELECTOR: &str = "script, style, noscript, template";

/// An extraction algorithm over one HTML variant.
pub trait ContentStrategy: Send + Sync {
    /// Which strategy this is.
    fn kind(&self) -> StrategyKind;

    /// Extract the article body as Markdown. `None` is a miss.
    fn extract(&self, html: &str) -> Option<String>;
}

/// HTML to Markdown conversion settings shared by all strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkdownStyle {
    /// Keep link targets.
    pub include_links: bool,
    /// Keep image references.
    pub include_images: bool,
    /// Render tables as GFM tables.
    pub include_tables: bool,
}

impl Default for MarkdownStyle {
    fn default() -> Self {
        Self::from_options(&Options::default())
    }
}

impl MarkdownStyle {
    /// Conversion settings from core options.
    #[must_use]
    pub fn from_options(options: &Options) -> Self {
        Self {
            include_links: options.include_links,
            include_images: options.include_images,
            include_tables: options.include_tables,
        }
    }

    /// Convert an HTML fragment. Returns `None` when the result has no
    /// visible characters.
    #[must_use]
    pub fn convert(&self, html: &str) -> Option<String> {
        let md_options = MarkdownOptions::new()
            .include_links(self.include_links)
            .include_images(self.include_images)
            .preserve_tables(self.include_tables);

        let markdown = html_to_markdown_with_options(html, &md_options);
        let markdown = MULTIPLE_NEWLINES.replace_all(markdown.trim(), "\n\n");
        if dom::normalized_len(&markdown) == 0 {
            None
        } else {
            Some(markdown.into_owned())
        }
    }
}

/// Parse a variant for extraction: comments and script-like tags are
/// dropped so their text never counts toward any score.
#[must_use]
pub fn prepare_document(html: &str) -> Document {
    let doc = dom::parse(&dom::strip_comments(html));
    doc.select(NON_CONTENT_SELECTOR).remove();
    doc
}

/// The three strategies, built once per pipeline.
pub struct StrategySet {
    generic: GenericStrategy,
    multi_container: MultiContainerStrategy,
    css_priority: CssPriorityStrategy,
}

impl StrategySet {
    /// Builds every strategy from the same options.
    #[must_use]
    pub fn new(options: &Options) -> Self {
        let style = MarkdownStyle::from_options(options);
        Self {
            generic: GenericStrategy::new(style, options.use_readability_fallback),
            multi_container: MultiContainerStrategy::new(style),
            css_priority: CssPriorityStrategy::new(style),
        }
    }

    /// The strategy implementing `kind`.
    #[must_use]
    pub fn get(&self, kind: StrategyKind) -> &dyn ContentStrategy {
        match kind {
            StrategyKind::Generic => &self.generic,
            StrategyKind::MultiContainer => &self.multi_container,
            StrategyKind::CssPriority => &self.css_priority,
        }
    }
}
