//! Data model shared by the extraction core and the batch layer.
//!
//! Candidates are produced once by the matrix runner and never mutated;
//! their fields are private and exposed through getters.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::dom;

/// How a page's HTML was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceMethod {
    /// Plain HTTP fetch, no script execution.
    Static,
    /// Headless-browser render after scripts ran.
    Rendered,
}

impl SourceMethod {
    /// Both methods in preference order.
    pub const ALL: [Self; 2] = [Self::Static, Self::Rendered];

    /// Stable label used in provenance strings and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Static => "static",
            Self::Rendered => "rendered",
        }
    }

    /// Tie-break rank: lower wins.
    #[must_use]
    pub const fn priority(self) -> u8 {
        match self {
            Self::Static => 0,
            Self::Rendered => 1,
        }
    }
}

impl fmt::Display for SourceMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which derived form of a source's HTML a strategy ran on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HtmlVariant {
    /// The HTML exactly as fetched.
    Raw,
    /// After the noise cleaner.
    Cleaned,
    /// After the cleaner and the scoring pruner.
    Pruned,
}

impl HtmlVariant {
    /// Label used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Raw => "raw",
            Self::Cleaned => "cleaned",
            Self::Pruned => "pruned",
        }
    }

    /// Computation order, used as the last tie-break.
    #[must_use]
    pub const fn priority(self) -> u8 {
        match self {
            Self::Raw => 0,
            Self::Cleaned => 1,
            Self::Pruned => 2,
        }
    }
}

impl fmt::Display for HtmlVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The extraction algorithm that produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    /// Heuristic single-block article detector.
    Generic,
    /// Concatenation of every article-body part container.
    MultiContainer,
    /// First non-trivial match from an ordered selector list.
    CssPriority,
}

impl StrategyKind {
    /// Label used in provenance strings.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Generic => "generic",
            Self::MultiContainer => "multi-container",
            Self::CssPriority => "css-priority",
        }
    }

    /// Tie-break rank: lower wins.
    #[must_use]
    pub const fn priority(self) -> u8 {
        match self {
            Self::Generic => 0,
            Self::MultiContainer => 1,
            Self::CssPriority => 2,
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One attempted extraction: source × variant × strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionCandidate {
    source: SourceMethod,
    variant: HtmlVariant,
    strategy: StrategyKind,
    content: String,
    length: usize,
    success: bool,
}

impl ExtractionCandidate {
    /// Records a strategy result. `None` becomes an unsuccessful candidate
    /// with empty content.
    #[must_use]
    pub fn new(
        source: SourceMethod,
        variant: HtmlVariant,
        strategy: StrategyKind,
        content: Option<String>,
    ) -> Self {
        let content = content.map(|c| c.trim().to_string()).unwrap_or_default();
        let length = dom::normalized_len(&content);
        Self {
            source,
            variant,
            strategy,
            success: length > 0,
            content,
            length,
        }
    }

    /// Fetch method of the HTML this candidate came from.
    #[must_use]
    pub fn source(&self) -> SourceMethod {
        self.source
    }

    /// HTML variant the strategy ran on.
    #[must_use]
    pub fn variant(&self) -> HtmlVariant {
        self.variant
    }

    /// Strategy that produced the content.
    #[must_use]
    pub fn strategy(&self) -> StrategyKind {
        self.strategy
    }

    /// Markdown content (empty on a miss).
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Character count after whitespace normalization.
    #[must_use]
    pub fn length(&self) -> usize {
        self.length
    }

    /// Whether the strategy produced anything.
    #[must_use]
    pub fn success(&self) -> bool {
        self.success
    }

    /// Human-readable provenance, e.g. `static with multi-container`.
    #[must_use]
    pub fn provenance_label(&self) -> String {
        format!("{} with {}", self.source, self.strategy)
    }
}

/// The winning candidate with its provenance label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionResult {
    /// The chosen candidate.
    pub candidate: ExtractionCandidate,
    /// `"<source> with <strategy>"`.
    pub provenance_label: String,
}

impl ExtractionResult {
    /// Wraps a candidate, deriving its label.
    #[must_use]
    pub fn new(candidate: ExtractionCandidate) -> Self {
        let provenance_label = candidate.provenance_label();
        Self {
            candidate,
            provenance_label,
        }
    }
}

/// Page-level metadata, either supplied by the fetch layer or read from
/// the HTML head.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMetadata {
    /// Structured page title.
    pub title: Option<String>,
    /// Publication time.
    pub published: Option<DateTime<Utc>>,
}

impl PageMetadata {
    /// Whether neither field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.published.is_none()
    }

    /// Fills missing fields from `other`, keeping what is already set.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        Self {
            title: self.title.or(other.title),
            published: self.published.or(other.published),
        }
    }
}

/// Everything the core needs for one URL.
#[derive(Debug, Clone, Default)]
pub struct PageInput {
    /// Source URL, used for the title fallback and logging.
    pub url: String,
    /// Static-fetch HTML, if that method succeeded.
    pub static_html: Option<String>,
    /// Rendered-fetch HTML, if that method succeeded.
    pub rendered_html: Option<String>,
    /// Metadata supplied by the fetch layer.
    pub metadata: PageMetadata,
}

impl PageInput {
    /// Input with only a static source.
    #[must_use]
    pub fn from_static(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            static_html: Some(html.into()),
            ..Self::default()
        }
    }

    /// Input with both sources; either may be absent.
    #[must_use]
    pub fn new(url: impl Into<String>, static_html: Option<String>, rendered_html: Option<String>) -> Self {
        Self {
            url: url.into(),
            static_html,
            rendered_html,
            metadata: PageMetadata::default(),
        }
    }

    /// Static input from undecoded bytes; the charset is sniffed.
    #[must_use]
    pub fn from_static_bytes(url: impl Into<String>, bytes: &[u8]) -> Self {
        Self::from_static(url, crate::encoding::transcode_to_utf8(bytes))
    }

    /// Attaches fetch-layer metadata.
    #[must_use]
    pub fn with_metadata(mut self, metadata: PageMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// HTML for `method`, ignoring blank documents.
    #[must_use]
    pub fn html(&self, method: SourceMethod) -> Option<&str> {
        let html = match method {
            SourceMethod::Static => self.static_html.as_deref(),
            SourceMethod::Rendered => self.rendered_html.as_deref(),
        };
        html.filter(|h| !h.trim().is_empty())
    }
}

/// Final per-URL output of the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageOutput {
    /// Filtered Markdown body.
    pub markdown: String,
    /// Sanitized document title.
    pub title: String,
    /// Which source and strategy won.
    pub provenance_label: String,
    /// Normalized character count of the winning candidate.
    pub content_length: usize,
    /// Size of the candidate pool the winner was chosen from.
    pub candidates_considered: usize,
    /// Publication time, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_length_ignores_incidental_whitespace() {
        let a = ExtractionCandidate::new(
            SourceMethod::Static,
            HtmlVariant::Raw,
            StrategyKind::Generic,
            Some("one two\n\n\nthree".to_string()),
        );
        let b = ExtractionCandidate::new(
            SourceMethod::Rendered,
            HtmlVariant::Raw,
            StrategyKind::Generic,
            Some("  one   two three  ".to_string()),
        );
        assert_eq!(a.length(), b.length());
        assert!(a.success());
    }

    #[test]
    fn missing_content_is_unsuccessful() {
        let c = ExtractionCandidate::new(
            SourceMethod::Static,
            HtmlVariant::Pruned,
            StrategyKind::CssPriority,
            None,
        );
        assert!(!c.success());
        assert_eq!(c.length(), 0);
        assert!(c.content().is_empty());
    }

    #[test]
    fn provenance_label_combines_source_and_strategy() {
        let c = ExtractionCandidate::new(
            SourceMethod::Static,
            HtmlVariant::Cleaned,
            StrategyKind::MultiContainer,
            Some("text".to_string()),
        );
        assert_eq!(c.provenance_label(), "static with multi-container");
    }

    #[test]
    fn blank_source_counts_as_absent() {
        let input = PageInput::new("u", Some("   ".to_string()), Some("<p>x</p>".to_string()));
        assert!(input.html(SourceMethod::Static).is_none());
        assert!(input.html(SourceMethod::Rendered).is_some());
    }

    #[test]
    fn metadata_or_keeps_existing_fields() {
        let supplied = PageMetadata {
            title: Some("Supplied".into()),
            published: None,
        };
        let sniffed = PageMetadata {
            title: Some("Sniffed".into()),
            published: None,
        };
        assert_eq!(supplied.or(sniffed).title.as_deref(), Some("Supplied"));
    }
}
