//! Multi-container extraction.
//!
//! Some sites split one article into several sibling containers (for
//! example `post-content-part` blocks between ad slots). This strategy
//! collects every container matching a known article-body pattern and
//! joins them in document order. Each pattern forms one group; the group
//! with the most text wins.

use std::collections::HashSet;

use dom_query::{Document, NodeId, NodeRef, Selection};

use super::{prepare_document, ContentStrategy, MarkdownStyle};
use crate::dom;
use crate::result::StrategyKind;
use crate::tree;

/// Class/id substrings of article-body containers, tried in order.
pub const PART_PATTERNS: &[&str] = &[
    "post-content",
    "article-content",
    "article-body",
    "entry-content",
    "story-body",
    "post-body",
    "article__body",
    "body__container",
    "content-body",
    "article-text",
    "post-entry",
];

/// One pattern's joined extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Group {
    markdown: String,
    length: usize,
}

/// Joins every article part container.
#[derive(Debug, Clone, Copy, Default)]
pub struct MultiContainerStrategy {
    style: MarkdownStyle,
}

impl MultiContainerStrategy {
    /// Creates the strategy.
    #[must_use]
    pub fn new(style: MarkdownStyle) -> Self {
        Self { style }
    }

    /// Converts each node and joins the non-empty parts.
    fn join(&self, nodes: &[NodeRef]) -> Option<Group> {
        let parts: Vec<String> = nodes
            .iter()
            .filter_map(|node| self.style.convert(&dom::outer_html(&Selection::from(*node))))
            .collect();
        if parts.is_empty() {
            return None;
        }
        let markdown = parts.join("\n\n");
        let length = dom::normalized_len(&markdown);
        Some(Group { markdown, length })
    }
}

impl ContentStrategy for MultiContainerStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::MultiContainer
    }

    fn extract(&self, html: &str) -> Option<String> {
        let doc = prepare_document(html);

        let mut best: Option<Group> = None;
        let groups = PART_PATTERNS
            .iter()
            .map(|pattern| pattern_matches(&doc, pattern))
            .chain(std::iter::once(article_paragraph_parents(&doc)));

        for nodes in groups {
            let Some(group) = self.join(&nodes) else {
                continue;
            };
            if best.as_ref().is_none_or(|b| group.length > b.length) {
                best = Some(group);
            }
        }
        best.map(|g| g.markdown)
    }
}

/// Visible elements whose class or id contains `pattern`, outermost only,
/// in document order.
fn pattern_matches<'a>(doc: &'a Document, pattern: &str) -> Vec<NodeRef<'a>> {
    let selector = format!(r#"[class*="{pattern}"], [id*="{pattern}"]"#);
    let matches: Vec<NodeRef<'a>> = doc
        .select(&selector)
        .nodes()
        .iter()
        .copied()
        .filter(|node| !tree::is_hidden(&Selection::from(*node)))
        .collect();
    outermost(matches)
}

/// Parents of `<p>` elements inside `<article>`, outermost only.
fn article_paragraph_parents(doc: &Document) -> Vec<NodeRef<'_>> {
    let mut seen: HashSet<NodeId> = HashSet::new();
    let mut parents = Vec::new();
    for p in doc.select("article p").nodes() {
        if let Some(parent) = p.parent() {
            if seen.insert(parent.id) {
                parents.push(parent);
            }
        }
    }
    outermost(parents)
}

/// Drops every node that has another node of the list as an ancestor.
/// Keeps the input order.
fn outermost(nodes: Vec<NodeRef<'_>>) -> Vec<NodeRef<'_>> {
    let ids: Vec<NodeId> = nodes.iter().map(|n| n.id).collect();
    nodes
        .into_iter()
        .filter(|node| !dom::has_ancestor_in(node, &ids))
        .collect()
}
