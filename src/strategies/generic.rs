//! Generic single-block article detector.
//!
//! Scores every block container and converts the best one. When no block
//! scores high enough, falls back to the parent holding the most paragraph
//! text, then to Readability when that feature is compiled in.
//!
//! Block scores grow with the subtree, so the winner is often a page
//! wrapper. Before conversion the winner loses its furniture descendants
//! and is narrowed to the child that carries nearly all of its text.

use std::collections::HashMap;

use dom_query::{Document, NodeId, NodeRef, Selection};
use tracing::debug;

use super::{prepare_document, ContentStrategy, MarkdownStyle};
use crate::dom;
use crate::link_density;
use crate::patterns::{ADVERTISEMENT_CLASS, BOILERPLATE_CLASS, NAVIGATION_CLASS, SENTENCE_END};
use crate::result::StrategyKind;
use crate::tree::{NodeMetrics, TreeMetrics};

/// Elements considered as the article block.
const CANDIDATE_SELECTOR: &str = "div, section, article, main";

/// Text beyond this many characters does not add to a block's score.
const TEXT_SCORE_CAP: usize = 8000;

/// Paragraphs longer than this count as substantive.
const SUBSTANTIVE_PARAGRAPH_CHARS: usize = 80;

/// Blocks below this score are not accepted.
pub const MIN_NODE_SCORE: f64 = 1000.0;

/// Minimum clustered paragraph text for the paragraph fallback.
const MIN_CLUSTER_CHARS: usize = 200;

/// Share of a block's text a child must hold to replace the block.
const DOMINANT_CHILD_SHARE: f64 = 0.9;

/// Page furniture removed from inside the chosen block.
const FURNITURE_TAGS: &[&str] = &["nav", "aside", "header", "footer", "form"];

const HEADING_SELECTOR: &str = "h1, h2, h3, h4, h5, h6";

/// Heuristic single-block detector.
#[derive(Debug, Clone, Copy)]
pub struct GenericStrategy {
    style: MarkdownStyle,
    readability_fallback: bool,
}

impl GenericStrategy {
    /// Creates the strategy. `readability_fallback` only matters when the
    /// `readability` feature is enabled.
    #[must_use]
    pub fn new(style: MarkdownStyle, readability_fallback: bool) -> Self {
        Self {
            style,
            readability_fallback,
        }
    }
}

impl Default for GenericStrategy {
    fn default() -> Self {
        Self::new(MarkdownStyle::default(), true)
    }
}

impl ContentStrategy for GenericStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Generic
    }

    fn extract(&self, html: &str) -> Option<String> {
        let doc = prepare_document(html);
        let root = dom::body(&doc).nodes().first().copied()?;
        let metrics = TreeMetrics::compute(&root);

        let chosen = best_block(&doc, &metrics).or_else(|| paragraph_cluster(&doc, &metrics));
        if let Some(node) = chosen {
            let discarded = discard_furniture(&node);
            let node = narrow_to_dominant_child(node);
            let sel = Selection::from(node);
            let stripped = link_density::strip_link_heavy(&sel);
            debug!(
                tag = dom::node_tag(&node).unwrap_or_default(),
                discarded, stripped, "generic strategy chose block"
            );
            return self.style.convert(&dom::outer_html(&sel));
        }

        if self.readability_fallback {
            return readability_fallback(html).and_then(|content| self.style.convert(&content));
        }
        None
    }
}

/// Heuristic score of one block. Higher is more article-like.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn block_score(node: &NodeRef, metrics: &NodeMetrics) -> f64 {
    let sel = Selection::from(*node);

    let mut paragraphs = 0usize;
    let mut substantive = 0usize;
    let mut sentences = 0usize;
    for p in sel.select("p").nodes() {
        let text = p.text();
        paragraphs += 1;
        if dom::normalized_len(&text) > SUBSTANTIVE_PARAGRAPH_CHARS {
            substantive += 1;
        }
        sentences += SENTENCE_END.find_iter(&text).count();
    }
    let headings = sel.select(HEADING_SELECTOR).length();
    let links = sel.select("a").length();

    let mut score = metrics.text_len.min(TEXT_SCORE_CAP) as f64
        + 200.0 * paragraphs as f64
        + 300.0 * substantive as f64
        + 100.0 * headings as f64
        + 50.0 * sentences as f64
        - 50.0 * links as f64
        + 10.0 * dom::depth(node) as f64;

    if metrics.text_len > 0 && metrics.link_text_len as f64 / metrics.text_len as f64 > 0.5 {
        score /= 2.0;
    }

    let ratio = if metrics.markup_len == 0 {
        1.0
    } else {
        metrics.text_len as f64 / metrics.markup_len as f64
    };
    score * ratio.clamp(0.5, 1.5)
}

/// Whether class/id tokens mark a block as page furniture.
fn is_boilerplate(metrics: &NodeMetrics) -> bool {
    metrics.tokens.iter().any(|token| {
        NAVIGATION_CLASS.is_match(token)
            || BOILERPLATE_CLASS.is_match(token)
            || ADVERTISEMENT_CLASS.is_match(token)
    })
}

/// Highest-scoring block at or above [`MIN_NODE_SCORE`]. Earlier blocks
/// win ties.
fn best_block<'a>(doc: &'a Document, metrics: &TreeMetrics) -> Option<NodeRef<'a>> {
    let mut best: Option<(NodeRef<'a>, f64)> = None;
    for node in doc.select(CANDIDATE_SELECTOR).nodes() {
        let Some(m) = metrics.get(node.id) else {
            continue;
        };
        if m.hidden || m.text_len == 0 || is_boilerplate(m) {
            continue;
        }
        let score = block_score(node, m);
        if score < MIN_NODE_SCORE {
            continue;
        }
        if best.as_ref().is_none_or(|(_, s)| score > *s) {
            best = Some((*node, score));
        }
    }
    best.map(|(node, _)| node)
}

/// Removes navigation, asides, comment sections, related rails and the
/// like from inside `block`. Headers and footers of an article or main
/// element stay. Descendants holding article/main content, or more than
/// half of the block's paragraph text, are never removed.
fn discard_furniture(block: &NodeRef) -> usize {
    let block_paragraphs = paragraph_text_len(block);
    let mut removed = 0;
    // Children come before parents, so inner matches go first.
    for node in dom::elements_post_order(block) {
        let Some(tag) = dom::node_tag(&node) else {
            continue;
        };
        let sel = Selection::from(node);
        let furniture = if FURNITURE_TAGS.contains(&tag.as_str()) {
            !(matches!(tag.as_str(), "header" | "footer")
                && dom::has_ancestor_tag(&node, &["article", "main"]))
        } else {
            dom::class_id_tokens(&sel).iter().any(|token| {
                NAVIGATION_CLASS.is_match(token)
                    || BOILERPLATE_CLASS.is_match(token)
                    || ADVERTISEMENT_CLASS.is_match(token)
            })
        };
        if !furniture
            || matches!(tag.as_str(), "article" | "main")
            || sel.select("article, main").exists()
            || paragraph_text_len(&node) * 2 > block_paragraphs
        {
            continue;
        }
        dom::remove_node(&node);
        removed += 1;
    }
    removed
}

/// Walks down from `block` while a single candidate child holds at least
/// [`DOMINANT_CHILD_SHARE`] of the text and every heading.
fn narrow_to_dominant_child(mut block: NodeRef<'_>) -> NodeRef<'_> {
    loop {
        let sel = Selection::from(block);
        let total = dom::normalized_len(&sel.text());
        if total == 0 {
            return block;
        }
        let headings = sel.select(HEADING_SELECTOR).length();
        let dominant = dom::element_children(&block).into_iter().find(|child| {
            let is_candidate = matches!(
                dom::node_tag(child).as_deref(),
                Some("div" | "section" | "article" | "main")
            );
            let child_sel = Selection::from(*child);
            #[allow(clippy::cast_precision_loss)]
            let share = dom::normalized_len(&child_sel.text()) as f64 / total as f64;
            is_candidate
                && share >= DOMINANT_CHILD_SHARE
                && child_sel.select(HEADING_SELECTOR).length() == headings
        });
        match dominant {
            Some(child) => block = child,
            None => return block,
        }
    }
}

/// Normalized text length of all `<p>` descendants.
fn paragraph_text_len(node: &NodeRef) -> usize {
    Selection::from(*node)
        .select("p")
        .nodes()
        .iter()
        .map(|p| dom::normalized_len(&p.text()))
        .sum()
}

/// The element whose `<p>` children carry the most text, if that is at
/// least [`MIN_CLUSTER_CHARS`].
fn paragraph_cluster<'a>(doc: &'a Document, metrics: &TreeMetrics) -> Option<NodeRef<'a>> {
    let mut order: Vec<NodeRef<'a>> = Vec::new();
    let mut totals: HashMap<NodeId, usize> = HashMap::new();

    for p in doc.select("p").nodes() {
        let Some(parent) = p.parent() else {
            continue;
        };
        let len = metrics.text_len(p.id);
        let entry = totals.entry(parent.id).or_insert_with(|| {
            order.push(parent);
            0
        });
        *entry += len;
    }

    let mut best: Option<(NodeRef<'a>, usize)> = None;
    for parent in order {
        let total = totals.get(&parent.id).copied().unwrap_or_default();
        if total >= MIN_CLUSTER_CHARS && best.as_ref().is_none_or(|(_, t)| total > *t) {
            best = Some((parent, total));
        }
    }
    best.map(|(node, _)| node)
}

#[cfg(feature = "readability")]
fn readability_fallback(html: &str) -> Option<String> {
    use dom_smoothie::Readability;

    let doc = prepare_document(html);
    if dom::body(&doc).text().trim().is_empty() {
        return None;
    }
    let mut reader = Readability::with_document(doc, None, None).ok()?;
    let article = reader.parse().ok()?;
    Some(article.content.to_string())
}

#[cfg(not(feature = "readability"))]
fn readability_fallback(_html: &str) -> Option<String> {
    None
}
