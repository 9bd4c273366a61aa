//! Content scorer and pruning filter.
//!
//! Every element under `<body>` gets a score in `[0, 1]`:
//!
//! ```text
//! score = 0.4 * text_density + 0.3 * (1 - link_density) + 0.2 * tag_importance + 0.1 * class_id_signal
//! ```
//!
//! Elements are visited children first. A parent is scored from the text its
//! surviving children still hold, measured against the footprint it had
//! before pruning, so text lost below counts against it. Removing children
//! can only lower a parent's score, which keeps pruning monotone in the
//! threshold.

use std::collections::{BTreeSet, HashSet};

use dom_query::{NodeId, NodeRef};
use tracing::debug;

use crate::dom;
use crate::patterns::{token_parts, CONTENT_NEGATIVE_WORDS, CONTENT_POSITIVE_WORDS};
use crate::tree::{DocumentTree, NodeMetrics, TreeMetrics};

const TEXT_DENSITY_WEIGHT: f64 = 0.4;
const LINK_DENSITY_WEIGHT: f64 = 0.3;
const TAG_WEIGHT: f64 = 0.2;
const CLASS_ID_WEIGHT: f64 = 0.1;

/// The median must sit this far below the threshold before the dynamic
/// correction starts.
pub const DYNAMIC_GAP: f64 = 0.1;

/// Fraction of the remaining gap (median to threshold) that is given back.
pub const CORRECTION_FACTOR: f64 = 0.5;

/// Largest amount the dynamic correction may lower the threshold by.
pub const MAX_CORRECTION: f64 = 0.15;

/// Descendants with more text than this protect their ancestors.
const IMPORTANT_TEXT_CHARS: usize = 50;

const IMPORTANT_TAGS: &[&str] = &["p", "h1", "h2", "h3", "article", "main"];

const HEADING_TAGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6"];

/// Formatting elements that do not break a leaf-like run of text.
const INLINE_TAGS: &[&str] = &[
    "a", "abbr", "b", "bdi", "bdo", "br", "cite", "code", "data", "del", "dfn", "em", "i", "img",
    "ins", "kbd", "mark", "q", "s", "samp", "small", "span", "strong", "sub", "sup", "time", "u",
    "var", "wbr",
];

/// Pruning parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PruneSettings {
    /// Static cutoff.
    pub threshold: f64,
    /// Leaf-like elements below this many words skip density penalties.
    pub min_word_threshold: usize,
    /// Lower the cutoff on sparse documents.
    pub dynamic_threshold: bool,
}

impl Default for PruneSettings {
    fn default() -> Self {
        Self {
            threshold: 0.48,
            min_word_threshold: 10,
            dynamic_threshold: true,
        }
    }
}

/// Summary of one pruning pass.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PruneReport {
    /// Elements scored.
    pub scored: usize,
    /// Elements removed (subtree roots).
    pub removed: usize,
    /// Median of the unpruned scores.
    pub median_score: f64,
    /// Cutoff actually applied.
    pub effective_threshold: f64,
}

/// Score of one element before any pruning.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementScore {
    /// Lowercase tag name.
    pub tag: String,
    /// Class tokens and id.
    pub tokens: BTreeSet<String>,
    /// Score in `[0, 1]`.
    pub score: f64,
}

/// Prune low-scoring elements and return the reduced HTML.
#[must_use]
pub fn prune(html: &str, settings: &PruneSettings) -> String {
    prune_with_report(html, settings).0
}

/// [`prune`] plus what happened.
#[must_use]
pub fn prune_with_report(html: &str, settings: &PruneSettings) -> (String, PruneReport) {
    let tree = DocumentTree::parse(html);
    let Some(root) = tree.root() else {
        return (tree.html(), PruneReport::default());
    };

    let baseline = TreeMetrics::compute(&root);
    let order = dom::elements_post_order(&root);

    // Leaf exemption is decided on the unpruned tree so that removals
    // cannot turn a container into a leaf.
    let exempt: HashSet<NodeId> = order
        .iter()
        .filter(|node| {
            baseline
                .get(node.id)
                .is_some_and(|m| is_exempt(node, m, settings.min_word_threshold))
        })
        .map(|node| node.id)
        .collect();

    let scores: Vec<f64> = order
        .iter()
        .filter_map(|node| {
            let m = baseline.get(node.id)?;
            Some(score_metrics(m, m, exempt.contains(&node.id)))
        })
        .collect();
    let median_score = median(&scores);
    let effective = effective_threshold(settings.threshold, median_score, settings.dynamic_threshold);

    let mut current = baseline.clone();
    let mut removed = 0;
    for node in &order {
        let (Some(now), Some(before)) = (current.get(node.id), baseline.get(node.id)) else {
            continue;
        };
        let score = score_metrics(now, before, exempt.contains(&node.id));
        if score >= effective || has_important_descendant(node, &current) {
            continue;
        }
        current.detach(node);
        removed += 1;
    }

    let report = PruneReport {
        scored: scores.len(),
        removed,
        median_score,
        effective_threshold: effective,
    };
    debug!(
        scored = report.scored,
        removed = report.removed,
        median = report.median_score,
        threshold = report.effective_threshold,
        "pruned document"
    );
    (tree.html(), report)
}

/// Unpruned scores of every element under `<body>`, in document order.
#[must_use]
pub fn score_elements(html: &str, settings: &PruneSettings) -> Vec<ElementScore> {
    let tree = DocumentTree::parse(html);
    let Some(root) = tree.root() else {
        return Vec::new();
    };
    let metrics = TreeMetrics::compute(&root);
    root.descendants()
        .into_iter()
        .filter(NodeRef::is_element)
        .filter_map(|node| {
            let m = metrics.get(node.id)?;
            Some(ElementScore {
                tag: m.tag.clone(),
                tokens: m.tokens.clone(),
                score: score_metrics(m, m, is_exempt(&node, m, settings.min_word_threshold)),
            })
        })
        .collect()
}

/// The cutoff applied to a document whose median unpruned score is
/// `median`.
///
/// The correction grows with how far the median sits below
/// `threshold - DYNAMIC_GAP` and is capped at [`MAX_CORRECTION`]. The
/// result never decreases as `threshold` increases.
#[must_use]
pub fn effective_threshold(threshold: f64, median: f64, dynamic: bool) -> f64 {
    if !dynamic {
        return threshold;
    }
    let excess = (threshold - DYNAMIC_GAP - median).max(0.0);
    let correction = (excess * CORRECTION_FACTOR).min(MAX_CORRECTION);
    (threshold - correction).max(0.0)
}

/// Fixed tag lookup.
#[must_use]
pub fn tag_importance(tag: &str) -> f64 {
    match tag {
        "article" | "main" => 1.0,
        "ul" | "ol" | "li" | "dl" | "dt" | "dd" | "table" | "thead" | "tbody" | "tfoot" | "tr"
        | "td" | "th" => 0.6,
        "div" | "section" => 0.5,
        "nav" | "aside" | "header" | "footer" | "menu" | "form" => 0.1,
        _ => 0.3,
    }
}

/// `+1.0` for content vocabulary, `-1.0` for furniture vocabulary,
/// `0.0` otherwise. Furniture wins when both appear.
#[must_use]
pub fn class_id_signal(tokens: &BTreeSet<String>) -> f64 {
    let parts = || tokens.iter().flat_map(|t| token_parts(t));
    if parts().any(|p| CONTENT_NEGATIVE_WORDS.contains(&p)) {
        -1.0
    } else if parts().any(|p| CONTENT_POSITIVE_WORDS.contains(&p)) {
        1.0
    } else {
        0.0
    }
}

/// Score from current metrics `now`, normalized against the unpruned
/// metrics `before`.
fn score_metrics(now: &NodeMetrics, before: &NodeMetrics, exempt: bool) -> f64 {
    let (text_density, link_score) = if exempt {
        (1.0, 1.0)
    } else {
        let text = now.text_len as f64;
        let footprint = text + before.markup_len as f64;
        let text_density = if footprint > 0.0 { text / footprint } else { 0.0 };
        let non_link = now.text_len.saturating_sub(now.link_text_len) as f64;
        let link_score = if before.text_len > 0 {
            non_link / before.text_len as f64
        } else {
            0.0
        };
        (text_density, link_score)
    };

    let signal = (class_id_signal(&now.tokens) + 1.0) / 2.0;
    let score = TEXT_DENSITY_WEIGHT * text_density.clamp(0.0, 1.0)
        + LINK_DENSITY_WEIGHT * link_score.clamp(0.0, 1.0)
        + TAG_WEIGHT * tag_importance(&now.tag)
        + CLASS_ID_WEIGHT * signal;
    score.clamp(0.0, 1.0)
}

/// Short leaf-like elements are not penalized for density.
fn is_exempt(node: &NodeRef, metrics: &NodeMetrics, min_word_threshold: usize) -> bool {
    metrics.word_count < min_word_threshold && is_leaf_like(node, &metrics.tag)
}

/// Headings, and elements whose element children are all inline.
fn is_leaf_like(node: &NodeRef, tag: &str) -> bool {
    if HEADING_TAGS.contains(&tag) {
        return true;
    }
    dom::element_children(node)
        .iter()
        .all(|child| dom::node_tag(child).is_some_and(|t| INLINE_TAGS.contains(&t.as_str())))
}

/// Whether a surviving descendant is a paragraph, top heading or article
/// container with real text.
fn has_important_descendant(node: &NodeRef, metrics: &TreeMetrics) -> bool {
    node.descendants().into_iter().any(|d| {
        metrics
            .get(d.id)
            .is_some_and(|m| IMPORTANT_TAGS.contains(&m.tag.as_str()) && m.text_len > IMPORTANT_TEXT_CHARS)
    })
}

fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}
