//! DOM Operations Adapter
//!
//! Thin helpers over `dom_query`. A `Document` is an arena: every node lives
//! in one vector addressed by `NodeId`, children are ordered id lists and
//! the parent id is a plain index. Nothing here owns nodes through parent
//! links, so removing a subtree only detaches ids.

use std::borrow::Cow;
use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

// Re-export core types for external use
pub use dom_query::{Document, NodeId, NodeRef, Selection};

pub use tendril::StrTendril;

#[allow(clippy::expect_used)]
static HTML_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("HTML_COMMENT regex"));

// === Parsing / serialization ===

/// Parse HTML best-effort. html5ever never rejects input: unparsable
/// fragments end up as text or are dropped.
#[must_use]
pub fn parse(html: &str) -> Document {
    Document::from(html)
}

/// Serialize the whole document back to HTML.
#[must_use]
pub fn serialize(doc: &Document) -> String {
    doc.html().to_string()
}

/// `dom_query` does not expose comment nodes, so comments are stripped
/// from the source text before parsing.
#[must_use]
pub fn strip_comments(html: &str) -> Cow<'_, str> {
    HTML_COMMENT.replace_all(html, "")
}

/// The `<body>` selection, or the whole document when there is none.
#[must_use]
pub fn body(doc: &Document) -> Selection<'_> {
    let body = doc.select("body");
    if body.exists() {
        body
    } else {
        doc.select("html")
    }
}

// === Attribute Operations ===

/// Get any attribute value
#[inline]
#[must_use]
pub fn get_attribute(sel: &Selection, name: &str) -> Option<String> {
    sel.attr(name).map(|s| s.to_string())
}

/// Lowercase class tokens plus the id, as one set.
#[must_use]
pub fn class_id_tokens(sel: &Selection) -> BTreeSet<String> {
    let mut tokens: BTreeSet<String> = get_attribute(sel, "class")
        .unwrap_or_default()
        .split_whitespace()
        .map(str::to_ascii_lowercase)
        .collect();
    if let Some(id) = get_attribute(sel, "id") {
        let id = id.trim().to_ascii_lowercase();
        if !id.is_empty() {
            tokens.insert(id);
        }
    }
    tokens
}

/// Attribute markup bytes (`name="value"` plus separators) of an element.
#[must_use]
pub fn attribute_overhead(node: &NodeRef) -> usize {
    node.attrs()
        .iter()
        .map(|attr| attr.name.local.len() + attr.value.len() + 4)
        .sum()
}

// === Tag/Node Information ===

/// Get tag name (lowercase)
#[must_use]
pub fn tag_name(sel: &Selection) -> Option<String> {
    sel.nodes().first().and_then(node_tag)
}

/// Lowercase tag name of an element node.
#[must_use]
pub fn node_tag(node: &NodeRef) -> Option<String> {
    if !node.is_element() {
        return None;
    }
    node.node_name().map(|t| t.to_ascii_lowercase())
}

/// Element children of a node, in document order.
#[must_use]
pub fn element_children<'a>(node: &NodeRef<'a>) -> Vec<NodeRef<'a>> {
    node.children().into_iter().filter(NodeRef::is_element).collect()
}

/// All element nodes under `root` (excluding it), children before
/// parents. Removing nodes in this order never invalidates a node that is
/// still to be visited.
#[must_use]
pub fn elements_post_order<'a>(root: &NodeRef<'a>) -> Vec<NodeRef<'a>> {
    fn walk<'a>(node: &NodeRef<'a>, out: &mut Vec<NodeRef<'a>>) {
        for child in element_children(node) {
            walk(&child, out);
            out.push(child);
        }
    }
    let mut out = Vec::new();
    walk(root, &mut out);
    out
}

/// Whether any ancestor of `node` is in `ids`.
#[must_use]
pub fn has_ancestor_in(node: &NodeRef, ids: &[NodeId]) -> bool {
    let mut current = node.parent();
    while let Some(parent) = current {
        if ids.contains(&parent.id) {
            return true;
        }
        current = parent.parent();
    }
    false
}

/// Whether any ancestor of `node` is one of `tags` (lowercase).
#[must_use]
pub fn has_ancestor_tag(node: &NodeRef, tags: &[&str]) -> bool {
    let mut current = node.parent();
    while let Some(parent) = current {
        if node_tag(&parent).is_some_and(|tag| tags.contains(&tag.as_str())) {
            return true;
        }
        current = parent.parent();
    }
    false
}

/// Distance from the document root.
#[must_use]
pub fn depth(node: &NodeRef) -> usize {
    let mut depth = 0;
    let mut current = node.parent();
    while let Some(parent) = current {
        depth += 1;
        current = parent.parent();
    }
    depth
}

// === Text Content ===

/// Get all text content of node and descendants
#[inline]
#[must_use]
pub fn text_content(sel: &Selection) -> StrTendril {
    sel.text()
}

/// Get outer HTML content
#[inline]
#[must_use]
pub fn outer_html(sel: &Selection) -> StrTendril {
    sel.html()
}

/// Character count with whitespace runs collapsed to one space and the
/// ends trimmed.
#[must_use]
pub fn normalized_len(text: &str) -> usize {
    let mut len = 0;
    for (i, word) in text.split_whitespace().enumerate() {
        if i > 0 {
            len += 1;
        }
        len += word.chars().count();
    }
    len
}

/// Whitespace-separated word count.
#[inline]
#[must_use]
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

// === Mutation ===

/// Detach a single node.
#[inline]
pub fn remove_node(node: &NodeRef) {
    Selection::from(*node).remove();
}
