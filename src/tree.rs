//! Per-node measurements over a parsed document.
//!
//! `dom_query` already stores nodes in an arena indexed by `NodeId`. This
//! module keeps a side table of measurements keyed by the same ids.
//!
//! [`TreeMetrics`] is kept separate from the `Document` it describes, so a
//! caller can hold `NodeRef`s into the document while updating the metrics.
//! Every removal goes through [`TreeMetrics::detach`], which re-measures the
//! former ancestors. Descendant counts therefore always agree with the
//! children still attached.

use std::collections::{BTreeSet, HashMap};

use dom_query::{Document, NodeId, NodeRef, Selection};

use crate::dom;
use crate::patterns::HIDDEN_STYLE;

/// Tags whose text is not reader-visible content.
const NON_TEXT_TAGS: &[&str] = &["script", "style", "noscript", "template"];

/// A parsed HTML variant. Each variant owns its own arena; nothing is
/// shared between variants.
pub struct DocumentTree {
    doc: Document,
}

impl DocumentTree {
    /// Parse best-effort.
    #[must_use]
    pub fn parse(html: &str) -> Self {
        Self { doc: dom::parse(html) }
    }

    /// Underlying document.
    #[must_use]
    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// The `<body>` node, or the document element when there is no body.
    #[must_use]
    pub fn root(&self) -> Option<NodeRef<'_>> {
        dom::body(&self.doc).nodes().first().copied()
    }

    /// Reader-visible text length of the whole body.
    #[must_use]
    pub fn text_len(&self) -> usize {
        self.root()
            .map(|root| TreeMetrics::compute(&root).text_len(root.id))
            .unwrap_or_default()
    }

    /// Serialize back to HTML.
    #[must_use]
    pub fn html(&self) -> String {
        dom::serialize(&self.doc)
    }
}

/// Measurements of one element and its attached subtree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeMetrics {
    /// Lowercase tag name.
    pub tag: String,
    /// Lowercase class tokens and id.
    pub tokens: BTreeSet<String>,
    /// Hidden by inline style, `hidden`, or `aria-hidden="true"`.
    pub hidden: bool,
    /// Text held directly by this element's text children.
    pub own_text_len: usize,
    /// Text of the whole subtree.
    pub text_len: usize,
    /// Subtree text that sits inside `<a>` elements.
    pub link_text_len: usize,
    /// Estimated serialized tag and attribute bytes of the subtree.
    pub markup_len: usize,
    /// Words in the subtree.
    pub word_count: usize,
    /// Attached element children.
    pub element_children: usize,
}

/// Side table of [`NodeMetrics`] keyed by arena id.
#[derive(Debug, Clone, Default)]
pub struct TreeMetrics {
    map: HashMap<NodeId, NodeMetrics>,
}

impl TreeMetrics {
    /// Measure `root` and every element below it.
    #[must_use]
    pub fn compute(root: &NodeRef) -> Self {
        let mut metrics = Self::default();
        for node in dom::elements_post_order(root) {
            let measured = metrics.measure(&node);
            metrics.map.insert(node.id, measured);
        }
        let measured = metrics.measure(root);
        metrics.map.insert(root.id, measured);
        metrics
    }

    /// Metrics of an element, if it is still attached.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&NodeMetrics> {
        self.map.get(&id)
    }

    /// Subtree text length, zero for unknown ids.
    #[must_use]
    pub fn text_len(&self, id: NodeId) -> usize {
        self.get(id).map(|m| m.text_len).unwrap_or_default()
    }

    /// Number of measured elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether nothing has been measured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Remove `node` from its document and re-measure its former ancestors.
    pub fn detach(&mut self, node: &NodeRef) {
        let parent = node.parent();
        for descendant in dom::elements_post_order(node) {
            self.map.remove(&descendant.id);
        }
        self.map.remove(&node.id);
        dom::remove_node(node);
        if let Some(parent) = parent {
            self.refresh_upwards(&parent);
        }
    }

    /// Re-measure `node` and each of its ancestors from their current
    /// children.
    pub fn refresh_upwards(&mut self, node: &NodeRef) {
        let mut current = Some(*node);
        while let Some(n) = current {
            if n.is_element() && self.map.contains_key(&n.id) {
                let measured = self.measure(&n);
                self.map.insert(n.id, measured);
            }
            current = n.parent();
        }
    }

    /// Measure one element from its direct text and its children's
    /// already-recorded metrics.
    fn measure(&self, node: &NodeRef) -> NodeMetrics {
        let tag = dom::node_tag(node).unwrap_or_default();
        let sel = Selection::from(*node);
        let counts_text = !NON_TEXT_TAGS.contains(&tag.as_str());

        let mut m = NodeMetrics {
            markup_len: 2 * tag.len() + 5 + dom::attribute_overhead(node),
            tokens: dom::class_id_tokens(&sel),
            hidden: is_hidden(&sel),
            ..NodeMetrics::default()
        };

        for child in node.children() {
            if child.is_text() {
                if !counts_text {
                    continue;
                }
                let text = child.text();
                let len = dom::normalized_len(&text);
                m.own_text_len += len;
                m.text_len += len;
                m.word_count += dom::word_count(&text);
            } else if child.is_element() {
                let child_metrics = match self.map.get(&child.id) {
                    Some(cm) => cm.clone(),
                    None => self.measure(&child),
                };
                m.text_len += child_metrics.text_len;
                m.link_text_len += child_metrics.link_text_len;
                m.markup_len += child_metrics.markup_len;
                m.word_count += child_metrics.word_count;
                m.element_children += 1;
            }
        }

        if tag == "a" {
            m.link_text_len = m.text_len;
        }
        m.tag = tag;
        m
    }
}

/// Whether an element is hidden from readers.
#[must_use]
pub fn is_hidden(sel: &Selection) -> bool {
    if sel.has_attr("hidden") {
        return true;
    }
    if sel
        .attr("aria-hidden")
        .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
    {
        return true;
    }
    sel.attr("style").is_some_and(|style| HIDDEN_STYLE.is_match(&style))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root_of(tree: &DocumentTree) -> NodeRef<'_> {
        tree.root().expect("body")
    }

    #[test]
    fn test_link_and_text_lengths() {
        let tree = DocumentTree::parse(
            r#"<div id="d"><p>Hello world</p><p><a href="/x">linked</a> tail</p></div>"#,
        );
        let root = root_of(&tree);
        let metrics = TreeMetrics::compute(&root);
        let div = tree.document().select("#d").nodes().first().copied().unwrap();
        let m = metrics.get(div.id).unwrap();
        assert_eq!(m.tag, "div");
        assert_eq!(m.link_text_len, "linked".len());
        assert_eq!(m.text_len, "Hello world".len() + "linked".len() + "tail".len());
        assert_eq!(m.word_count, 4);
        assert_eq!(m.element_children, 2);
        assert!(m.tokens.contains("d"));
    }

    #[test]
    fn test_detach_keeps_ancestor_counts_consistent() {
        let tree = DocumentTree::parse(
            r##"<section id="s"><p>keep these words</p><ul id="l"><li><a href="#">nav</a></li></ul></section>"##,
        );
        let root = root_of(&tree);
        let mut metrics = TreeMetrics::compute(&root);
        let section = tree.document().select("#s").nodes().first().copied().unwrap();
        let before = metrics.get(section.id).unwrap().clone();
        assert_eq!(before.link_text_len, 3);

        let list = tree.document().select("#l").nodes().first().copied().unwrap();
        metrics.detach(&list);

        let after = metrics.get(section.id).unwrap();
        assert_eq!(after.link_text_len, 0);
        assert_eq!(after.text_len, "keep these words".len());
        assert_eq!(after.element_children, 1);
        assert!(after.markup_len < before.markup_len);
        assert!(metrics.get(list.id).is_none());
        assert_eq!(metrics.text_len(root.id), after.text_len);
    }

    #[test]
    fn test_script_text_not_counted() {
        let tree = DocumentTree::parse("<div><script>var x = 1;</script><p>ok</p></div>");
        assert_eq!(tree.text_len(), 2);
    }

    #[test]
    fn test_hidden_detection() {
        let doc = dom::parse(
            r#"<div id="a" style="display: none">x</div><div id="b" aria-hidden="true">y</div><div id="c" hidden>z</div><div id="d">w</div>"#,
        );
        assert!(is_hidden(&doc.select("#a")));
        assert!(is_hidden(&doc.select("#b")));
        assert!(is_hidden(&doc.select("#c")));
        assert!(!is_hidden(&doc.select("#d")));
    }

    #[test]
    fn test_variants_are_independent() {
        let raw = "<div><p>alpha</p><p id='x'>beta</p></div>";
        let a = DocumentTree::parse(raw);
        let b = DocumentTree::parse(raw);
        a.document().select("#x").remove();
        assert!(!a.html().contains("beta"));
        assert!(b.html().contains("beta"));
    }
}
