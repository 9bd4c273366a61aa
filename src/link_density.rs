//! Link density tests.
//!
//! Decides whether a block inside an extracted container is a link list
//! (related stories, tag clouds, inline menus) rather than prose, and
//! strips such blocks from a chosen container.

use dom_query::{NodeRef, Selection};

use crate::dom;

/// Blocks inside a chosen container that are checked for link density.
const LINK_BLOCK_SELECTOR: &str = "ul, ol, p, div, section, table";

/// Link text shorter than this counts as a short (menu-style) link.
const SHORT_LINK_CHARS: usize = 10;

/// Summary of the links below one element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkInfo {
    /// Characters of non-empty link text.
    pub link_chars: usize,
    /// Non-empty links shorter than [`SHORT_LINK_CHARS`].
    pub short_links: usize,
    /// Links with any text at all.
    pub non_empty_links: usize,
}

impl LinkInfo {
    /// Collect heuristics on the link text of `links`.
    #[must_use]
    pub fn collect(links: &Selection) -> Self {
        let mut info = Self::default();
        for link in links.iter() {
            let len = link.text().trim().chars().count();
            if len == 0 {
                continue;
            }
            info.link_chars += len;
            if len < SHORT_LINK_CHARS {
                info.short_links += 1;
            }
            info.non_empty_links += 1;
        }
        info
    }
}

/// Whether a block is rich in links and probably boilerplate.
///
/// Short blocks are judged against a limit that depends on the tag and on
/// whether another element follows; long blocks are only flagged when a
/// single link carries nearly all of their text.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn link_density_test(element: &Selection) -> bool {
    let links = element.select("a");
    let n_links = links.length();
    if n_links == 0 {
        return false;
    }

    let text = dom::text_content(element);
    let text_len = text.trim().chars().count();

    if n_links == 1 {
        if let Some(link) = links.nodes().first() {
            let link_len = Selection::from(*link).text().trim().chars().count();
            if link_len > 100 && (link_len as f64) > (text_len as f64) * 0.9 {
                return true;
            }
        }
    }

    let tag = dom::tag_name(element).unwrap_or_default();
    let has_next_sibling = element
        .nodes()
        .first()
        .and_then(NodeRef::next_element_sibling)
        .is_some();

    let limit: usize = match (tag.as_str(), has_next_sibling) {
        ("p", true) => 30,
        ("p", false) => 60,
        (_, true) => 100,
        (_, false) => 300,
    };
    if text_len >= limit {
        return false;
    }

    let info = LinkInfo::collect(&links);
    if info.non_empty_links == 0 {
        return true;
    }
    if (info.link_chars as f64) > (text_len as f64) * 0.8 {
        return true;
    }
    info.non_empty_links > 1
        && (info.short_links as f64) / (info.non_empty_links as f64) > 0.8
}

/// Whether a table is rich in links. Tables with less than 200 characters
/// are never flagged.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn link_density_test_table(table: &Selection) -> bool {
    let links = table.select("a");
    if links.length() == 0 {
        return false;
    }
    let text_len = dom::text_content(table).trim().chars().count();
    if text_len < 200 {
        return false;
    }
    let info = LinkInfo::collect(&links);
    if info.non_empty_links == 0 {
        return true;
    }
    let ratio = if text_len < 1000 { 0.8 } else { 0.5 };
    (info.link_chars as f64) > (text_len as f64) * ratio
}

/// Remove link-heavy blocks below `container`, innermost first. Returns
/// how many blocks were removed. The container itself is never removed.
pub fn strip_link_heavy(container: &Selection) -> usize {
    let mut removed = 0;
    let blocks: Vec<NodeRef> = container.select(LINK_BLOCK_SELECTOR).nodes().to_vec();
    for node in blocks.into_iter().rev() {
        let sel = Selection::from(node);
        let heavy = if dom::node_tag(&node).as_deref() == Some("table") {
            link_density_test_table(&sel)
        } else {
            link_density_test(&sel)
        };
        if heavy {
            dom::remove_node(&node);
            removed += 1;
        }
    }
    removed
}
