//! Markdown post-processing: short-block filtering and title resolution.
//!
//! Blocks are separated by blank lines. A fenced code block is one block
//! even when it contains blank lines, and a heading line is always a block
//! of its own. Structural blocks (headings, code, lists, quotes, tables)
//! are always kept; plain paragraphs need `min_words` words.

use crate::patterns::{
    HEADING_LINE, H1_LINE, ORDERED_LIST_ITEM, TITLE_UNSAFE_CHARS, UNORDERED_LIST_ITEM,
    WHITESPACE_NORMALIZE,
};
use crate::url_utils;

/// Default minimum words for a plain paragraph.
pub const DEFAULT_MIN_BLOCK_WORDS: usize = 50;

/// Titles are cut to this many characters.
pub const MAX_TITLE_CHARS: usize = 200;

/// Title used when every source is blank.
pub const UNTITLED: &str = "Untitled";

/// Kind of a Markdown block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// ATX heading.
    Heading,
    /// Fenced or indented code.
    Code,
    /// Ordered or unordered list.
    List,
    /// Blockquote.
    Quote,
    /// GFM table.
    Table,
    /// Anything else.
    Paragraph,
}

impl BlockKind {
    /// Classify a block by its first line.
    #[must_use]
    pub fn of(block: &str) -> Self {
        let first = block.lines().next().unwrap_or_default();
        if HEADING_LINE.is_match(first) {
            Self::Heading
        } else if first.trim_start().starts_with("```")
            || first.trim_start().starts_with("~~~")
            || first.starts_with("    ")
            || first.starts_with('\t')
        {
            Self::Code
        } else if UNORDERED_LIST_ITEM.is_match(first) || ORDERED_LIST_ITEM.is_match(first) {
            Self::List
        } else if first.trim_start().starts_with('>') {
            Self::Quote
        } else if first.trim_start().starts_with('|') {
            Self::Table
        } else {
            Self::Paragraph
        }
    }

    /// Whether blocks of this kind survive regardless of length.
    #[must_use]
    pub const fn is_structural(self) -> bool {
        !matches!(self, Self::Paragraph)
    }
}

/// Split Markdown into blocks, in order.
#[must_use]
pub fn split_blocks(markdown: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut fence: Option<&str> = None;

    fn flush(current: &mut Vec<&str>, blocks: &mut Vec<String>) {
        if !current.is_empty() {
            blocks.push(current.join("\n"));
            current.clear();
        }
    }

    for line in markdown.lines() {
        let trimmed = line.trim_start();

        if let Some(marker) = fence {
            current.push(line);
            if trimmed.starts_with(marker) {
                fence = None;
                flush(&mut current, &mut blocks);
            }
            continue;
        }

        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            flush(&mut current, &mut blocks);
            fence = Some(&trimmed[..3]);
            current.push(line);
            continue;
        }

        if line.trim().is_empty() {
            flush(&mut current, &mut blocks);
            continue;
        }

        if HEADING_LINE.is_match(line) {
            flush(&mut current, &mut blocks);
            current.push(line);
            flush(&mut current, &mut blocks);
            continue;
        }

        current.push(line);
    }
    flush(&mut current, &mut blocks);
    blocks
}

/// Drop plain paragraphs with fewer than `min_words` words and rejoin the
/// rest with blank lines.
#[must_use]
pub fn postprocess(markdown: &str, min_words: usize) -> String {
    split_blocks(markdown)
        .into_iter()
        .filter(|block| {
            BlockKind::of(block).is_structural() || block.split_whitespace().count() >= min_words
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Text of the first level-1 heading, if any.
#[must_use]
pub fn extract_h1_title(markdown: &str) -> Option<String> {
    let mut in_fence = false;
    for line in markdown.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            in_fence = !in_fence;
            continue;
        }
        if in_fence {
            continue;
        }
        if let Some(caps) = H1_LINE.captures(line) {
            let title = caps[1].trim();
            if !title.is_empty() {
                return Some(title.to_string());
            }
        }
    }
    None
}

/// Make a title safe for use as a document name.
///
/// Collapses whitespace, drops path and control characters and truncates.
/// Returns [`UNTITLED`] when nothing is left.
#[must_use]
pub fn sanitize_title(title: &str) -> String {
    let cleaned = TITLE_UNSAFE_CHARS.replace_all(title, "");
    let collapsed = WHITESPACE_NORMALIZE.replace_all(&cleaned, " ");
    let truncated: String = collapsed.trim().chars().take(MAX_TITLE_CHARS).collect();
    let truncated = truncated.trim();
    if truncated.is_empty() {
        UNTITLED.to_string()
    } else {
        truncated.to_string()
    }
}

/// Pick the document title.
///
/// Precedence: the metadata title, then the first H1 of the final
/// Markdown, then a name derived from the URL.
#[must_use]
pub fn resolve_title(metadata_title: Option<&str>, markdown: &str, url: &str) -> String {
    let chosen = metadata_title
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .or_else(|| extract_h1_title(markdown))
        .unwrap_or_else(|| url_utils::fallback_name_from_url(url));
    sanitize_title(&chosen)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(n: usize) -> String {
        (0..n).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn test_block_kinds() {
        assert_eq!(BlockKind::of("## Section"), BlockKind::Heading);
        assert_eq!(BlockKind::of("```rust\nfn x() {}\n```"), BlockKind::Code);
        assert_eq!(BlockKind::of("    indented"), BlockKind::Code);
        assert_eq!(BlockKind::of("- item"), BlockKind::List);
        assert_eq!(BlockKind::of("* item"), BlockKind::List);
        assert_eq!(BlockKind::of("3. item"), BlockKind::List);
        assert_eq!(BlockKind::of("> quoted"), BlockKind::Quote);
        assert_eq!(BlockKind::of("| a | b |"), BlockKind::Table);
        assert_eq!(BlockKind::of("plain text"), BlockKind::Paragraph);
        assert_eq!(BlockKind::of("#hashtag"), BlockKind::Paragraph);
    }

    #[test]
    fn test_fence_keeps_blank_lines() {
        let md = "intro\n\n```\nline one\n\nline two\n```\n\noutro";
        let blocks = split_blocks(md);
        assert_eq!(blocks.len(), 3);
        assert!(blocks[1].contains("line one\n\nline two"));
    }

    #[test]
    fn test_heading_line_is_its_own_block() {
        let blocks = split_blocks("# Title\nbody text right after");
        assert_eq!(blocks, vec!["# Title".to_string(), "body text right after".to_string()]);
    }

    #[test]
    fn test_word_threshold_boundary() {
        let md = format!("{}\n\n{}", words(49), words(50));
        let out = postprocess(&md, 50);
        assert_eq!(out, words(50));
    }

    #[test]
    fn test_structural_blocks_survive() {
        let md = "# T\n\n- a\n- b\n\n> q\n\n```\nx\n```\n\nshort para";
        let out = postprocess(md, 50);
        assert_eq!(out, "# T\n\n- a\n- b\n\n> q\n\n```\nx\n```");
    }

    #[test]
    fn test_h1_extraction() {
        assert_eq!(extract_h1_title("intro\n\n# The Title\n\n# Second").as_deref(), Some("The Title"));
        assert_eq!(extract_h1_title("## Only H2").as_deref(), None);
        assert_eq!(extract_h1_title("```\n# comment\n```").as_deref(), None);
        assert_eq!(extract_h1_title("# Learning C#").as_deref(), Some("Learning C#"));
    }

    #[test]
    fn test_sanitize_title() {
        assert_eq!(sanitize_title("  A  /  B: C?  "), "A B C");
        assert_eq!(sanitize_title("<>|"), UNTITLED);
        assert_eq!(sanitize_title(&"x".repeat(300)).chars().count(), MAX_TITLE_CHARS);
    }

    #[test]
    fn test_title_precedence() {
        let md = "# From Heading\n\ntext";
        assert_eq!(resolve_title(Some("From Meta"), md, "https://e.com/a"), "From Meta");
        assert_eq!(resolve_title(Some("   "), md, "https://e.com/a"), "From Heading");
        assert_eq!(resolve_title(None, "no heading", "https://e.com/a/b"), "e.com - a - b");
    }
}
