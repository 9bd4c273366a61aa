//! # rs-harvest
//!
//! Multi-strategy article extraction for web pages.
//!
//! Each page may arrive twice: as static HTML and as HTML rendered by a
//! headless browser. Every source is cleaned and pruned, three extraction
//! strategies run on each variant, and the longest Markdown candidate wins.
//! The winner is filtered block by block and given a file-safe title.
//!
//! ## Quick Start
//!
//! ```rust
//! use rs_harvest::{extract_article, Error};
//!
//! let words = vec!["lorem"; 120].join(" ");
//! let html = format!(
//!     "<html><head><title>My Article</title></head><body>\
//!      <nav><a href='/'>Home</a></nav><article><p>{words}</p></article></body></html>"
//! );
//!
//! let output = extract_article(&html, "https://example.com/my-article")?;
//! assert_eq!(output.title, "My Article");
//! assert!(output.markdown.contains("lorem"));
//! # Ok::<(), Error>(())
//! ```
//!
//! ## Layers
//!
//! - **Core** ([`Pipeline`]): synchronous, one owned [`PageInput`] in, one
//!   [`PageOutput`] out.
//! - **Batch** ([`batch::BatchRunner`]): async fetch, retry rounds and
//!   storage through the [`batch::Fetcher`] and [`batch::DocumentSink`]
//!   traits.

mod error;
mod options;
mod result;

/// DOM helpers over `dom_query`.
pub mod dom;

/// Per-node text metrics over the parsed arena.
pub mod tree;

/// Shared regular expressions and word lists.
pub mod patterns;

/// Noise removal before extraction.
pub mod cleaner;

/// Content scoring and low-value subtree removal.
pub mod pruning;

/// Link density tests for boilerplate detection.
pub mod link_density;

/// The three content extraction strategies.
pub mod strategies;

/// Runs every strategy on every source variant.
pub mod matrix;

/// Winner selection among candidates.
pub mod selection;

/// Markdown block filtering and title resolution.
pub mod postprocess;

/// Metadata extraction (JSON-LD, meta tags, `<title>`).
pub mod metadata;

/// URL utilities for normalization and fallback names.
pub mod url_utils;

/// Character encoding detection and transcoding.
pub mod encoding;

/// The per-URL extraction pipeline.
pub mod pipeline;

/// Concurrent fetch, retry and storage of many URLs.
pub mod batch;

/// Tracing subscriber setup for binaries.
pub mod logging;

// Public API - re-exports
pub use error::{Error, Result};
pub use options::{BatchOptions, Options};
pub use pipeline::Pipeline;
pub use result::{
    ExtractionCandidate, ExtractionResult, HtmlVariant, PageInput, PageMetadata, PageOutput,
    SourceMethod, StrategyKind,
};

/// Extracts one page of static HTML with default options.
///
/// Fails with [`Error::NoContent`] when no strategy finds enough text.
#[allow(clippy::missing_errors_doc)]
pub fn extract_article(html: &str, url: &str) -> Result<PageOutput> {
    Pipeline::new(Options::default()).run(&PageInput::from_static(url, html))
}

/// Extracts one page from undecoded bytes; the charset is sniffed.
///
/// # Example
///
/// ```rust
/// use rs_harvest::extract_article_bytes;
///
/// let mut html = b"<html><head><meta charset=\"ISO-8859-1\"></head><body><article><p>".to_vec();
/// for _ in 0..80 {
///     html.extend_from_slice(b"caf\xE9 ");
/// }
/// html.extend_from_slice(b"</p></article></body></html>");
/// let output = extract_article_bytes(&html, "https://example.com/cafe")?;
/// assert!(output.markdown.contains("café"));
/// # Ok::<(), rs_harvest::Error>(())
/// ```
#[allow(clippy::missing_errors_doc)]
pub fn extract_article_bytes(html: &[u8], url: &str) -> Result<PageOutput> {
    Pipeline::new(Options::default()).run(&PageInput::from_static_bytes(url, html))
}
