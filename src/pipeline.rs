//! Per-URL extraction pipeline.
//!
//! Runs the strategy matrix over a page's sources, picks the winner,
//! filters the Markdown and resolves the title. Synchronous and
//! self-contained: everything it touches is owned by the call.

use tracing::{debug, info, info_span, warn};

use crate::error::Result;
use crate::matrix;
use crate::metadata;
use crate::postprocess;
use crate::result::{PageInput, PageMetadata, PageOutput, SourceMethod};
use crate::selection;
use crate::strategies::StrategySet;
use crate::Options;

/// The extraction core, configured once and reused for many pages.
///
/// # Example
///
/// ```rust,no_run
/// use rs_harvest::{PageInput, Pipeline, Options};
///
/// let pipeline = Pipeline::new(Options::default());
/// let input = PageInput::from_static("https://example.com/post", "<html>...</html>");
/// let output = pipeline.run(&input)?;
/// println!("{} ({})", output.title, output.provenance_label);
/// # Ok::<(), rs_harvest::Error>(())
/// ```
pub struct Pipeline {
    options: Options,
    strategies: StrategySet,
}

impl Pipeline {
    /// Builds a pipeline. Options are used as given.
    #[must_use]
    pub fn new(options: Options) -> Self {
        let strategies = StrategySet::new(&options);
        Self {
            options,
            strategies,
        }
    }

    /// Builds a pipeline after validating the options.
    pub fn try_new(options: Options) -> Result<Self> {
        options.validate()?;
        Ok(Self::new(options))
    }

    /// The options this pipeline was built with.
    #[must_use]
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Extract one page.
    ///
    /// Fails with [`crate::Error::NoContent`] when no candidate qualifies.
    pub fn run(&self, input: &PageInput) -> Result<PageOutput> {
        let span = info_span!("extract", url = %input.url);
        let _guard = span.enter();

        let metadata = self.page_metadata(input);
        let run = matrix::run_matrix_with(input, &self.options, &self.strategies);
        let min_chars = self.options.min_candidate_chars;
        let candidates_considered = run.pool(min_chars).len();
        debug!(
            attempted = run.attempted(),
            eligible = candidates_considered,
            unavailable = run.unavailable().len(),
            "matrix finished"
        );

        let winner = selection::select(run.candidates(), min_chars, &input.url)?;
        let markdown = postprocess::postprocess(winner.candidate.content(), self.options.min_block_words);
        if markdown.is_empty() {
            warn!(
                length = winner.candidate.length(),
                "every block of the winning candidate was below the word threshold"
            );
        }
        let title = postprocess::resolve_title(metadata.title.as_deref(), &markdown, &input.url);

        info!(
            winner = %winner.provenance_label,
            length = winner.candidate.length(),
            candidates = candidates_considered,
            title = %title,
            "extracted page"
        );

        Ok(PageOutput {
            markdown,
            title,
            provenance_label: winner.provenance_label,
            content_length: winner.candidate.length(),
            candidates_considered,
            published: metadata.published,
        })
    }

    /// Fetch-layer metadata, completed from the static then the rendered
    /// HTML when fields are missing.
    fn page_metadata(&self, input: &PageInput) -> PageMetadata {
        let mut metadata = input.metadata.clone();
        for source in SourceMethod::ALL {
            if metadata.title.is_some() && metadata.published.is_some() {
                break;
            }
            if let Some(html) = input.html(source) {
                metadata = metadata.or(metadata::extract_page_metadata(html));
            }
        }
        metadata
    }
}
