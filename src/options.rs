//! Configuration for the extraction core and the batch layer.
//!
//! Configuration is passed explicitly: `Pipeline::new(options)` and
//! `BatchRunner::new(..., batch_options)`. Several pipelines with different
//! settings can live in one process.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::pruning::PruneSettings;

/// Configuration options for content extraction.
///
/// All fields are public for easy configuration. Use `Default::default()`
/// for standard settings.
///
/// # Example
///
/// ```rust
/// use rs_harvest::Options;
///
/// let options = Options {
///     pruning_threshold: 0.6,
///     dynamic_threshold: false,
///     ..Options::default()
/// };
/// assert!(options.cleaning_enabled);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct Options {
    /// Produce the cleaned variant of each source.
    ///
    /// Default: `true`
    pub cleaning_enabled: bool,

    /// Produce the pruned variant of each source.
    ///
    /// Default: `true`
    pub pruning_enabled: bool,

    /// Elements scoring below this are pruned.
    ///
    /// Default: `0.48`
    pub pruning_threshold: f64,

    /// Lower the pruning threshold on sparse documents.
    ///
    /// Default: `true`
    pub dynamic_threshold: bool,

    /// Leaf-like elements with fewer words than this skip density penalties.
    ///
    /// Default: `10`
    pub min_word_threshold: usize,

    /// Plain Markdown paragraphs with fewer words than this are dropped.
    ///
    /// Default: `50`
    pub min_block_words: usize,

    /// Candidates shorter than this (normalized chars) never enter the pool.
    ///
    /// Default: `50`
    pub min_candidate_chars: usize,

    /// Keep link targets in the Markdown.
    ///
    /// Default: `true`
    pub include_links: bool,

    /// Keep image references in the Markdown.
    ///
    /// Default: `true`
    pub include_images: bool,

    /// Render tables as GFM tables.
    ///
    /// Default: `true`
    pub include_tables: bool,

    /// Let the generic strategy fall back to Readability when its own
    /// heuristics find nothing. Has no effect without the `readability`
    /// feature.
    ///
    /// Default: `true`
    pub use_readability_fallback: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            cleaning_enabled: true,
            pruning_enabled: true,
            pruning_threshold: 0.48,
            dynamic_threshold: true,
            min_word_threshold: 10,
            min_block_words: 50,
            min_candidate_chars: 50,
            include_links: true,
            include_images: true,
            include_tables: true,
            use_readability_fallback: true,
        }
    }
}

impl Options {
    /// Parses options from JSON; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.pruning_threshold) {
            return Err(Error::Config(format!(
                "pruning_threshold must be within [0, 1], got {}",
                self.pruning_threshold
            )));
        }
        Ok(())
    }

    /// Settings for the pruning filter.
    #[must_use]
    pub fn prune_settings(&self) -> PruneSettings {
        PruneSettings {
            threshold: self.pruning_threshold,
            min_word_threshold: self.min_word_threshold,
            dynamic_threshold: self.dynamic_threshold,
        }
    }
}

/// Settings for the batch orchestrator.
///
/// Durations are stored as milliseconds so the struct round-trips through
/// JSON configuration files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchOptions {
    /// URLs processed at once.
    ///
    /// Default: `15`
    pub max_concurrency: usize,

    /// Budget for the static fetch of one URL.
    ///
    /// Default: `30000`
    pub static_timeout_ms: u64,

    /// Budget for the rendered fetch of one URL.
    ///
    /// Default: `45000`
    pub rendered_timeout_ms: u64,

    /// Batch-level rounds; failed URLs are retried in the next round.
    ///
    /// Default: `3`
    pub max_rounds: usize,

    /// Pause before the second round; doubles for each later round.
    ///
    /// Default: `2000`
    pub round_backoff_ms: u64,

    /// Extra attempts a `RetryingFetcher` makes per method.
    ///
    /// Default: `2`
    pub fetch_retries: usize,

    /// First delay between fetch attempts; doubles per attempt.
    ///
    /// Default: `1000`
    pub fetch_retry_base_delay_ms: u64,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            max_concurrency: 15,
            static_timeout_ms: 30_000,
            rendered_timeout_ms: 45_000,
            max_rounds: 3,
            round_backoff_ms: 2_000,
            fetch_retries: 2,
            fetch_retry_base_delay_ms: 1_000,
        }
    }
}

impl BatchOptions {
    /// Parses batch options from JSON; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))
    }

    /// Static fetch budget.
    #[must_use]
    pub fn static_timeout(&self) -> Duration {
        Duration::from_millis(self.static_timeout_ms)
    }

    /// Rendered fetch budget.
    #[must_use]
    pub fn rendered_timeout(&self) -> Duration {
        Duration::from_millis(self.rendered_timeout_ms)
    }

    /// Pause before `round` (1-based; round 1 never waits).
    #[must_use]
    pub fn backoff_before_round(&self, round: usize) -> Duration {
        if round <= 1 {
            return Duration::ZERO;
        }
        let exponent = u32::try_from(round - 2).unwrap_or(u32::MAX).min(16);
        Duration::from_millis(self.round_backoff_ms.saturating_mul(1_u64 << exponent))
    }
}
