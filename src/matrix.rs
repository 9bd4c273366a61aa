//! Strategy matrix runner.
//!
//! Derives the HTML variants of each source and runs the applicable
//! strategies on them:
//!
//! | variant | generic | multi-container | css-priority |
//! |---------|---------|-----------------|--------------|
//! | raw     | yes     | yes             | yes          |
//! | cleaned | yes     | yes             | no           |
//! | pruned  | yes     | no              | no           |
//!
//! That is six candidates per source and twelve at most. Every attempt is
//! recorded, misses included, so the selector sees the whole matrix.

use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, warn};

use crate::cleaner;
use crate::pruning;
use crate::result::{ExtractionCandidate, HtmlVariant, PageInput, SourceMethod, StrategyKind};
use crate::strategies::StrategySet;
use crate::Options;

/// Upper bound on candidates per page.
pub const MAX_CANDIDATES: usize = 12;

/// Strategies applied to each variant, in computation order.
const RAW_STRATEGIES: &[StrategyKind] = &[
    StrategyKind::Generic,
    StrategyKind::MultiContainer,
    StrategyKind::CssPriority,
];
const CLEANED_STRATEGIES: &[StrategyKind] = &[StrategyKind::Generic, StrategyKind::MultiContainer];
const PRUNED_STRATEGIES: &[StrategyKind] = &[StrategyKind::Generic];

/// Every candidate attempted for one page.
#[derive(Debug, Clone, Default)]
pub struct MatrixRun {
    candidates: Vec<ExtractionCandidate>,
    unavailable: Vec<SourceMethod>,
}

impl MatrixRun {
    /// All attempted candidates in computation order.
    #[must_use]
    pub fn candidates(&self) -> &[ExtractionCandidate] {
        &self.candidates
    }

    /// Sources that had no HTML.
    #[must_use]
    pub fn unavailable(&self) -> &[SourceMethod] {
        &self.unavailable
    }

    /// Number of attempted combinations.
    #[must_use]
    pub fn attempted(&self) -> usize {
        self.candidates.len()
    }

    /// Candidates eligible for selection: successful and at least
    /// `min_chars` long.
    #[must_use]
    pub fn pool(&self, min_chars: usize) -> Vec<&ExtractionCandidate> {
        self.candidates
            .iter()
            .filter(|c| is_eligible(c, min_chars))
            .collect()
    }
}

/// Pool membership test shared with the selector.
#[must_use]
pub fn is_eligible(candidate: &ExtractionCandidate, min_chars: usize) -> bool {
    candidate.success() && candidate.length() >= min_chars
}

/// Run the matrix with freshly built strategies.
#[must_use]
pub fn run_matrix(input: &PageInput, options: &Options) -> MatrixRun {
    run_matrix_with(input, options, &StrategySet::new(options))
}

/// Run the matrix with prepared strategies.
#[must_use]
pub fn run_matrix_with(input: &PageInput, options: &Options, strategies: &StrategySet) -> MatrixRun {
    let mut run = MatrixRun::default();

    for source in SourceMethod::ALL {
        let Some(raw) = input.html(source) else {
            debug!(url = %input.url, source = source.as_str(), "source unavailable");
            run.unavailable.push(source);
            continue;
        };

        for (variant, html) in variants(raw, options) {
            let kinds = match variant {
                HtmlVariant::Raw => RAW_STRATEGIES,
                HtmlVariant::Cleaned => CLEANED_STRATEGIES,
                HtmlVariant::Pruned => PRUNED_STRATEGIES,
            };
            for &kind in kinds {
                let content = attempt(strategies, kind, &html);
                let candidate = ExtractionCandidate::new(source, variant, kind, content);
                debug!(
                    url = %input.url,
                    source = source.as_str(),
                    variant = variant.as_str(),
                    strategy = kind.as_str(),
                    length = candidate.length(),
                    success = candidate.success(),
                    "matrix attempt"
                );
                run.candidates.push(candidate);
            }
        }
    }

    debug_assert!(run.candidates.len() <= MAX_CANDIDATES);
    run
}

/// The variants of one source, in computation order. Pruning starts from
/// the cleaned HTML, or from the raw HTML when cleaning is disabled.
fn variants(raw: &str, options: &Options) -> Vec<(HtmlVariant, String)> {
    let mut out = vec![(HtmlVariant::Raw, raw.to_string())];

    let cleaned = options.cleaning_enabled.then(|| cleaner::clean(raw));
    if options.pruning_enabled {
        let base = cleaned.as_deref().unwrap_or(raw);
        let pruned = pruning::prune(base, &options.prune_settings());
        if let Some(cleaned) = cleaned {
            out.push((HtmlVariant::Cleaned, cleaned));
        }
        out.push((HtmlVariant::Pruned, pruned));
    } else if let Some(cleaned) = cleaned {
        out.push((HtmlVariant::Cleaned, cleaned));
    }
    out
}

/// One strategy invocation. A panic inside a strategy is a miss.
fn attempt(strategies: &StrategySet, kind: StrategyKind, html: &str) -> Option<String> {
    let strategy = strategies.get(kind);
    match panic::catch_unwind(AssertUnwindSafe(|| strategy.extract(html))) {
        Ok(content) => content,
        Err(_) => {
            warn!(strategy = kind.as_str(), "strategy panicked, treating as a miss");
            None
        }
    }
}
