//! Winner selection.
//!
//! Every eligible candidate is compared; there is no early exit. The
//! longest whitespace-normalized content wins. Ties break on strategy
//! (generic, multi-container, css-priority), then source (static,
//! rendered), then variant (raw, cleaned, pruned).

use std::cmp::Ordering;

use tracing::debug;

use crate::error::{Error, Result};
use crate::matrix::is_eligible;
use crate::result::{ExtractionCandidate, ExtractionResult};

/// Total order over candidates: `Less` means `a` is preferred.
#[must_use]
pub fn compare(a: &ExtractionCandidate, b: &ExtractionCandidate) -> Ordering {
    b.length()
        .cmp(&a.length())
        .then_with(|| a.strategy().priority().cmp(&b.strategy().priority()))
        .then_with(|| a.source().priority().cmp(&b.source().priority()))
        .then_with(|| a.variant().priority().cmp(&b.variant().priority()))
}

/// Pick the winner among `candidates`.
///
/// Only successful candidates of at least `min_chars` characters compete.
/// Fails with [`Error::NoContent`] when none qualifies.
pub fn select(candidates: &[ExtractionCandidate], min_chars: usize, url: &str) -> Result<ExtractionResult> {
    let winner = candidates
        .iter()
        .filter(|c| is_eligible(c, min_chars))
        .min_by(|a, b| compare(a, b))
        .ok_or_else(|| Error::NoContent {
            url: url.to_string(),
            attempted: candidates.len(),
        })?;

    let result = ExtractionResult::new(winner.clone());
    debug!(
        url,
        winner = %result.provenance_label,
        variant = winner.variant().as_str(),
        length = winner.length(),
        "selected candidate"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::{HtmlVariant, SourceMethod, StrategyKind};

    fn candidate(
        source: SourceMethod,
        variant: HtmlVariant,
        strategy: StrategyKind,
        len: usize,
    ) -> ExtractionCandidate {
        ExtractionCandidate::new(source, variant, strategy, Some("x".repeat(len)))
    }

    #[test]
    fn test_longest_wins() {
        let pool = vec![
            candidate(SourceMethod::Static, HtmlVariant::Raw, StrategyKind::Generic, 100),
            candidate(SourceMethod::Rendered, HtmlVariant::Pruned, StrategyKind::CssPriority, 300),
            candidate(SourceMethod::Static, HtmlVariant::Cleaned, StrategyKind::MultiContainer, 200),
        ];
        let result = select(&pool, 50, "u").unwrap();
        assert_eq!(result.candidate.length(), 300);
        assert_eq!(result.provenance_label, "rendered with css-priority");
    }

    #[test]
    fn test_strategy_breaks_ties_first() {
        let pool = vec![
            candidate(SourceMethod::Static, HtmlVariant::Raw, StrategyKind::CssPriority, 120),
            candidate(SourceMethod::Rendered, HtmlVariant::Pruned, StrategyKind::Generic, 120),
            candidate(SourceMethod::Static, HtmlVariant::Raw, StrategyKind::MultiContainer, 120),
        ];
        let result = select(&pool, 50, "u").unwrap();
        assert_eq!(result.candidate.strategy(), StrategyKind::Generic);
    }

    #[test]
    fn test_source_then_variant_break_ties() {
        let pool = vec![
            candidate(SourceMethod::Rendered, HtmlVariant::Raw, StrategyKind::Generic, 120),
            candidate(SourceMethod::Static, HtmlVariant::Pruned, StrategyKind::Generic, 120),
            candidate(SourceMethod::Static, HtmlVariant::Cleaned, StrategyKind::Generic, 120),
        ];
        let result = select(&pool, 50, "u").unwrap();
        assert_eq!(result.candidate.source(), SourceMethod::Static);
        assert_eq!(result.candidate.variant(), HtmlVariant::Cleaned);
    }

    #[test]
    fn test_order_of_input_does_not_matter() {
        let mut pool = vec![
            candidate(SourceMethod::Rendered, HtmlVariant::Raw, StrategyKind::MultiContainer, 150),
            candidate(SourceMethod::Static, HtmlVariant::Raw, StrategyKind::MultiContainer, 150),
            candidate(SourceMethod::Static, HtmlVariant::Raw, StrategyKind::CssPriority, 90),
        ];
        let first = select(&pool, 50, "u").unwrap();
        pool.reverse();
        let second = select(&pool, 50, "u").unwrap();
        assert_eq!(first, second);
        assert_eq!(first.candidate.source(), SourceMethod::Static);
    }

    #[test]
    fn test_short_and_failed_candidates_never_win() {
        let pool = vec![
            candidate(SourceMethod::Static, HtmlVariant::Raw, StrategyKind::Generic, 10),
            ExtractionCandidate::new(SourceMethod::Static, HtmlVariant::Raw, StrategyKind::MultiContainer, None),
        ];
        let err = select(&pool, 50, "https://example.com").unwrap_err();
        match err {
            Error::NoContent { url, attempted } => {
                assert_eq!(url, "https://example.com");
                assert_eq!(attempted, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_pool_is_no_content() {
        assert!(matches!(select(&[], 50, "u"), Err(Error::NoContent { attempted: 0, .. })));
    }
}
