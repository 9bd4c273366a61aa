//! Error types for rs-harvest.
//!
//! Strategy misses are not errors: they are `None` results inside the
//! extraction matrix. Only whole-URL outcomes surface here.

use crate::result::SourceMethod;

/// Error type for extraction and batch operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// HTML parsing failed.
    ///
    /// The core parses best-effort and never returns this; it exists for
    /// callers that validate fragments themselves.
    #[error("HTML parsing failed: {0}")]
    ParseError(String),

    /// Character encoding detection or conversion failed.
    #[error("Encoding detection failed: {0}")]
    EncodingError(String),

    /// Every strategy missed on every variant of every source.
    #[error("No extractable content found for {url} ({attempted} candidates attempted)")]
    NoContent {
        /// The URL being processed.
        url: String,
        /// Number of matrix combinations that were attempted.
        attempted: usize,
    },

    /// One fetch method did not produce HTML.
    #[error("{method} source unavailable: {reason}")]
    SourceUnavailable {
        /// The fetch method that failed.
        method: SourceMethod,
        /// Why it failed.
        reason: String,
    },

    /// A fetch method exceeded its time budget.
    #[error("{method} fetch timed out after {after_ms} ms")]
    Timeout {
        /// The fetch method that timed out.
        method: SourceMethod,
        /// The budget that was exceeded.
        after_ms: u64,
    },

    /// Transport-level fetch failure.
    #[error("Fetch failed: {0}")]
    Fetch(String),

    /// The document sink rejected a finished document.
    #[error("Document sink failed: {0}")]
    Sink(String),

    /// A worker task panicked or was cancelled.
    #[error("Worker task failed: {0}")]
    Task(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Filesystem failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether a later batch round may succeed where this one failed.
    ///
    /// Configuration errors are permanent; everything else is worth another
    /// round because both fetch sources are re-run.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Config(_))
    }
}

/// Result type alias for extraction operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_content_message_names_url() {
        let err = Error::NoContent {
            url: "https://example.com/a".to_string(),
            attempted: 12,
        };
        let msg = err.to_string();
        assert!(msg.contains("https://example.com/a"));
        assert!(msg.contains("12"));
    }

    #[test]
    fn source_unavailable_names_method() {
        let err = Error::SourceUnavailable {
            method: SourceMethod::Rendered,
            reason: "browser crashed".to_string(),
        };
        assert_eq!(err.to_string(), "rendered source unavailable: browser crashed");
    }

    #[test]
    fn config_errors_are_permanent() {
        assert!(!Error::Config("bad".into()).is_retryable());
        assert!(Error::Fetch("reset".into()).is_retryable());
    }
}
