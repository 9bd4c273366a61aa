//! End-of-batch report.

use std::fmt;

use serde::Serialize;

use crate::result::PageOutput;

/// A URL that was extracted and stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Delivered {
    /// Pipeline output.
    pub output: PageOutput,
    /// Where the sink put the document.
    pub location: String,
}

/// Final state of one input URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UrlReport {
    /// The URL as given (after normalization).
    pub url: String,
    /// Batch rounds this URL took part in.
    pub attempts: usize,
    /// Delivery, or the last error message.
    pub outcome: Result<Delivered, String>,
}

impl UrlReport {
    /// Whether the URL was delivered.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }

    /// One report line.
    ///
    /// `[OK] || [static with generic] || 12,345 chars || "Title" || url -> location`
    /// or `[FAIL] || url || error`.
    #[must_use]
    pub fn line(&self) -> String {
        match &self.outcome {
            Ok(delivered) => format!(
                "[OK] || [{}] || {} chars || \"{}\" || {} -> {}",
                delivered.output.provenance_label,
                group_thousands(delivered.output.content_length),
                delivered.output.title,
                self.url,
                delivered.location
            ),
            Err(err) => format!("[FAIL] || {} || {err}", self.url),
        }
    }
}

/// Per-URL results in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    /// One entry per input URL.
    pub entries: Vec<UrlReport>,
    /// Rounds actually run.
    pub rounds: usize,
}

impl BatchReport {
    /// Delivered URLs.
    pub fn succeeded(&self) -> impl Iterator<Item = &UrlReport> {
        self.entries.iter().filter(|e| e.is_ok())
    }

    /// URLs that failed in every round.
    pub fn failed(&self) -> impl Iterator<Item = &UrlReport> {
        self.entries.iter().filter(|e| !e.is_ok())
    }

    /// Whether every URL was delivered.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.entries.iter().all(UrlReport::is_ok)
    }

    /// `Done: ok/total succeeded, failed failed.`
    #[must_use]
    pub fn summary(&self) -> String {
        let ok = self.succeeded().count();
        format!(
            "Done: {ok}/{} succeeded, {} failed.",
            self.entries.len(),
            self.entries.len() - ok
        )
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            writeln!(f, "{}", entry.line())?;
        }
        write!(f, "{}", self.summary())
    }
}

/// `12345` -> `12,345`.
fn group_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delivered(len: usize) -> Delivered {
        Delivered {
            output: PageOutput {
                markdown: "body".into(),
                title: "A Title".into(),
                provenance_label: "static with generic".into(),
                content_length: len,
                candidates_considered: 4,
                published: None,
            },
            location: "out/A Title.md".into(),
        }
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(1_234_567), "1,234,567");
    }

    #[test]
    fn test_ok_line() {
        let entry = UrlReport {
            url: "https://e.com/a".into(),
            attempts: 1,
            outcome: Ok(delivered(12_345)),
        };
        assert_eq!(
            entry.line(),
            "[OK] || [static with generic] || 12,345 chars || \"A Title\" || https://e.com/a -> out/A Title.md"
        );
    }

    #[test]
    fn test_report_display_and_summary() {
        let report = BatchReport {
            entries: vec![
                UrlReport {
                    url: "https://e.com/a".into(),
                    attempts: 1,
                    outcome: Ok(delivered(100)),
                },
                UrlReport {
                    url: "https://e.com/b".into(),
                    attempts: 3,
                    outcome: Err("no content".into()),
                },
            ],
            rounds: 3,
        };
        assert!(!report.all_succeeded());
        assert_eq!(report.summary(), "Done: 1/2 succeeded, 1 failed.");
        let text = report.to_string();
        assert!(text.contains("[FAIL] || https://e.com/b || no content"));
        assert!(text.ends_with("Done: 1/2 succeeded, 1 failed."));
    }
}
