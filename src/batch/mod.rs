//! Batch orchestration.
//!
//! Fetches each URL by both methods concurrently, runs the synchronous
//! [`Pipeline`] on a blocking thread and hands the result to a
//! [`DocumentSink`]. URLs that fail are retried in later rounds; one bad
//! URL never stops the batch.

pub mod fetch;
pub mod report;
pub mod sink;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::options::BatchOptions;
use crate::pipeline::Pipeline;
use crate::result::{PageInput, SourceMethod};
use crate::url_utils;

pub use fetch::{FetchedPage, Fetcher, FileFetcher, FileRoute, RetryingFetcher};
pub use report::{BatchReport, Delivered, UrlReport};
pub use sink::{DocumentSink, FinishedDocument, MarkdownDirSink};

/// Everything a worker task needs, cheap to clone.
#[derive(Clone)]
struct Worker {
    pipeline: Arc<Pipeline>,
    static_fetcher: Arc<dyn Fetcher>,
    rendered_fetcher: Option<Arc<dyn Fetcher>>,
    sink: Arc<dyn DocumentSink>,
    static_timeout: Duration,
    rendered_timeout: Duration,
}

/// Runs many URLs through fetch, extraction and storage.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use rs_harvest::batch::{BatchRunner, FileFetcher, MarkdownDirSink};
/// use rs_harvest::{BatchOptions, Options, Pipeline, SourceMethod};
///
/// # async fn run() {
/// let fetcher = FileFetcher::new(SourceMethod::Static).route("https://example.com/a", "a.html");
/// let runner = BatchRunner::new(
///     Pipeline::new(Options::default()),
///     Arc::new(fetcher),
///     Arc::new(MarkdownDirSink::new("out")),
///     BatchOptions::default(),
/// );
/// let report = runner.run(&["https://example.com/a".to_string()]).await;
/// println!("{report}");
/// # }
/// ```
pub struct BatchRunner {
    worker: Worker,
    options: BatchOptions,
}

/// Per-URL progress across rounds.
struct Slot {
    url: String,
    attempts: usize,
    last_error: Option<String>,
    delivered: Option<Delivered>,
    terminal: bool,
}

impl Slot {
    fn pending(&self) -> bool {
        self.delivered.is_none() && !self.terminal
    }
}

impl BatchRunner {
    /// A runner with only a static fetcher.
    #[must_use]
    pub fn new(
        pipeline: Pipeline,
        static_fetcher: Arc<dyn Fetcher>,
        sink: Arc<dyn DocumentSink>,
        options: BatchOptions,
    ) -> Self {
        Self {
            worker: Worker {
                pipeline: Arc::new(pipeline),
                static_fetcher,
                rendered_fetcher: None,
                sink,
                static_timeout: options.static_timeout(),
                rendered_timeout: options.rendered_timeout(),
            },
            options,
        }
    }

    /// Adds a rendered-HTML fetcher (headless browser or equivalent).
    #[must_use]
    pub fn with_rendered(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.worker.rendered_fetcher = Some(fetcher);
        self
    }

    /// Process every URL. The report lists them in input order.
    pub async fn run(&self, urls: &[String]) -> BatchReport {
        let mut slots: Vec<Slot> = urls
            .iter()
            .map(|url| Slot {
                url: url_utils::normalize_url(url),
                attempts: 0,
                last_error: None,
                delivered: None,
                terminal: false,
            })
            .collect();

        let max_rounds = self.options.max_rounds.max(1);
        let mut rounds = 0;
        for round in 1..=max_rounds {
            let pending: Vec<usize> = (0..slots.len()).filter(|&i| slots[i].pending()).collect();
            if pending.is_empty() {
                break;
            }

            let backoff = self.options.backoff_before_round(round);
            if !backoff.is_zero() {
                info!(
                    round,
                    pending = pending.len(),
                    backoff_ms = backoff.as_millis() as u64,
                    "retrying failed URLs"
                );
                tokio::time::sleep(backoff).await;
            }

            rounds = round;
            self.run_round(round, &pending, &mut slots).await;
        }

        let entries = slots
            .into_iter()
            .map(|slot| UrlReport {
                url: slot.url,
                attempts: slot.attempts,
                outcome: match slot.delivered {
                    Some(delivered) => Ok(delivered),
                    None => Err(slot.last_error.unwrap_or_else(|| "not attempted".to_string())),
                },
            })
            .collect::<Vec<_>>();

        let report = BatchReport { entries, rounds };
        info!(
            rounds,
            succeeded = report.succeeded().count(),
            failed = report.failed().count(),
            "batch finished"
        );
        report
    }

    async fn run_round(&self, round: usize, pending: &[usize], slots: &mut [Slot]) {
        let semaphore = Arc::new(Semaphore::new(self.options.max_concurrency.max(1)));
        let mut join_set = tokio::task::JoinSet::new();

        for &idx in pending {
            let slot = &mut slots[idx];
            slot.attempts += 1;
            let url = slot.url.clone();
            let worker = self.worker.clone();
            let semaphore = Arc::clone(&semaphore);

            join_set.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return (idx, Err(Error::Task("worker semaphore closed".to_string())));
                };
                (idx, worker.process_url(&url).await)
            });
        }

        let mut reported = vec![false; slots.len()];
        while let Some(joined) = join_set.join_next().await {
            let (idx, outcome) = match joined {
                Ok(done) => done,
                Err(err) => {
                    warn!(round, error = %err, "batch worker task failed");
                    continue;
                }
            };
            reported[idx] = true;

            let slot = &mut slots[idx];
            match outcome {
                Ok(delivered) => {
                    debug!(url = %slot.url, round, location = %delivered.location, "delivered");
                    slot.delivered = Some(delivered);
                    slot.last_error = None;
                }
                Err(err) => {
                    slot.terminal = !err.is_retryable();
                    warn!(
                        url = %slot.url,
                        round,
                        retryable = !slot.terminal,
                        error = %err,
                        "URL failed"
                    );
                    slot.last_error = Some(err.to_string());
                }
            }
        }

        for &idx in pending {
            if !reported[idx] {
                slots[idx].last_error = Some(Error::Task("worker task aborted".to_string()).to_string());
            }
        }
    }
}

impl Worker {
    async fn process_url(&self, url: &str) -> Result<Delivered> {
        let rendered = async {
            match &self.rendered_fetcher {
                Some(fetcher) => {
                    fetch_with_timeout(fetcher.as_ref(), SourceMethod::Rendered, url, self.rendered_timeout).await
                }
                None => Err(Error::SourceUnavailable {
                    method: SourceMethod::Rendered,
                    reason: "no rendered fetcher configured".to_string(),
                }),
            }
        };
        let (static_page, rendered_page) = tokio::join!(
            fetch_with_timeout(self.static_fetcher.as_ref(), SourceMethod::Static, url, self.static_timeout),
            rendered
        );

        let input = match (static_page, rendered_page) {
            (Err(static_err), Err(rendered_err)) => {
                return Err(Error::Fetch(format!("{static_err}; {rendered_err}")));
            }
            (static_page, rendered_page) => {
                let static_page = source_or_log(url, static_page);
                let rendered_page = source_or_log(url, rendered_page);
                let metadata = match (&static_page, &rendered_page) {
                    (Some(s), Some(r)) => s.metadata.clone().or(r.metadata.clone()),
                    (Some(page), None) | (None, Some(page)) => page.metadata.clone(),
                    (None, None) => Default::default(),
                };
                PageInput::new(
                    url,
                    static_page.map(|p| p.html),
                    rendered_page.map(|p| p.html),
                )
                .with_metadata(metadata)
            }
        };

        let pipeline = Arc::clone(&self.pipeline);
        let output = tokio::task::spawn_blocking(move || pipeline.run(&input))
            .await
            .map_err(|err| Error::Task(err.to_string()))??;

        let document = FinishedDocument {
            url: url.to_string(),
            title: output.title.clone(),
            markdown: output.markdown.clone(),
            published: output.published,
        };
        let location = self.sink.store(&document).await?;
        Ok(Delivered { output, location })
    }
}

/// One fetch under its own time budget.
async fn fetch_with_timeout(
    fetcher: &dyn Fetcher,
    method: SourceMethod,
    url: &str,
    budget: Duration,
) -> Result<FetchedPage> {
    match tokio::time::timeout(budget, fetcher.fetch(url)).await {
        Ok(result) => result,
        Err(_) => Err(Error::Timeout {
            method,
            after_ms: budget.as_millis() as u64,
        }),
    }
}

fn source_or_log(url: &str, page: Result<FetchedPage>) -> Option<FetchedPage> {
    match page {
        Ok(page) => Some(page),
        Err(err @ Error::SourceUnavailable { .. }) => {
            debug!(url, error = %err, "source skipped");
            None
        }
        Err(err) => {
            warn!(url, error = %err, "one fetch method failed; continuing with the other");
            None
        }
    }
}
