//! Fetch layer interface and the file-backed fetcher.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use crate::encoding;
use crate::error::{Error, Result};
use crate::options::BatchOptions;
use crate::result::{PageMetadata, SourceMethod};

/// HTML returned by one fetch method.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchedPage {
    /// Decoded HTML.
    pub html: String,
    /// Metadata the transport knew about (for example a browser's
    /// `document.title`).
    pub metadata: PageMetadata,
}

impl FetchedPage {
    /// Page without metadata.
    #[must_use]
    pub fn new(html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            metadata: PageMetadata::default(),
        }
    }
}

/// One fetch method (static HTTP, headless browser, local files, ...).
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch the HTML of `url`.
    async fn fetch(&self, url: &str) -> Result<FetchedPage>;
}

/// Where a [`FileFetcher`] finds one URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileRoute {
    /// HTML file on disk.
    pub path: PathBuf,
    /// Title to report as fetch-layer metadata.
    pub title: Option<String>,
    /// Charset label overriding detection.
    pub charset: Option<String>,
}

/// Serves pre-fetched HTML files, keyed by URL.
#[derive(Debug, Clone)]
pub struct FileFetcher {
    method: SourceMethod,
    routes: HashMap<String, FileRoute>,
}

impl FileFetcher {
    /// An empty fetcher for `method`.
    #[must_use]
    pub fn new(method: SourceMethod) -> Self {
        Self {
            method,
            routes: HashMap::new(),
        }
    }

    /// Map `url` to a file.
    #[must_use]
    pub fn route(self, url: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.route_with(
            url,
            FileRoute {
                path: path.into(),
                ..FileRoute::default()
            },
        )
    }

    /// Map `url` to a file with metadata.
    #[must_use]
    pub fn route_with(mut self, url: impl Into<String>, route: FileRoute) -> Self {
        self.routes.insert(url.into(), route);
        self
    }

    /// Number of routed URLs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Whether no URL is routed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[async_trait]
impl Fetcher for FileFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        let route = self.routes.get(url).ok_or_else(|| Error::SourceUnavailable {
            method: self.method,
            reason: format!("no file for {url}"),
        })?;

        let bytes = tokio::fs::read(&route.path).await.map_err(|err| Error::SourceUnavailable {
            method: self.method,
            reason: format!("{}: {err}", route.path.display()),
        })?;

        let html = match route.charset.as_deref() {
            Some(label) => encoding::decode_with_label(&bytes, label)?,
            None => encoding::transcode_to_utf8(&bytes),
        };

        Ok(FetchedPage {
            html,
            metadata: PageMetadata {
                title: route.title.clone(),
                published: None,
            },
        })
    }
}

/// Retries a fetcher with exponential backoff.
///
/// Makes `retries + 1` attempts, sleeping `base_delay * 2^attempt` between
/// them. [`Error::SourceUnavailable`] and non-retryable errors are returned
/// at once.
#[derive(Debug, Clone)]
pub struct RetryingFetcher<F> {
    inner: F,
    retries: usize,
    base_delay: Duration,
}

impl<F: Fetcher> RetryingFetcher<F> {
    /// Wraps `inner`.
    #[must_use]
    pub fn new(inner: F, retries: usize, base_delay: Duration) -> Self {
        Self {
            inner,
            retries,
            base_delay,
        }
    }

    /// Wraps `inner` with the retry settings of `options`.
    #[must_use]
    pub fn from_options(inner: F, options: &BatchOptions) -> Self {
        Self::new(
            inner,
            options.fetch_retries,
            Duration::from_millis(options.fetch_retry_base_delay_ms),
        )
    }

    fn delay(&self, attempt: usize) -> Duration {
        let exponent = u32::try_from(attempt).unwrap_or(u32::MAX).min(16);
        self.base_delay.saturating_mul(1_u32 << exponent)
    }
}

#[async_trait]
impl<F: Fetcher> Fetcher for RetryingFetcher<F> {
    async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        let mut attempt = 0;
        loop {
            match self.inner.fetch(url).await {
                Ok(page) => return Ok(page),
                Err(err)
                    if attempt < self.retries
                        && err.is_retryable()
                        && !matches!(err, Error::SourceUnavailable { .. }) =>
                {
                    let delay = self.delay(attempt);
                    warn!(
                        url,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "fetch failed; retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
