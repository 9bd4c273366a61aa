//! Where finished documents go.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Files with the same title get numbered suffixes up to this count.
const MAX_NAME_SUFFIX: usize = 10_000;

/// A page ready for storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishedDocument {
    /// Source URL.
    pub url: String,
    /// Sanitized title, safe as a file name.
    pub title: String,
    /// Filtered Markdown body.
    pub markdown: String,
    /// Publication time, when known.
    pub published: Option<DateTime<Utc>>,
}

/// Storage backend for finished documents.
#[async_trait]
pub trait DocumentSink: Send + Sync {
    /// Store `doc` and return where it went.
    async fn store(&self, doc: &FinishedDocument) -> Result<String>;
}

/// Writes one `<title>.md` file per document into a directory.
///
/// Titles that collide get ` (2)`, ` (3)`, ... appended. Names are
/// reserved with `create_new`, so concurrent workers never overwrite each
/// other. The body goes through the reserving handle; a failed write
/// releases the name again.
#[derive(Debug, Clone)]
pub struct MarkdownDirSink {
    dir: PathBuf,
}

impl MarkdownDirSink {
    /// Sink writing into `dir`. The directory is created on first store.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn file_name(title: &str, n: usize) -> String {
        if n <= 1 {
            format!("{title}.md")
        } else {
            format!("{title} ({n}).md")
        }
    }

    async fn reserve(&self, title: &str) -> Result<(PathBuf, tokio::fs::File)> {
        for n in 1..=MAX_NAME_SUFFIX {
            let path = self.dir.join(Self::file_name(title, n));
            match tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => return Ok((path, file)),
                Err(err) if err.kind() == ErrorKind::AlreadyExists => {}
                Err(err) => return Err(Error::Sink(format!("{}: {err}", path.display()))),
            }
        }
        Err(Error::Sink(format!("no free file name for {title:?}")))
    }
}

#[async_trait]
impl DocumentSink for MarkdownDirSink {
    async fn store(&self, doc: &FinishedDocument) -> Result<String> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|err| Error::Sink(format!("create {}: {err}", self.dir.display())))?;

        let (path, file) = self.reserve(&doc.title).await?;
        write_reserved(&path, file, &render(doc)).await?;

        debug!(url = %doc.url, path = %path.display(), "stored document");
        Ok(path.display().to_string())
    }
}

/// Writes `body` through the handle that reserved `path`. On failure the
/// reserved file is removed so a later attempt can take the same name.
async fn write_reserved<W>(path: &Path, mut file: W, body: &str) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let written = async {
        file.write_all(body.as_bytes()).await?;
        file.flush().await
    }
    .await;

    if let Err(err) = written {
        if let Err(cleanup) = tokio::fs::remove_file(path).await {
            warn!(path = %path.display(), error = %cleanup, "could not release reserved file");
        }
        return Err(Error::Sink(format!("write {}: {err}", path.display())));
    }
    Ok(())
}

/// File body: the Markdown, followed by a source footer.
fn render(doc: &FinishedDocument) -> String {
    let mut out = String::with_capacity(doc.markdown.len() + doc.url.len() + 64);
    out.push_str(doc.markdown.trim_end());
    out.push_str("\n\n---\n\nSource: ");
    out.push_str(&doc.url);
    if let Some(published) = doc.published {
        out.push_str("\nPublished: ");
        out.push_str(&published.to_rfc3339());
    }
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    use super::*;

    /// A writer whose every write fails, like a full disk.
    struct FullDisk;

    impl AsyncWrite for FullDisk {
        fn poll_write(self: Pin<&mut Self>, _: &mut Context<'_>, _: &[u8]) -> Poll<io::Result<usize>> {
            Poll::Ready(Err(io::Error::other("no space left on device")))
        }

        fn poll_flush(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    fn doc(title: &str) -> FinishedDocument {
        FinishedDocument {
            url: "https://example.com/a".into(),
            title: title.into(),
            markdown: "Body text.".into(),
            published: None,
        }
    }

    #[tokio::test]
    async fn test_store_writes_markdown_file() {
        let dir = tempfile::tempdir().unwrap();
        let sink = MarkdownDirSink::new(dir.path().join("out"));
        let location = sink.store(&doc("My Post")).await.unwrap();
        assert!(location.ends_with("My Post.md"));

        let body = std::fs::read_to_string(&location).unwrap();
        assert!(body.starts_with("Body text."));
        assert!(body.contains("Source: https://example.com/a"));
    }

    #[tokio::test]
    async fn test_colliding_titles_get_suffixes() {
        let dir = tempfile::tempdir().unwrap();
        let sink = MarkdownDirSink::new(dir.path());
        let first = sink.store(&doc("Same")).await.unwrap();
        let second = sink.store(&doc("Same")).await.unwrap();
        let third = sink.store(&doc("Same")).await.unwrap();
        assert!(first.ends_with("Same.md"));
        assert!(second.ends_with("Same (2).md"));
        assert!(third.ends_with("Same (3).md"));
    }

    #[tokio::test]
    async fn test_failed_write_releases_the_name() {
        let dir = tempfile::tempdir().unwrap();
        let sink = MarkdownDirSink::new(dir.path());
        let (path, _file) = sink.reserve("Retried").await.unwrap();
        assert!(path.exists());

        let err = write_reserved(&path, FullDisk, "body").await.unwrap_err();
        assert!(matches!(err, Error::Sink(msg) if msg.contains("no space left")));
        assert!(!path.exists());

        let location = sink.store(&doc("Retried")).await.unwrap();
        assert!(location.ends_with("Retried.md"));
        assert!(std::fs::read_to_string(&location).unwrap().starts_with("Body text."));
    }
}
