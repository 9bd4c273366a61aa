use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rs_harvest::batch::{
    BatchRunner, DocumentSink, FetchedPage, Fetcher, FileFetcher, FinishedDocument, MarkdownDirSink,
};
use rs_harvest::{BatchOptions, Error, Options, PageMetadata, Pipeline, Result, SourceMethod};

fn article(marker: &str) -> String {
    let words: Vec<String> = (0..80).map(|i| format!("word{i}")).collect();
    format!(
        "<html><body><article><h1>{marker} Heading</h1><p>{marker} {}.</p></article></body></html>",
        words.join(" ")
    )
}

fn fast_options() -> BatchOptions {
    BatchOptions {
        max_concurrency: 4,
        static_timeout_ms: 500,
        rendered_timeout_ms: 500,
        round_backoff_ms: 1,
        ..BatchOptions::default()
    }
}

/// Serves fixed pages; unknown URLs fail with a transport error.
struct PageFetcher {
    pages: HashMap<String, String>,
    delay: Duration,
    calls: AtomicUsize,
}

impl PageFetcher {
    fn new(pages: &[(&str, String)]) -> Self {
        Self {
            pages: pages
                .iter()
                .map(|(url, html)| ((*url).to_string(), html.clone()))
                .collect(),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    fn slow(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl Fetcher for PageFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.pages
            .get(url)
            .map(|html| FetchedPage::new(html.clone()))
            .ok_or_else(|| Error::Fetch(format!("404 for {url}")))
    }
}

/// Fails the first `failures` calls, then serves `html`.
struct FlakyFetcher {
    failures: usize,
    html: String,
    calls: AtomicUsize,
}

#[async_trait]
impl Fetcher for FlakyFetcher {
    async fn fetch(&self, _url: &str) -> Result<FetchedPage> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            Err(Error::Fetch("connection reset".into()))
        } else {
            Ok(FetchedPage {
                html: self.html.clone(),
                metadata: PageMetadata {
                    title: Some("Fetched Title".into()),
                    published: None,
                },
            })
        }
    }
}

#[derive(Default)]
struct MemorySink {
    docs: Mutex<Vec<FinishedDocument>>,
}

#[async_trait]
impl DocumentSink for MemorySink {
    async fn store(&self, doc: &FinishedDocument) -> Result<String> {
        let mut docs = self.docs.lock().unwrap();
        docs.push(doc.clone());
        Ok(format!("memory://{}", docs.len()))
    }
}

fn urls(list: &[&str]) -> Vec<String> {
    list.iter().map(|u| (*u).to_string()).collect()
}

#[tokio::test]
async fn report_keeps_input_order() {
    let fetcher = PageFetcher::new(&[
        ("https://e.com/1", article("FIRST")),
        ("https://e.com/2", article("SECOND")),
        ("https://e.com/3", article("THIRD")),
    ]);
    let sink = Arc::new(MemorySink::default());
    let runner = BatchRunner::new(
        Pipeline::new(Options::default()),
        Arc::new(fetcher),
        sink.clone(),
        fast_options(),
    );

    let report = runner
        .run(&urls(&["https://e.com/3", "https://e.com/1", "https://e.com/2"]))
        .await;

    let order: Vec<&str> = report.entries.iter().map(|e| e.url.as_str()).collect();
    assert_eq!(order, ["https://e.com/3", "https://e.com/1", "https://e.com/2"]);
    assert!(report.all_succeeded());
    assert_eq!(report.rounds, 1);
    assert_eq!(sink.docs.lock().unwrap().len(), 3);
    assert_eq!(report.summary(), "Done: 3/3 succeeded, 0 failed.");
}

#[tokio::test]
async fn no_content_url_does_not_block_the_batch() {
    let fetcher = PageFetcher::new(&[
        ("https://e.com/good", article("GOOD")),
        ("https://e.com/thin", "<html><body><p>Too short.</p></body></html>".to_string()),
    ]);
    let runner = BatchRunner::new(
        Pipeline::new(Options::default()),
        Arc::new(fetcher),
        Arc::new(MemorySink::default()),
        fast_options(),
    );

    let report = runner.run(&urls(&["https://e.com/thin", "https://e.com/good"])).await;

    let thin = &report.entries[0];
    assert!(!thin.is_ok());
    assert_eq!(thin.attempts, 3);
    assert!(thin.line().starts_with("[FAIL] || https://e.com/thin || No extractable content"));

    let good = &report.entries[1];
    assert!(good.is_ok());
    assert_eq!(good.attempts, 1);
    assert!(good.line().starts_with("[OK] || [static with "));
    assert_eq!(report.summary(), "Done: 1/2 succeeded, 1 failed.");
}

#[tokio::test]
async fn failed_url_is_retried_in_a_later_round() {
    let fetcher = Arc::new(FlakyFetcher {
        failures: 1,
        html: article("RETRIED"),
        calls: AtomicUsize::new(0),
    });
    let sink = Arc::new(MemorySink::default());
    let runner = BatchRunner::new(
        Pipeline::new(Options::default()),
        fetcher.clone(),
        sink.clone(),
        fast_options(),
    );

    let report = runner.run(&urls(&["https://e.com/flaky"])).await;

    assert!(report.all_succeeded());
    assert_eq!(report.entries[0].attempts, 2);
    assert_eq!(report.rounds, 2);
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);

    let docs = sink.docs.lock().unwrap();
    assert_eq!(docs[0].title, "Fetched Title");
    assert!(docs[0].markdown.contains("RETRIED"));
}

#[tokio::test]
async fn rounds_are_bounded() {
    let fetcher = Arc::new(FlakyFetcher {
        failures: usize::MAX,
        html: String::new(),
        calls: AtomicUsize::new(0),
    });
    let options = BatchOptions {
        max_rounds: 2,
        ..fast_options()
    };
    let runner = BatchRunner::new(
        Pipeline::new(Options::default()),
        fetcher.clone(),
        Arc::new(MemorySink::default()),
        options,
    );

    let report = runner.run(&urls(&["https://e.com/down"])).await;
    assert_eq!(report.entries[0].attempts, 2);
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
    assert!(matches!(&report.entries[0].outcome, Err(msg) if msg.contains("connection reset")));
}

#[tokio::test]
async fn slow_static_fetch_times_out_and_rendered_is_used() {
    let slow_static =
        PageFetcher::new(&[("https://e.com/a", article("STATIC"))]).slow(Duration::from_secs(5));
    let rendered = PageFetcher::new(&[("https://e.com/a", article("RENDERED"))]);
    let options = BatchOptions {
        static_timeout_ms: 20,
        ..fast_options()
    };
    let sink = Arc::new(MemorySink::default());
    let runner = BatchRunner::new(
        Pipeline::new(Options::default()),
        Arc::new(slow_static),
        sink.clone(),
        options,
    )
    .with_rendered(Arc::new(rendered));

    let report = runner.run(&urls(&["https://e.com/a"])).await;

    assert!(report.all_succeeded());
    let delivered = report.entries[0].outcome.as_ref().unwrap();
    assert!(delivered.output.provenance_label.starts_with("rendered with "));
    assert!(sink.docs.lock().unwrap()[0].markdown.contains("RENDERED"));
}

#[tokio::test]
async fn both_fetches_failing_reports_both_reasons() {
    let slow = PageFetcher::new(&[]).slow(Duration::from_secs(5));
    let missing = PageFetcher::new(&[]);
    let options = BatchOptions {
        static_timeout_ms: 20,
        max_rounds: 1,
        ..fast_options()
    };
    let runner = BatchRunner::new(
        Pipeline::new(Options::default()),
        Arc::new(slow),
        Arc::new(MemorySink::default()),
        options,
    )
    .with_rendered(Arc::new(missing));

    let report = runner.run(&urls(&["https://e.com/gone"])).await;
    let Err(reason) = &report.entries[0].outcome else {
        panic!("expected failure");
    };
    assert!(reason.contains("static fetch timed out after 20 ms"));
    assert!(reason.contains("404 for https://e.com/gone"));
}

#[tokio::test]
async fn file_fetcher_and_dir_sink_end_to_end() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let page = input.path().join("post.html");
    std::fs::write(
        &page,
        format!(
            "<html><head><title>File Based Post | Site</title></head>{}",
            article("FROMDISK")
        ),
    )
    .unwrap();

    let fetcher = FileFetcher::new(SourceMethod::Static).route("https://e.com/post", &page);
    let runner = BatchRunner::new(
        Pipeline::new(Options::default()),
        Arc::new(fetcher),
        Arc::new(MarkdownDirSink::new(output.path())),
        fast_options(),
    );

    let report = runner.run(&urls(&["https://e.com/post"])).await;
    assert!(report.all_succeeded(), "{report}");

    let written = std::fs::read_to_string(output.path().join("File Based Post.md")).unwrap();
    assert!(written.contains("FROMDISK"));
    assert!(written.contains("Source: https://e.com/post"));
}
