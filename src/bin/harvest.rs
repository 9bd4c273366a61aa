//! Batch extraction from a manifest of pre-fetched pages.
//!
//! Usage: `harvest <manifest.json> <out-dir> [options.json]`
//!
//! The manifest is a JSON array of
//! `{"url": ..., "static_path": ..., "rendered_path": ..., "title": ..., "charset": ...}`
//! where every field but `url` is optional. Relative paths are resolved
//! against the manifest's directory. The optional options file holds
//! `{"extraction": {...}, "batch": {...}}`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use rs_harvest::batch::{BatchRunner, FileFetcher, FileRoute, MarkdownDirSink, RetryingFetcher};
use rs_harvest::{logging, BatchOptions, Options, Pipeline, SourceMethod};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct ManifestEntry {
    url: String,
    static_path: Option<PathBuf>,
    rendered_path: Option<PathBuf>,
    title: Option<String>,
    charset: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Settings {
    extraction: Options,
    batch: BatchOptions,
}

fn load_settings(path: Option<&str>) -> anyhow::Result<Settings> {
    let Some(path) = path else {
        return Ok(Settings::default());
    };
    let raw = std::fs::read_to_string(path).with_context(|| format!("read options: {path}"))?;
    let settings: Settings =
        serde_json::from_str(&raw).with_context(|| format!("parse options: {path}"))?;
    settings.extraction.validate().context("validate options")?;
    Ok(settings)
}

fn route(base: &Path, entry: &ManifestEntry, path: &Path) -> FileRoute {
    FileRoute {
        path: base.join(path),
        title: entry.title.clone(),
        charset: entry.charset.clone(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init()?;

    let mut args = std::env::args().skip(1);
    let (Some(manifest_path), Some(out_dir)) = (args.next(), args.next()) else {
        anyhow::bail!("usage: harvest <manifest.json> <out-dir> [options.json]");
    };
    let settings = load_settings(args.next().as_deref())?;

    let raw = std::fs::read_to_string(&manifest_path)
        .with_context(|| format!("read manifest: {manifest_path}"))?;
    let entries: Vec<ManifestEntry> =
        serde_json::from_str(&raw).with_context(|| format!("parse manifest: {manifest_path}"))?;
    let base = Path::new(&manifest_path)
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();

    let mut static_files = FileFetcher::new(SourceMethod::Static);
    let mut rendered_files = FileFetcher::new(SourceMethod::Rendered);
    let mut urls = Vec::with_capacity(entries.len());
    for entry in &entries {
        let url = rs_harvest::url_utils::normalize_url(&entry.url);
        if let Some(path) = &entry.static_path {
            static_files = static_files.route_with(url.clone(), route(&base, entry, path));
        }
        if let Some(path) = &entry.rendered_path {
            rendered_files = rendered_files.route_with(url.clone(), route(&base, entry, path));
        }
        urls.push(url);
    }
    tracing::info!(
        urls = urls.len(),
        static_files = static_files.len(),
        rendered_files = rendered_files.len(),
        "loaded manifest"
    );

    let mut runner = BatchRunner::new(
        Pipeline::new(settings.extraction),
        Arc::new(RetryingFetcher::from_options(static_files, &settings.batch)),
        Arc::new(MarkdownDirSink::new(out_dir)),
        settings.batch.clone(),
    );
    if !rendered_files.is_empty() {
        runner = runner.with_rendered(Arc::new(RetryingFetcher::from_options(
            rendered_files,
            &settings.batch,
        )));
    }

    let report = runner.run(&urls).await;
    for entry in &report.entries {
        if entry.is_ok() {
            println!("{}", entry.line());
        } else {
            eprintln!("{}", entry.line());
        }
    }
    println!("\n{}", report.summary());

    if !report.all_succeeded() {
        std::process::exit(1);
    }
    Ok(())
}
