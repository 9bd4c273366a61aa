//! Performance benchmarks for rs-harvest.
//!
//! Run with: `cargo bench`
//!
//! Benchmarks include:
//! - the full 12-candidate pipeline on a synthetic article
//! - the cleaner and pruner on their own
//! - pages of increasing size for throughput

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rs_harvest::{cleaner, pruning, Options, PageInput, Pipeline};

fn sample_html(paragraphs: usize) -> String {
    let body: String = (0..paragraphs)
        .map(|i| {
            format!(
                "<p>Paragraph {i} of the benchmark article. It carries enough ordinary prose \
                 to look like real writing, with several clauses and a handful of \
                 <a href=\"/ref/{i}\">inline links</a> scattered through the text so the \
                 scoring has something to weigh.</p>"
            )
        })
        .collect();
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="UTF-8"><title>Sample Article | Bench Site</title></head>
<body>
    <nav><a href="/">Home</a> <a href="/about">About</a></nav>
    <div class="cookie-banner">We use cookies.</div>
    <article>
        <h1>Sample Article Title</h1>
        {body}
    </article>
    <aside class="sidebar"><h3>Related</h3><ul><li>One</li><li>Two</li></ul></aside>
    <footer><p>Copyright 2024</p></footer>
</body>
</html>"#
    )
}

fn bench_pipeline_default(c: &mut Criterion) {
    let pipeline = Pipeline::new(Options::default());
    let input = PageInput::new(
        "https://example.com/bench",
        Some(sample_html(12)),
        Some(sample_html(14)),
    );

    c.bench_function("pipeline_two_sources", |b| {
        b.iter(|| pipeline.run(black_box(&input)));
    });
}

fn bench_clean_and_prune(c: &mut Criterion) {
    let html = sample_html(12);
    let settings = Options::default().prune_settings();

    c.bench_function("clean", |b| {
        b.iter(|| cleaner::clean(black_box(&html)));
    });
    let cleaned = cleaner::clean(&html);
    c.bench_function("prune", |b| {
        b.iter(|| pruning::prune(black_box(&cleaned), black_box(&settings)));
    });
}

fn bench_page_sizes(c: &mut Criterion) {
    let pipeline = Pipeline::new(Options::default());
    let mut group = c.benchmark_group("page_size");

    for paragraphs in [5, 50, 250] {
        let input = PageInput::from_static("https://example.com/bench", sample_html(paragraphs));
        let size_kb = input.static_html.as_ref().map_or(0, String::len) / 1024;
        group.throughput(Throughput::Bytes(
            input.static_html.as_ref().map_or(0, String::len) as u64,
        ));
        group.bench_with_input(
            BenchmarkId::new("pipeline", format!("{paragraphs} paragraphs ({size_kb}KB)")),
            &input,
            |b, input| {
                b.iter(|| pipeline.run(black_box(input)));
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_pipeline_default, bench_clean_and_prune, bench_page_sizes);
criterion_main!(benches);
