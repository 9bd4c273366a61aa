//! Reads HTML from stdin and prints the extraction result as JSON.
//!
//! Usage: `extract_stdin [URL] < page.html`

use std::io::{self, Read};

use anyhow::Context as _;
use rs_harvest::{logging, PageInput, Pipeline, Options};

fn main() -> anyhow::Result<()> {
    logging::init()?;

    let url = std::env::args().nth(1).unwrap_or_default();

    let mut html = Vec::new();
    io::stdin().read_to_end(&mut html).context("read stdin")?;

    let pipeline = Pipeline::new(Options::default());
    let output = pipeline
        .run(&PageInput::from_static_bytes(url, &html))
        .context("extract page")?;

    println!(
        "{}",
        serde_json::to_string_pretty(&output).context("serialize output")?
    );
    Ok(())
}
