//! Extract command - print the readable text of a PDF.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use serde::Serialize;
use tracing::{debug, info};

use readaloud_core::pdf::FileBlob;

use super::{extractor, load_config, open_upload, spinner};

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Input PDF file
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// Plain text
    Text,
    /// JSON document with the text and a few counts
    Json,
}

#[derive(Serialize)]
struct ExtractOutput<'a> {
    file: &'a str,
    size: u64,
    characters: usize,
    words: usize,
    text: &'a str,
}

pub async fn run(args: ExtractArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    let file = open_upload(&args.input, &config)?;
    info!("Extracting text from {}", args.input.display());

    let pb = spinner("Processing PDF...");
    let result = extractor(&config).extract(&file).await;
    pb.finish_and_clear();
    let text = result?;

    let output = match args.format {
        OutputFormat::Text => text.clone(),
        OutputFormat::Json => serde_json::to_string_pretty(&ExtractOutput {
            file: file.name(),
            size: file.size(),
            characters: text.chars().count(),
            words: text.split_whitespace().count(),
            text: &text,
        })?,
    };

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    debug!("Total processing time: {:?}", start.elapsed());
    Ok(())
}
