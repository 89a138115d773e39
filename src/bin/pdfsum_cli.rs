//! Command-line entrypoint.
//!
//! Summarizes local PDF files through the same pipeline as the HTTP server. Directories are
//! walked recursively for `*.pdf` files. Exits with status 1 when any document fails.
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Parser;
use pdfsum::{
    config::Config,
    logging,
    processing::{DocumentReport, NoticeLevel, ProcessingService, UploadedDocument},
};
use walkdir::WalkDir;

#[derive(Parser)]
#[command(
    name = "pdfsum-cli",
    about = "Extract and summarize the text of PDF files"
)]
struct Cli {
    /// PDF files or directories containing PDF files.
    #[arg(required = true)]
    paths: Vec<PathBuf>,
    /// Print one JSON report per line instead of text.
    #[arg(long)]
    json: bool,
    /// Override `SUMMARY_CHUNK_SIZE`.
    #[arg(long)]
    chunk_size: Option<usize>,
    /// Override `OCR_LANGUAGE`.
    #[arg(long)]
    ocr_language: Option<String>,
}

#[tokio::main]
async fn main() {
    match run().await {
        Ok(0) => {}
        Ok(_) => std::process::exit(1),
        Err(err) => {
            eprintln!("error: {err:#}");
            std::process::exit(2);
        }
    }
}

/// Returns the number of documents that did not reach the display state.
async fn run() -> Result<usize> {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();
    logging::init_tracing();

    let mut config = Config::from_env().context("failed to load configuration")?;
    if let Some(chunk_size) = cli.chunk_size {
        config.summary_chunk_size = chunk_size;
    }
    if let Some(language) = cli.ocr_language {
        config.ocr_language = language;
    }
    config.validate().context("invalid command-line overrides")?;

    let files = collect_pdfs(&cli.paths)?;
    if files.is_empty() {
        bail!("no PDF files found in the given paths");
    }

    let service = ProcessingService::from_config(&config)
        .context("failed to initialize the summarization model client")?;

    let mut failures = 0;
    for path in files {
        let bytes = tokio::fs::read(&path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        let file_name = path.file_name().map(|name| name.to_string_lossy().into_owned());
        let report = service
            .summarize_document(UploadedDocument::new(file_name, bytes))
            .await;
        if !report.succeeded() {
            failures += 1;
        }

        if cli.json {
            let line = serde_json::to_string(&report).context("failed to serialize report")?;
            println!("{line}");
        } else {
            print_report(&path, &report);
        }
    }

    Ok(failures)
}

fn collect_pdfs(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(path)
                .into_iter()
                .filter_map(|entry| entry.ok())
                .filter(|entry| entry.file_type().is_file() && is_pdf(entry.path()))
                .map(|entry| entry.into_path())
                .collect();
            found.sort();
            files.extend(found);
        } else if path.is_file() {
            files.push(path.clone());
        } else {
            bail!("{} does not exist", path.display());
        }
    }
    Ok(files)
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

fn print_report(path: &Path, report: &DocumentReport) {
    println!("== {}", path.display());
    for notice in &report.notices {
        let label = match notice.level {
            NoticeLevel::Warning => "warning",
            NoticeLevel::Error => "error",
        };
        println!("[{label}] {}", notice.message);
    }
    if !report.extracted_text_preview.is_empty() {
        println!("\nExtracted Text\n{}", report.extracted_text_preview);
    }
    if let Some(summary) = &report.summary {
        println!("\nSummary\n{summary}");
    }
    println!();
}
