//! Batch processing command for many receipt files.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Semaphore;
use tracing::{debug, error, warn};

use rcpt_core::{ExtractionReport, RcptError};

use super::{
    extension_of, format_record, is_supported, EngineArg, FileExtractor, OcrOverrides,
    OutputFormat, TransactionRecord, TEXT_EXTENSION,
};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Glob pattern for input files
    #[arg(required = true)]
    input: String,

    /// Output directory for per-file results
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Number of parallel workers
    #[arg(short = 'j', long, default_value = "4")]
    jobs: usize,

    /// Continue when a file fails with an error
    #[arg(long)]
    continue_on_error: bool,

    /// OCR engine (overrides config)
    #[arg(long, value_enum)]
    engine: Option<EngineArg>,

    /// Model or tessdata directory (overrides config)
    #[arg(short, long)]
    model_dir: Option<PathBuf>,
}

/// What happened to one file.
enum Status {
    Extracted(Box<TransactionRecord>),
    NotFound(String),
    Failed(String),
}

struct FileOutcome {
    path: PathBuf,
    status: Status,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = super::config::load(config_path)?;
    OcrOverrides {
        engine: args.engine,
        model_dir: args.model_dir.clone(),
        no_fallback: false,
    }
    .apply(&mut config);

    let mut files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| is_supported(p))
        .collect();
    files.sort();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    eprintln!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let needs_ocr = files.iter().any(|p| extension_of(p) != TEXT_EXTENSION);
    let extractor = Arc::new(FileExtractor::new(&config, needs_ocr)?);

    let overall_pb = ProgressBar::new(files.len() as u64);
    overall_pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files",
            )?
            .progress_chars("=>-"),
    );

    // Each extraction blocks a thread for its whole duration.
    let workers = Arc::new(Semaphore::new(args.jobs.max(1)));
    let mut handles = Vec::with_capacity(files.len());

    for path in files {
        let permit = Arc::clone(&workers).acquire_owned().await?;
        let extractor = Arc::clone(&extractor);
        let pb = overall_pb.clone();

        handles.push(tokio::task::spawn_blocking(move || {
            let file_start = Instant::now();
            let result = extractor.extract(&path);
            drop(permit);
            pb.inc(1);
            (path, result, file_start.elapsed().as_millis() as u64)
        }));
    }

    let mut outcomes = Vec::with_capacity(handles.len());
    for handle in handles {
        let (path, result, processing_time_ms) = handle.await?;
        let status = classify(&path, result);

        if let Status::Failed(msg) = &status {
            if !args.continue_on_error {
                overall_pb.abandon();
                error!("Failed to process {}: {}", path.display(), msg);
                anyhow::bail!("Processing failed for {}: {}", path.display(), msg);
            }
        }

        outcomes.push(FileOutcome {
            path,
            status,
            processing_time_ms,
        });
    }

    overall_pb.finish_and_clear();

    if let Some(output_dir) = &args.output_dir {
        write_outputs(output_dir, &outcomes, args.format)?;
    }

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &outcomes)?;
        eprintln!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let extracted = outcomes
        .iter()
        .filter(|o| matches!(o.status, Status::Extracted(_)))
        .count();
    let not_found = outcomes
        .iter()
        .filter(|o| matches!(o.status, Status::NotFound(_)))
        .count();
    let failed = outcomes.len() - extracted - not_found;

    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        outcomes.len(),
        start.elapsed()
    );
    println!(
        "   {} extracted, {} without a transaction, {} failed",
        style(extracted).green(),
        style(not_found).yellow(),
        style(failed).red()
    );

    for outcome in &outcomes {
        match &outcome.status {
            Status::NotFound(msg) | Status::Failed(msg) => {
                println!("  - {}: {}", outcome.path.display(), msg);
            }
            Status::Extracted(_) => {}
        }
    }

    Ok(())
}

fn classify(path: &Path, result: Result<ExtractionReport, RcptError>) -> Status {
    match result {
        Ok(report) => Status::Extracted(Box::new(TransactionRecord::from_report(report, false))),
        Err(RcptError::Extraction(e)) => {
            debug!("No transaction in {}: {}", path.display(), e);
            Status::NotFound(format!("could not extract: {}", e))
        }
        Err(e) => {
            warn!("Failed to process {}: {}", path.display(), e);
            Status::Failed(e.to_string())
        }
    }
}

fn write_outputs(
    output_dir: &Path,
    outcomes: &[FileOutcome],
    format: OutputFormat,
) -> anyhow::Result<()> {
    for outcome in outcomes {
        let Status::Extracted(record) = &outcome.status else {
            continue;
        };

        let stem = outcome
            .path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("receipt");
        let output_path = output_dir.join(format!("{}.{}", stem, format.extension()));

        fs::write(&output_path, format_record(record, format)?)?;
        debug!("Wrote output to {}", output_path.display());
    }
    Ok(())
}

fn write_summary(path: &Path, outcomes: &[FileOutcome]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "date",
        "description",
        "amount",
        "type",
        "category",
        "processing_time_ms",
        "error",
    ])?;

    for outcome in outcomes {
        let filename = outcome
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");
        let time = outcome.processing_time_ms.to_string();

        match &outcome.status {
            Status::Extracted(record) => {
                let tx = &record.transaction;
                wtr.write_record([
                    filename,
                    "success",
                    &tx.date.to_string(),
                    &tx.description,
                    &tx.amount.to_string(),
                    tx.kind.as_str(),
                    &record.category,
                    &time,
                    "",
                ])?;
            }
            Status::NotFound(msg) => {
                wtr.write_record([filename, "not_found", "", "", "", "", "", &time, msg])?;
            }
            Status::Failed(msg) => {
                wtr.write_record([filename, "error", "", "", "", "", "", &time, msg])?;
            }
        }
    }

    wtr.flush()?;
    Ok(())
}
