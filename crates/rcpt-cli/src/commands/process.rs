//! Process command - extract a transaction from a single file.

use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use rcpt_core::RcptError;

use super::{
    extension_of, format_record, is_supported, EngineArg, FileExtractor, OcrOverrides,
    OutputFormat, TransactionRecord, TEXT_EXTENSION,
};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input file (image, or a .txt file of recognized text)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// OCR engine (overrides config)
    #[arg(long, value_enum)]
    engine: Option<EngineArg>,

    /// Model or tessdata directory (overrides config)
    #[arg(short, long)]
    model_dir: Option<PathBuf>,

    /// Skip the raw-image retry when the first pass finds no amount
    #[arg(long)]
    no_fallback: bool,

    /// Include how the transaction was obtained
    #[arg(long)]
    report: bool,

    /// Validate the extracted record
    #[arg(long)]
    validate: bool,
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = super::config::load(config_path)?;
    OcrOverrides {
        engine: args.engine,
        model_dir: args.model_dir.clone(),
        no_fallback: args.no_fallback,
    }
    .apply(&mut config);

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }
    if !is_supported(&args.input) {
        anyhow::bail!("Unsupported file format: {}", extension_of(&args.input));
    }

    info!("Processing file: {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?,
    );
    pb.enable_steady_tick(Duration::from_millis(100));

    let needs_ocr = extension_of(&args.input) != TEXT_EXTENSION;
    if needs_ocr {
        pb.set_message(format!("Loading {} engine...", config.ocr.engine.as_str()));
    }
    let extractor = FileExtractor::new(&config, needs_ocr)?;

    pb.set_message("Extracting transaction...");
    let result = extractor.extract(&args.input);
    pb.finish_and_clear();

    let report = match result {
        Ok(report) => report,
        Err(RcptError::Extraction(e)) => {
            anyhow::bail!(
                "could not extract a transaction from {}: {}",
                args.input.display(),
                e
            );
        }
        Err(e) => return Err(e.into()),
    };

    if args.validate {
        let issues = report.transaction.validate();
        if !issues.is_empty() {
            eprintln!("{}", style("Validation issues:").yellow());
            for issue in &issues {
                eprintln!("  - {}", issue);
            }
        }
    }

    let record = TransactionRecord::from_report(report, args.report);
    let output = format_record(&record, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        eprintln!(
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
