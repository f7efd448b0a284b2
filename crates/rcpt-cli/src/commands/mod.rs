//! Subcommands and the helpers they share.

pub mod batch;
pub mod config;
pub mod process;

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use rcpt_core::models::config::{EngineKind, RcptConfig};
use rcpt_core::models::ExtractedTransaction;
use rcpt_core::{
    Categorizer, ExtractionReport, KeywordCategorizer, RcptError, ReceiptPipeline,
    TextRecognizer, TransactionAssembler,
};

/// Image extensions handed to the OCR pipeline.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "tiff", "tif", "bmp"];

/// Extension of recognized-text dumps, extracted without OCR.
pub const TEXT_EXTENSION: &str = "txt";

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum EngineArg {
    Tesseract,
    Onnx,
}

impl From<EngineArg> for EngineKind {
    fn from(arg: EngineArg) -> Self {
        match arg {
            EngineArg::Tesseract => EngineKind::Tesseract,
            EngineArg::Onnx => EngineKind::Onnx,
        }
    }
}

/// Command-line overrides applied on top of the configuration file.
#[derive(Debug, Default)]
pub struct OcrOverrides {
    pub engine: Option<EngineArg>,
    pub model_dir: Option<PathBuf>,
    pub no_fallback: bool,
}

impl OcrOverrides {
    pub fn apply(&self, config: &mut RcptConfig) {
        if let Some(engine) = self.engine {
            config.ocr.engine = engine.into();
        }
        if let Some(dir) = &self.model_dir {
            config.ocr.model_dir = Some(dir.clone());
        }
        if self.no_fallback {
            config.ocr.enable_fallback = false;
        }
    }
}

pub fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

pub fn is_supported(path: &Path) -> bool {
    let ext = extension_of(path);
    ext == TEXT_EXTENSION || IMAGE_EXTENSIONS.contains(&ext.as_str())
}

/// Routes text dumps to the assembler and images to the OCR pipeline.
///
/// The OCR engine is only loaded when an image is going to be processed.
pub struct FileExtractor {
    assembler: TransactionAssembler,
    pipeline: Option<ReceiptPipeline<Box<dyn TextRecognizer + Send + Sync>>>,
}

impl FileExtractor {
    pub fn new(config: &RcptConfig, load_ocr: bool) -> anyhow::Result<Self> {
        let pipeline = if load_ocr {
            Some(ReceiptPipeline::from_config(config).map_err(|e| {
                anyhow::anyhow!("Failed to start {} engine: {}", config.ocr.engine.as_str(), e)
            })?)
        } else {
            None
        };

        Ok(Self {
            assembler: TransactionAssembler::new(&config.extraction),
            pipeline,
        })
    }

    pub fn extract(&self, path: &Path) -> Result<ExtractionReport, RcptError> {
        if extension_of(path) == TEXT_EXTENSION {
            let text = fs::read_to_string(path)?;
            debug!("Read {} bytes of text from {}", text.len(), path.display());
            return self.assembler.extract_from_text(&text);
        }

        let pipeline = self.pipeline.as_ref().ok_or_else(|| {
            RcptError::Config("no OCR engine loaded for image input".to_string())
        })?;
        let bytes = fs::read(path)?;
        pipeline.try_extract(&bytes)
    }
}

/// One transaction as printed by the CLI.
#[derive(Debug, Serialize)]
pub struct TransactionRecord {
    #[serde(flatten)]
    pub transaction: ExtractedTransaction,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<ReportSummary>,
}

/// How a transaction was obtained, printed with `--report`.
#[derive(Debug, Serialize)]
pub struct ReportSummary {
    pub pass: String,
    pub amount_strategy: String,
    pub warnings: Vec<String>,
    pub processing_time_ms: u64,
}

impl TransactionRecord {
    pub fn from_report(report: ExtractionReport, with_report: bool) -> Self {
        let category = KeywordCategorizer::default()
            .categorize(&report.transaction.description, report.transaction.kind);

        let summary = with_report.then(|| ReportSummary {
            pass: format!("{:?}", report.pass).to_lowercase(),
            amount_strategy: report.amount_strategy.as_str().to_string(),
            warnings: report.warnings.clone(),
            processing_time_ms: report.processing_time_ms,
        });

        Self {
            transaction: report.transaction,
            category,
            report: summary,
        }
    }
}

pub fn format_record(record: &TransactionRecord, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(record)?),
        OutputFormat::Csv => format_csv(record),
        OutputFormat::Text => Ok(format_text(record)),
    }
}

fn format_csv(record: &TransactionRecord) -> anyhow::Result<String> {
    let tx = &record.transaction;
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record(["date", "description", "amount", "type", "category"])?;
    wtr.write_record([
        tx.date.to_string().as_str(),
        &tx.description,
        &tx.amount.to_string(),
        tx.kind.as_str(),
        &record.category,
    ])?;

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(record: &TransactionRecord) -> String {
    let tx = &record.transaction;
    let mut output = String::new();

    output.push_str(&format!("Date:        {}\n", tx.date));
    output.push_str(&format!("Description: {}\n", tx.description));
    output.push_str(&format!("Amount:      {}\n", tx.amount));
    output.push_str(&format!("Type:        {}\n", tx.kind));
    output.push_str(&format!("Category:    {}\n", record.category));

    if let Some(report) = &record.report {
        output.push_str(&format!(
            "\nText from {} pass, amount by {} ({}ms)\n",
            report.pass, report.amount_strategy, report.processing_time_ms
        ));
        for warning in &report.warnings {
            output.push_str(&format!("  - {}\n", warning));
        }
    }

    output
}
