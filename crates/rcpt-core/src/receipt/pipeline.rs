//! Image bytes to one transaction record.

use std::time::Instant;

use chrono::NaiveDate;
use image::DynamicImage;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{ExtractionError, RcptError, Result};
use crate::models::config::{ExtractionConfig, RcptConfig};
use crate::models::transaction::{truncate_chars, ExtractedTransaction};
use crate::ocr::{create_recognizer, non_whitespace_len, TextExtractor, TextRecognizer};

use super::rules::{
    find_date, AmountResolver, AmountStrategy, DateResolver, DescriptionResolver, FieldResolver,
    KindClassifier, ResolvedAmount, DEFAULT_DESCRIPTION,
};
use super::KeywordTables;

/// Where the text of record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecognitionPass {
    /// Preprocessed bitmap, richest of the configured modes.
    First,
    /// Unprocessed bitmap, default mode.
    Fallback,
    /// Text handed in by the caller; no recognition ran.
    Supplied,
}

/// Text chosen after at most two recognition passes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanOutcome {
    pub text: String,
    pub pass: RecognitionPass,
    pub amount: Option<ResolvedAmount>,
}

/// Retry policy: recognize the preprocessed image, and only when no amount
/// resolves from it, recognize the raw image once. The raw text replaces the
/// first only if an amount resolves from it.
#[derive(Debug, Clone, Copy)]
pub struct RecognitionPlan {
    enable_fallback: bool,
}

impl RecognitionPlan {
    pub fn new(enable_fallback: bool) -> Self {
        Self { enable_fallback }
    }

    pub fn run<F, G, A>(&self, first_pass: F, fallback_pass: G, resolve: A) -> PlanOutcome
    where
        F: FnOnce() -> String,
        G: FnOnce() -> String,
        A: Fn(&str) -> Option<ResolvedAmount>,
    {
        let text = first_pass();
        let amount = resolve(&text);

        if amount.is_some() || !self.enable_fallback {
            return PlanOutcome {
                text,
                pass: RecognitionPass::First,
                amount,
            };
        }

        info!("No amount in first pass, retrying on the raw image");
        let raw_text = fallback_pass();
        match resolve(&raw_text) {
            Some(amount) => PlanOutcome {
                text: raw_text,
                pass: RecognitionPass::Fallback,
                amount: Some(amount),
            },
            None => PlanOutcome {
                text,
                pass: RecognitionPass::First,
                amount: None,
            },
        }
    }
}

/// A transaction plus how it was obtained.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionReport {
    pub transaction: ExtractedTransaction,
    /// Pass that produced the text of record.
    pub pass: RecognitionPass,
    /// Rule that produced the amount.
    pub amount_strategy: AmountStrategy,
    /// Full text of record.
    pub text: String,
    /// Fields that fell back to defaults.
    pub warnings: Vec<String>,
    pub processing_time_ms: u64,
}

/// Resolves fields from a text of record and assembles the transaction.
///
/// Usable on its own for text recognized elsewhere.
#[derive(Debug, Clone)]
pub struct TransactionAssembler {
    extraction: ExtractionConfig,
    keywords: KeywordTables,
    today: Option<NaiveDate>,
}

impl TransactionAssembler {
    pub fn new(config: &ExtractionConfig) -> Self {
        Self {
            extraction: config.clone(),
            keywords: config.keywords.clone().normalized(),
            today: None,
        }
    }

    /// Fix the date used when a document has none.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn keywords(&self) -> &KeywordTables {
        &self.keywords
    }

    /// Amount from text, treating a zero total as no amount.
    pub fn resolve_amount(&self, text: &str) -> Option<ResolvedAmount> {
        AmountResolver::new(&self.keywords)
            .resolve(text)
            .filter(|a| a.value > Decimal::ZERO)
    }

    /// Extract from text that was recognized elsewhere.
    pub fn extract_from_text(&self, text: &str) -> Result<ExtractionReport> {
        let start = Instant::now();
        let outcome = PlanOutcome {
            text: text.trim().to_string(),
            pass: RecognitionPass::Supplied,
            amount: self.resolve_amount(text),
        };
        self.assemble(outcome, start)
    }

    fn assemble(&self, outcome: PlanOutcome, start: Instant) -> Result<ExtractionReport> {
        let PlanOutcome { text, pass, amount } = outcome;

        let chars = non_whitespace_len(&text);
        if chars < self.extraction.min_text_chars {
            info!("Text of record too sparse ({} chars)", chars);
            return Err(ExtractionError::TextTooSparse { chars }.into());
        }

        let Some(amount) = amount else {
            info!("No amount found in {} chars of text", chars);
            return Err(ExtractionError::AmountNotFound.into());
        };

        let mut warnings = Vec::new();

        let dates = self.today.map_or_else(DateResolver::local, DateResolver::new);
        if find_date(&text).is_none() {
            warnings.push("No date found, using the processing date".to_string());
        }
        let date = dates.resolve(&text);

        let description = DescriptionResolver::new(&self.keywords)
            .with_max_chars(self.extraction.max_description_chars)
            .resolve(&text);
        if description == DEFAULT_DESCRIPTION {
            warnings.push("No description found".to_string());
        }

        let kind = KindClassifier::new(&self.keywords).resolve(&text);

        let transaction = ExtractedTransaction {
            date,
            description,
            amount: amount.value,
            kind,
            raw_text_sample: truncate_chars(&text, self.extraction.raw_sample_chars),
        };

        debug!(
            "Assembled {} {} on {} via {:?}/{}",
            transaction.kind,
            transaction.amount,
            transaction.date,
            pass,
            amount.strategy.as_str()
        );

        Ok(ExtractionReport {
            transaction,
            pass,
            amount_strategy: amount.strategy,
            text,
            warnings,
            processing_time_ms: start.elapsed().as_millis() as u64,
        })
    }
}

/// Extraction pipeline: decode, recognize, resolve fields, assemble.
///
/// Holds no per-call state; one pipeline can serve many threads when the
/// recognizer is `Sync`.
pub struct ReceiptPipeline<R> {
    recognizer: R,
    extractor: TextExtractor,
    plan: RecognitionPlan,
    assembler: TransactionAssembler,
}

impl ReceiptPipeline<Box<dyn TextRecognizer + Send + Sync>> {
    /// Build a pipeline around the engine named in the configuration.
    pub fn from_config(config: &RcptConfig) -> Result<Self> {
        let recognizer = create_recognizer(&config.ocr)?;
        Ok(Self::new(recognizer, config))
    }
}

impl<R: TextRecognizer> ReceiptPipeline<R> {
    pub fn new(recognizer: R, config: &RcptConfig) -> Self {
        Self {
            recognizer,
            extractor: TextExtractor::new(&config.ocr, &config.preprocessing),
            plan: RecognitionPlan::new(config.ocr.enable_fallback),
            assembler: TransactionAssembler::new(&config.extraction),
        }
    }

    /// Fix the date used when a document has none.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.assembler = self.assembler.with_today(today);
        self
    }

    pub fn recognizer(&self) -> &R {
        &self.recognizer
    }

    /// Extract a transaction from encoded image bytes.
    ///
    /// `Ok(None)` means the document was read but no transaction could be
    /// found. Undecodable bytes are an error.
    pub fn extract(&self, bytes: &[u8]) -> Result<Option<ExtractedTransaction>> {
        fold_not_found(self.try_extract(bytes))
    }

    /// Extract a transaction from an already decoded image.
    pub fn extract_image(&self, image: &DynamicImage) -> Result<Option<ExtractedTransaction>> {
        fold_not_found(self.try_extract_image(image))
    }

    /// Like [`extract`](Self::extract), reporting why nothing was found.
    pub fn try_extract(&self, bytes: &[u8]) -> Result<ExtractionReport> {
        let image = image::load_from_memory(bytes)?;
        self.try_extract_image(&image)
    }

    pub fn try_extract_image(&self, image: &DynamicImage) -> Result<ExtractionReport> {
        let start = Instant::now();
        info!(
            "Extracting from {}x{} image with {}",
            image.width(),
            image.height(),
            self.recognizer.name()
        );

        let outcome = self.plan.run(
            || {
                self.extractor
                    .first_pass(&self.recognizer, image)
                    .into_string()
            },
            || {
                self.extractor
                    .fallback_pass(&self.recognizer, image)
                    .into_string()
            },
            |text| self.assembler.resolve_amount(text),
        );

        self.assembler.assemble(outcome, start)
    }

    /// Extract from text that was recognized elsewhere.
    pub fn extract_from_text(&self, text: &str) -> Result<ExtractionReport> {
        self.assembler.extract_from_text(text)
    }
}

/// Fold "nothing found" into `Ok(None)`; other errors pass through.
fn fold_not_found(result: Result<ExtractionReport>) -> Result<Option<ExtractedTransaction>> {
    match result {
        Ok(report) => Ok(Some(report.transaction)),
        Err(RcptError::Extraction(e)) => {
            debug!("No transaction: {}", e);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use std::sync::Mutex;

    use image::{ImageFormat, RgbImage};
    use pretty_assertions::assert_eq;

    use crate::error::OcrError;
    use crate::models::TransactionType;
    use crate::ocr::SegmentationMode;

    const RECEIPT: &str =
        "ABC CAFE\nDate: 12/03/2024\nSubtotal: 450.00\nCGST: 20.00\nTotal: 495.00";

    /// Returns `first` for every preprocessed mode and `raw` for the
    /// default-mode fallback, recording each call.
    struct ScriptedRecognizer {
        first: String,
        raw: String,
        calls: Mutex<Vec<SegmentationMode>>,
    }

    impl ScriptedRecognizer {
        fn new(first: &str, raw: &str) -> Self {
            Self {
                first: first.to_string(),
                raw: raw.to_string(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<SegmentationMode> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl TextRecognizer for ScriptedRecognizer {
        fn name(&self) -> &str {
            "scripted"
        }

        fn recognize(
            &self,
            _image: &DynamicImage,
            mode: SegmentationMode,
        ) -> std::result::Result<String, OcrError> {
            self.calls.lock().unwrap().push(mode);
            Ok(match mode {
                SegmentationMode::Default => self.raw.clone(),
                _ => self.first.clone(),
            })
        }
    }

    fn config() -> RcptConfig {
        let mut config = RcptConfig::default();
        config.preprocessing.min_dimension = 16;
        config
    }

    fn pipeline(first: &str, raw: &str) -> ReceiptPipeline<ScriptedRecognizer> {
        ReceiptPipeline::new(ScriptedRecognizer::new(first, raw), &config())
            .with_today(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap())
    }

    fn png_bytes() -> Vec<u8> {
        let white = image::Rgb([255, 255, 255]);
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, white));
        let mut bytes = Vec::new();
        image
            .write_to(&mut std::io::Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn outcome(text: &str, pass: RecognitionPass, amount: Option<ResolvedAmount>) -> PlanOutcome {
        PlanOutcome {
            text: text.to_string(),
            pass,
            amount,
        }
    }

    fn found(value: &str) -> ResolvedAmount {
        ResolvedAmount {
            value: Decimal::from_str(value).unwrap(),
            strategy: AmountStrategy::TotalLine,
            source_line: String::new(),
        }
    }

    #[test]
    fn test_plan_skips_fallback_when_first_pass_has_amount() {
        let plan = RecognitionPlan::new(true);
        let result = plan.run(
            || "first".to_string(),
            || panic!("fallback must not run"),
            |_| Some(found("10")),
        );
        assert_eq!(result, outcome("first", RecognitionPass::First, Some(found("10"))));
    }

    #[test]
    fn test_plan_fallback_replaces_text_only_with_amount() {
        let plan = RecognitionPlan::new(true);

        let replaced = plan.run(
            || "first".to_string(),
            || "raw".to_string(),
            |t| (t == "raw").then(|| found("7")),
        );
        assert_eq!(replaced, outcome("raw", RecognitionPass::Fallback, Some(found("7"))));

        let kept = plan.run(|| "first".to_string(), || "raw".to_string(), |_| None);
        assert_eq!(kept, outcome("first", RecognitionPass::First, None));
    }

    #[test]
    fn test_plan_without_fallback_runs_one_pass() {
        let plan = RecognitionPlan::new(false);
        let result = plan.run(
            || "first".to_string(),
            || panic!("fallback disabled"),
            |_| None,
        );
        assert_eq!(result.amount, None);
    }

    #[test]
    fn test_end_to_end_receipt() {
        let pipeline = pipeline(RECEIPT, "");
        let report = pipeline.try_extract(&png_bytes()).unwrap();
        let tx = report.transaction;

        assert_eq!(tx.date, NaiveDate::from_ymd_opt(2024, 3, 12).unwrap());
        assert_eq!(tx.description, "ABC CAFE");
        assert_eq!(tx.amount, Decimal::from_str("495.00").unwrap());
        assert_eq!(tx.kind, TransactionType::Expense);
        assert_eq!(report.pass, RecognitionPass::First);
        assert_eq!(report.amount_strategy, AmountStrategy::TotalLine);
        assert!(tx.validate().is_empty());

        // Three first-pass modes, no fallback.
        assert_eq!(
            pipeline.recognizer().calls(),
            vec![
                SegmentationMode::UniformBlock,
                SegmentationMode::Auto,
                SegmentationMode::SingleColumn
            ]
        );
    }

    #[test]
    fn test_fallback_text_becomes_text_of_record() {
        let pipeline = pipeline("ABC CAFE\nfaded", RECEIPT);
        let report = pipeline.try_extract(&png_bytes()).unwrap();

        assert_eq!(report.pass, RecognitionPass::Fallback);
        assert_eq!(report.text, RECEIPT);
        assert_eq!(report.transaction.amount, Decimal::from_str("495.00").unwrap());
        assert_eq!(pipeline.recognizer().calls().len(), 4);
    }

    #[test]
    fn test_sparse_text_is_no_transaction() {
        let pipeline = pipeline("a 1", "");
        assert!(matches!(
            pipeline.try_extract(&png_bytes()),
            Err(RcptError::Extraction(ExtractionError::TextTooSparse { chars: 2 }))
        ));
        assert_eq!(pipeline.extract(&png_bytes()).unwrap(), None);
    }

    #[test]
    fn test_no_amount_is_no_transaction() {
        let pipeline = pipeline("Thank you for visiting", "Please come again");
        assert!(matches!(
            pipeline.try_extract(&png_bytes()),
            Err(RcptError::Extraction(ExtractionError::AmountNotFound))
        ));
        assert_eq!(pipeline.extract(&png_bytes()).unwrap(), None);
    }

    #[test]
    fn test_zero_total_is_no_amount() {
        let pipeline = pipeline("", "");
        assert!(matches!(
            pipeline.extract_from_text("Store credit note\nTotal: 0.00"),
            Err(RcptError::Extraction(ExtractionError::AmountNotFound))
        ));
    }

    #[test]
    fn test_undecodable_bytes_are_an_error() {
        let pipeline = pipeline(RECEIPT, "");
        assert!(matches!(
            pipeline.extract(b"definitely not an image"),
            Err(RcptError::Decode(_))
        ));
        assert!(pipeline.recognizer().calls().is_empty());
    }

    #[test]
    fn test_extract_from_text_uses_fallback_date() {
        let pipeline = pipeline("", "");
        let report = pipeline
            .extract_from_text("Salary credited\nAmount credited: Rs 52,000.00")
            .unwrap();

        assert_eq!(report.pass, RecognitionPass::Supplied);
        assert_eq!(report.transaction.date, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        assert_eq!(report.transaction.kind, TransactionType::Income);
        assert_eq!(report.transaction.amount, Decimal::from_str("52000.00").unwrap());
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn test_raw_sample_is_truncated() {
        let pipeline = pipeline("", "");
        let text = format!("Total: 99.00\n{}", "word ".repeat(200));
        let report = pipeline.extract_from_text(&text).unwrap();
        assert_eq!(report.transaction.raw_text_sample.chars().count(), 500);
    }
}
