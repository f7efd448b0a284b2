//! Core library for receipt and statement OCR.
//!
//! This crate provides:
//! - A recognition boundary with interchangeable OCR engines
//! - Multi-pass text extraction (preprocessed passes, raw-image fallback)
//! - Transaction field extraction (amount, date, description, income/expense)
//! - The transaction record handed to categorizers and storage layers

pub mod error;
pub mod models;
pub mod ocr;
pub mod receipt;

pub use error::{ExtractionError, OcrError, RcptError, Result};
pub use models::config::RcptConfig;
pub use models::transaction::{ExtractedTransaction, TransactionType};
pub use ocr::{create_recognizer, SegmentationMode, TextExtractor, TextRecognizer};
pub use receipt::{
    Categorizer, ExtractionReport, KeywordCategorizer, KeywordTables, ReceiptPipeline,
    TransactionAssembler,
};
