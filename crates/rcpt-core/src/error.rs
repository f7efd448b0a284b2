//! Error types for the rcpt-core library.

use thiserror::Error;

/// Main error type for the rcpt library.
#[derive(Error, Debug)]
pub enum RcptError {
    /// The input bytes could not be decoded into a bitmap.
    #[error("decode error: {0}")]
    Decode(#[from] image::ImageError),

    /// OCR processing error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// Transaction extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to OCR processing.
#[derive(Error, Debug)]
pub enum OcrError {
    /// The recognition engine could not be initialised.
    #[error("failed to initialise engine: {0}")]
    EngineInit(String),

    /// Failed to load OCR models.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// Text recognition failed.
    #[error("text recognition failed: {0}")]
    Recognition(String),

    /// Image preprocessing failed.
    #[error("preprocessing failed: {0}")]
    Preprocessing(String),

    /// The configured engine was not compiled into this build.
    #[error("OCR engine '{0}' is not available in this build")]
    Unavailable(String),
}

/// Errors related to transaction extraction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    /// Recognized text was too sparse after both recognition passes.
    #[error("extraction failed: only {chars} non-whitespace characters recognized")]
    TextTooSparse { chars: usize },

    /// No amount candidate survived. Never surfaced on its own by the
    /// pipeline; it is reported as "no transaction found".
    #[error("no transaction amount found")]
    AmountNotFound,
}

/// Result type for the rcpt library.
pub type Result<T> = std::result::Result<T, RcptError>;
