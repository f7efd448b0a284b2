//! Recognition boundary and multi-pass text extraction.
//!
//! The OCR engine itself is a black box behind [`TextRecognizer`]. Everything
//! on this side of the trait (bitmap preprocessing, choosing the richest
//! result across segmentation modes, the raw-image fallback) is engine
//! independent.

mod factory;
mod preprocessing;
mod text_extraction;

#[cfg(feature = "native")]
mod pure_engine;
#[cfg(feature = "tesseract")]
mod tesseract;

pub use factory::create_recognizer;
pub use preprocessing::ImagePreprocessor;
pub use text_extraction::{select_richest, TextExtractor};

#[cfg(feature = "native")]
pub use pure_engine::OnnxRecognizer;
#[cfg(feature = "tesseract")]
pub use tesseract::TesseractRecognizer;

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::error::OcrError;

/// Page segmentation configuration handed to the recognizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentationMode {
    /// Engine default, no segmentation override.
    Default,
    /// Fully automatic page segmentation.
    Auto,
    /// A single column of text of variable sizes.
    SingleColumn,
    /// A single uniform block of text.
    UniformBlock,
}

impl SegmentationMode {
    /// Tesseract `--psm` value for this mode, `None` for the engine default.
    pub fn psm(&self) -> Option<u8> {
        match self {
            SegmentationMode::Default => None,
            SegmentationMode::Auto => Some(3),
            SegmentationMode::SingleColumn => Some(4),
            SegmentationMode::UniformBlock => Some(6),
        }
    }
}

/// A text recognition engine.
///
/// Implementations take a decoded bitmap and return the recognized text,
/// lines separated by `\n`. An unreadable image should produce an empty
/// string; `Err` is reserved for engine failures, which callers treat the
/// same as empty output.
pub trait TextRecognizer {
    /// Short engine name used in logs.
    fn name(&self) -> &str;

    /// Recognize text in `image` under the given segmentation mode.
    fn recognize(&self, image: &DynamicImage, mode: SegmentationMode) -> Result<String, OcrError>;
}

impl<T: TextRecognizer + ?Sized> TextRecognizer for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn recognize(&self, image: &DynamicImage, mode: SegmentationMode) -> Result<String, OcrError> {
        (**self).recognize(image, mode)
    }
}

/// Text produced by one recognition attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecognizedText {
    text: String,
}

impl RecognizedText {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Lines in recognition order.
    pub fn lines(&self) -> std::str::Lines<'_> {
        self.text.lines()
    }

    /// Number of non-whitespace characters, the measure of retained information.
    pub fn non_whitespace_len(&self) -> usize {
        non_whitespace_len(&self.text)
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

pub(crate) fn non_whitespace_len(text: &str) -> usize {
    text.chars().filter(|c| !c.is_whitespace()).count()
}
