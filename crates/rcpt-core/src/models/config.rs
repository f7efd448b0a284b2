//! Configuration structures for the extraction pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::ocr::SegmentationMode;
use crate::receipt::KeywordTables;

/// Main configuration for the rcpt pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RcptConfig {
    /// OCR configuration.
    pub ocr: OcrConfig,

    /// Image preprocessing applied before the first recognition pass.
    pub preprocessing: PreprocessConfig,

    /// Transaction extraction configuration.
    pub extraction: ExtractionConfig,
}

/// Recognition engine selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineKind {
    /// Tesseract through leptess (feature `tesseract`).
    Tesseract,
    /// PaddleOCR ONNX models through pure-onnx-ocr (feature `native`).
    Onnx,
}

impl EngineKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineKind::Tesseract => "tesseract",
            EngineKind::Onnx => "onnx",
        }
    }
}

/// OCR engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Which recognition engine to use.
    pub engine: EngineKind,

    /// Tesseract language code(s), e.g. "eng" or "eng+hin".
    pub language: String,

    /// Directory containing Tesseract data or ONNX model files.
    pub model_dir: Option<PathBuf>,

    /// Segmentation modes tried on the preprocessed image, in order.
    pub first_pass_modes: Vec<SegmentationMode>,

    /// Mode used for the raw-image fallback pass.
    pub fallback_mode: SegmentationMode,

    /// Run the raw-image pass when the first pass yields no amount.
    pub enable_fallback: bool,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            engine: if cfg!(feature = "tesseract") {
                EngineKind::Tesseract
            } else {
                EngineKind::Onnx
            },
            language: "eng".to_string(),
            model_dir: None,
            first_pass_modes: vec![
                SegmentationMode::UniformBlock,
                SegmentationMode::Auto,
                SegmentationMode::SingleColumn,
            ],
            fallback_mode: SegmentationMode::Default,
            enable_fallback: true,
        }
    }
}

/// Bitmap preprocessing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Contrast multiplier (1.0 leaves the image unchanged).
    pub contrast_factor: f32,

    /// Unsharp-mask blur radius; 0 disables sharpening.
    pub sharpen_sigma: f32,

    /// Unsharp-mask threshold.
    pub sharpen_threshold: i32,

    /// Median filter radius in pixels (1 = 3x3 window, 0 disables).
    pub median_radius: u32,

    /// Minimum length of the shorter image side after upscaling.
    pub min_dimension: u32,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            contrast_factor: 2.0,
            sharpen_sigma: 1.0,
            sharpen_threshold: 0,
            median_radius: 1,
            min_dimension: 1000,
        }
    }
}

/// Transaction extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Minimum non-whitespace characters the text of record must carry.
    pub min_text_chars: usize,

    /// Length of the diagnostic raw-text sample kept on each transaction.
    pub raw_sample_chars: usize,

    /// Maximum description length.
    pub max_description_chars: usize,

    /// Keyword tables used by the resolvers.
    pub keywords: KeywordTables,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_text_chars: 5,
            raw_sample_chars: 500,
            max_description_chars: 100,
            keywords: KeywordTables::default(),
        }
    }
}

impl RcptConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_falls_back_to_defaults() {
        let config: RcptConfig =
            serde_json::from_str(r#"{"ocr": {"language": "eng+hin"}}"#).unwrap();

        assert_eq!(config.ocr.language, "eng+hin");
        assert_eq!(config.ocr.first_pass_modes.len(), 3);
        assert_eq!(config.extraction.min_text_chars, 5);
        assert_eq!(config.preprocessing.min_dimension, 1000);
        assert!(!config.extraction.keywords.total.is_empty());
    }

    #[test]
    fn test_engine_kind_serializes_snake_case() {
        let json = serde_json::to_string(&EngineKind::Tesseract).unwrap();
        assert_eq!(json, "\"tesseract\"");
    }
}
