//! Multi-mode recognition over preprocessed and raw bitmaps.

use image::DynamicImage;
use tracing::{debug, warn};

use crate::models::config::{OcrConfig, PreprocessConfig};

use super::{
    non_whitespace_len, ImagePreprocessor, RecognizedText, SegmentationMode, TextRecognizer,
};

/// Drives recognition passes and picks the most usable text.
#[derive(Debug, Clone)]
pub struct TextExtractor {
    preprocessor: ImagePreprocessor,
    first_pass_modes: Vec<SegmentationMode>,
    fallback_mode: SegmentationMode,
}

impl TextExtractor {
    pub fn new(ocr: &OcrConfig, preprocessing: &PreprocessConfig) -> Self {
        let first_pass_modes = if ocr.first_pass_modes.is_empty() {
            vec![SegmentationMode::Default]
        } else {
            ocr.first_pass_modes.clone()
        };

        Self {
            preprocessor: ImagePreprocessor::from_config(preprocessing),
            first_pass_modes,
            fallback_mode: ocr.fallback_mode,
        }
    }

    /// First pass: preprocess once, recognize under every configured mode
    /// and keep the result with the most non-whitespace characters.
    pub fn first_pass<R: TextRecognizer + ?Sized>(
        &self,
        recognizer: &R,
        image: &DynamicImage,
    ) -> RecognizedText {
        let prepared = self.preprocessor.prepare(image);

        let attempts = self.first_pass_modes.iter().map(|&mode| {
            let text = recognize_or_empty(recognizer, &prepared, mode);
            debug!(
                "{} {:?}: {} non-whitespace chars",
                recognizer.name(),
                mode,
                non_whitespace_len(&text)
            );
            text
        });

        RecognizedText::new(select_richest(attempts))
    }

    /// Fallback pass: the unprocessed bitmap under a single mode.
    pub fn fallback_pass<R: TextRecognizer + ?Sized>(
        &self,
        recognizer: &R,
        image: &DynamicImage,
    ) -> RecognizedText {
        let text = recognize_or_empty(recognizer, image, self.fallback_mode);
        RecognizedText::new(text.trim())
    }
}

/// Pick the candidate with the greatest non-whitespace length; the earliest
/// wins a tie. The winner is returned trimmed.
pub fn select_richest<I>(candidates: I) -> String
where
    I: IntoIterator<Item = String>,
{
    let mut best = String::new();
    let mut best_len = 0;

    for candidate in candidates {
        let len = non_whitespace_len(&candidate);
        if len > best_len {
            best_len = len;
            best = candidate;
        }
    }

    best.trim().to_string()
}

fn recognize_or_empty<R: TextRecognizer + ?Sized>(
    recognizer: &R,
    image: &DynamicImage,
    mode: SegmentationMode,
) -> String {
    match recognizer.recognize(image, mode) {
        Ok(text) => text,
        Err(e) => {
            warn!("{} recognition under {:?} failed: {}", recognizer.name(), mode, e);
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OcrError;
    use image::GrayImage;
    use std::sync::Mutex;

    /// Returns canned text per mode and records the calls it received.
    struct ModeRecognizer {
        calls: Mutex<Vec<(SegmentationMode, (u32, u32))>>,
    }

    impl TextRecognizer for ModeRecognizer {
        fn name(&self) -> &str {
            "mode"
        }

        fn recognize(
            &self,
            image: &DynamicImage,
            mode: SegmentationMode,
        ) -> Result<String, OcrError> {
            self.calls
                .lock()
                .unwrap()
                .push((mode, (image.width(), image.height())));
            match mode {
                SegmentationMode::UniformBlock => Ok("TOTAL 10".to_string()),
                SegmentationMode::Auto => Ok("  ABC CAFE\nTOTAL 495.00  ".to_string()),
                SegmentationMode::SingleColumn => Err(OcrError::Recognition("boom".to_string())),
                SegmentationMode::Default => Ok(" raw text \n".to_string()),
            }
        }
    }

    fn extractor() -> TextExtractor {
        let preprocessing = PreprocessConfig {
            min_dimension: 50,
            ..PreprocessConfig::default()
        };
        TextExtractor::new(&OcrConfig::default(), &preprocessing)
    }

    #[test]
    fn test_select_richest_prefers_more_text() {
        let picked = select_richest(vec![
            "a b c".to_string(),
            "  abcdef ".to_string(),
            "abc   def".to_string(),
        ]);
        assert_eq!(picked, "abcdef");
    }

    #[test]
    fn test_select_richest_empty() {
        assert_eq!(select_richest(Vec::<String>::new()), "");
        assert_eq!(select_richest(vec!["   ".to_string()]), "");
    }

    #[test]
    fn test_first_pass_tries_every_mode_on_preprocessed_image() {
        let recognizer = ModeRecognizer { calls: Mutex::new(Vec::new()) };
        let image = DynamicImage::ImageLuma8(GrayImage::new(20, 10));

        let text = extractor().first_pass(&recognizer, &image);

        assert_eq!(text.as_str(), "ABC CAFE\nTOTAL 495.00");
        let calls = recognizer.calls.lock().unwrap();
        let modes: Vec<_> = calls.iter().map(|(m, _)| *m).collect();
        assert_eq!(
            modes,
            vec![
                SegmentationMode::UniformBlock,
                SegmentationMode::Auto,
                SegmentationMode::SingleColumn,
            ]
        );
        assert!(calls.iter().all(|(_, size)| *size == (100, 50)));
    }

    #[test]
    fn test_fallback_pass_uses_raw_image() {
        let recognizer = ModeRecognizer { calls: Mutex::new(Vec::new()) };
        let image = DynamicImage::ImageLuma8(GrayImage::new(20, 10));

        let text = extractor().fallback_pass(&recognizer, &image);

        assert_eq!(text.as_str(), "raw text");
        let calls = recognizer.calls.lock().unwrap();
        assert_eq!(calls.as_slice(), &[(SegmentationMode::Default, (20, 10))]);
    }
}
