//! Tesseract recognizer through `leptess`.

use std::io::Cursor;
use std::path::Path;

use image::{DynamicImage, ImageFormat};
use leptess::{LepTess, Variable};
use tracing::debug;

use crate::error::OcrError;

use super::{SegmentationMode, TextRecognizer};

/// Tesseract OCR. A fresh engine handle is created for every call, so one
/// recognizer can serve any number of threads.
pub struct TesseractRecognizer {
    data_path: Option<String>,
    language: String,
}

impl TesseractRecognizer {
    /// Create a recognizer, checking once that Tesseract initialises with
    /// the given data directory and language.
    pub fn new(data_path: Option<&Path>, language: &str) -> Result<Self, OcrError> {
        let data_path = data_path.map(|p| p.to_string_lossy().into_owned());

        LepTess::new(data_path.as_deref(), language)
            .map_err(|e| OcrError::EngineInit(format!("tesseract init: {:?}", e)))?;

        Ok(Self {
            data_path,
            language: language.to_string(),
        })
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn name(&self) -> &str {
        "tesseract"
    }

    fn recognize(&self, image: &DynamicImage, mode: SegmentationMode) -> Result<String, OcrError> {
        let mut tess = LepTess::new(self.data_path.as_deref(), &self.language)
            .map_err(|e| OcrError::EngineInit(format!("tesseract init: {:?}", e)))?;

        if let Some(psm) = mode.psm() {
            tess.set_variable(Variable::TesseditPagesegMode, &psm.to_string())
                .map_err(|e| OcrError::EngineInit(format!("set psm {}: {:?}", psm, e)))?;
        }

        let mut png_bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut png_bytes), ImageFormat::Png)
            .map_err(|e| OcrError::Preprocessing(format!("PNG encode: {}", e)))?;

        tess.set_image_from_mem(&png_bytes)
            .map_err(|e| OcrError::Recognition(format!("load image: {:?}", e)))?;
        tess.set_source_resolution(300);

        let text = tess
            .get_utf8_text()
            .map_err(|e| OcrError::Recognition(format!("tesseract run: {}", e)))?;

        debug!("tesseract {:?}: {} bytes of text", mode, text.len());
        Ok(text)
    }
}
