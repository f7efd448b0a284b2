//! Recognizer selection by configuration.

use tracing::info;

use crate::error::OcrError;
use crate::models::config::{EngineKind, OcrConfig};

use super::TextRecognizer;

/// Build the recognizer named by `config.engine`.
///
/// Fails with [`OcrError::Unavailable`] when that engine's cargo feature was
/// not compiled in.
pub fn create_recognizer(
    config: &OcrConfig,
) -> Result<Box<dyn TextRecognizer + Send + Sync>, OcrError> {
    info!("Creating {} recognizer", config.engine.as_str());

    match config.engine {
        EngineKind::Tesseract => tesseract(config),
        EngineKind::Onnx => onnx(config),
    }
}

#[cfg(feature = "tesseract")]
fn tesseract(config: &OcrConfig) -> Result<Box<dyn TextRecognizer + Send + Sync>, OcrError> {
    let recognizer =
        super::TesseractRecognizer::new(config.model_dir.as_deref(), &config.language)?;
    Ok(Box::new(recognizer))
}

#[cfg(not(feature = "tesseract"))]
fn tesseract(_config: &OcrConfig) -> Result<Box<dyn TextRecognizer + Send + Sync>, OcrError> {
    Err(OcrError::Unavailable(EngineKind::Tesseract.as_str().to_string()))
}

#[cfg(feature = "native")]
fn onnx(config: &OcrConfig) -> Result<Box<dyn TextRecognizer + Send + Sync>, OcrError> {
    let model_dir = config
        .model_dir
        .clone()
        .unwrap_or_else(|| std::path::PathBuf::from("models"));
    let recognizer = super::OnnxRecognizer::from_dir(&model_dir)?;
    Ok(Box::new(recognizer))
}

#[cfg(not(feature = "native"))]
fn onnx(_config: &OcrConfig) -> Result<Box<dyn TextRecognizer + Send + Sync>, OcrError> {
    Err(OcrError::Unavailable(EngineKind::Onnx.as_str().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[cfg(feature = "native")]
    #[test]
    fn test_onnx_missing_models_is_model_load_error() {
        let config = OcrConfig {
            engine: EngineKind::Onnx,
            model_dir: Some(PathBuf::from("/nonexistent/rcpt-models")),
            ..OcrConfig::default()
        };

        match create_recognizer(&config) {
            Err(OcrError::ModelLoad(msg)) => assert!(msg.contains("det.onnx")),
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("expected an error"),
        }
    }

    #[cfg(not(feature = "tesseract"))]
    #[test]
    fn test_tesseract_unavailable_without_feature() {
        let config = OcrConfig {
            engine: EngineKind::Tesseract,
            model_dir: Some(PathBuf::from(".")),
            ..OcrConfig::default()
        };

        assert!(matches!(
            create_recognizer(&config),
            Err(OcrError::Unavailable(name)) if name == "tesseract"
        ));
    }
}
