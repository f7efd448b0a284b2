//! ONNX recognizer backed by `pure-onnx-ocr` (pure Rust, no external ONNX Runtime).

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::time::Instant;

use image::DynamicImage;
use pure_onnx_ocr::engine::{OcrEngine, OcrEngineBuilder};
use tracing::{debug, info};

use crate::error::OcrError;

use super::{SegmentationMode, TextRecognizer};

thread_local! {
    /// Engine loaded on this thread, with the model directory it came from.
    static ENGINE: RefCell<Option<(PathBuf, OcrEngine)>> = RefCell::new(None);
}

/// PaddleOCR detection + recognition models run through `pure-onnx-ocr`.
///
/// The engine cannot move between threads, so each worker thread loads its
/// own copy on first use and keeps it for later calls. The detector finds its
/// own text regions, so segmentation modes have no counterpart here and are
/// ignored.
pub struct OnnxRecognizer {
    model_dir: PathBuf,
}

impl OnnxRecognizer {
    /// Check the model files in a directory and load them once.
    pub fn from_dir(model_dir: &Path) -> Result<Self, OcrError> {
        load_engine(model_dir)?;
        info!("Loaded pure-onnx-ocr models from {}", model_dir.display());

        Ok(Self {
            model_dir: model_dir.to_path_buf(),
        })
    }

    fn with_engine<T>(
        &self,
        f: impl FnOnce(&OcrEngine) -> Result<T, OcrError>,
    ) -> Result<T, OcrError> {
        ENGINE.with(|cell| {
            let mut slot = cell.borrow_mut();
            if slot.as_ref().is_none_or(|(dir, _)| *dir != self.model_dir) {
                debug!("Loading pure-onnx-ocr engine on {:?}", std::thread::current().id());
                *slot = Some((self.model_dir.clone(), load_engine(&self.model_dir)?));
            }
            match slot.as_ref() {
                Some((_, engine)) => f(engine),
                None => Err(OcrError::EngineInit("engine slot empty".to_string())),
            }
        })
    }
}

fn load_engine(model_dir: &Path) -> Result<OcrEngine, OcrError> {
    let det_path = model_dir.join("det.onnx");
    let rec_path = model_dir.join("latin_rec.onnx");
    let dict_path = model_dir.join("latin_dict.txt");

    for path in [&det_path, &rec_path, &dict_path] {
        if !path.exists() {
            return Err(OcrError::ModelLoad(format!(
                "missing model file {}",
                path.display()
            )));
        }
    }

    OcrEngineBuilder::new()
        .det_model_path(&det_path)
        .rec_model_path(&rec_path)
        .dictionary_path(&dict_path)
        .build()
        .map_err(|e| OcrError::ModelLoad(format!("pure-onnx-ocr: {}", e)))
}

impl TextRecognizer for OnnxRecognizer {
    fn name(&self) -> &str {
        "onnx"
    }

    fn recognize(&self, image: &DynamicImage, mode: SegmentationMode) -> Result<String, OcrError> {
        let start = Instant::now();

        let results = self.with_engine(|engine| {
            engine
                .run_from_image(image)
                .map_err(|e| OcrError::Recognition(format!("pure-onnx-ocr: {}", e)))
        })?;

        // Reading order: rows of ~20px top to bottom, then left to right.
        let mut lines: Vec<((i32, f32), String)> = results
            .iter()
            .map(|r| {
                let (x, y) = top_left(&r.bounding_box);
                (((y / 20.0) as i32, x), r.text.replace("[UNK]", " "))
            })
            .collect();

        lines.sort_by(|(a, _), (b, _)| {
            a.0.cmp(&b.0)
                .then(a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        });

        debug!(
            "pure-onnx-ocr returned {} text regions in {}ms (mode {:?} not applicable)",
            lines.len(),
            start.elapsed().as_millis(),
            mode
        );

        Ok(lines
            .into_iter()
            .map(|(_, text)| text)
            .collect::<Vec<_>>()
            .join("\n"))
    }
}

/// Smallest x and y over the polygon's exterior points.
fn top_left(polygon: &pure_onnx_ocr::Polygon<f64>) -> (f32, f32) {
    polygon
        .exterior()
        .coords()
        .fold((f32::INFINITY, f32::INFINITY), |(min_x, min_y), c| {
            (min_x.min(c.x as f32), min_y.min(c.y as f32))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_recognizer_is_shareable_across_workers() {
        assert_send_sync::<OnnxRecognizer>();
        assert_send_sync::<Box<dyn TextRecognizer + Send + Sync>>();
    }
}
