//! Image preprocessing for OCR.

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use tracing::debug;

use crate::models::config::PreprocessConfig;

/// Bitmap preprocessor for the first recognition pass.
///
/// Grayscale, contrast boost, unsharp mask, median denoise, then a Lanczos
/// upscale so the shorter side reaches `min_dimension`.
#[derive(Debug, Clone)]
pub struct ImagePreprocessor {
    /// Contrast multiplier.
    contrast_factor: f32,
    /// Unsharp-mask sigma, 0 disables.
    sharpen_sigma: f32,
    /// Unsharp-mask threshold.
    sharpen_threshold: i32,
    /// Median filter radius, 0 disables.
    median_radius: u32,
    /// Minimum length of the shorter side.
    min_dimension: u32,
}

impl ImagePreprocessor {
    /// Create a new preprocessor with default settings.
    pub fn new() -> Self {
        Self::from_config(&PreprocessConfig::default())
    }

    pub fn from_config(config: &PreprocessConfig) -> Self {
        Self {
            contrast_factor: config.contrast_factor,
            sharpen_sigma: config.sharpen_sigma,
            sharpen_threshold: config.sharpen_threshold,
            median_radius: config.median_radius,
            min_dimension: config.min_dimension,
        }
    }

    /// Set minimum length of the shorter side.
    pub fn with_min_dimension(mut self, size: u32) -> Self {
        self.min_dimension = size;
        self
    }

    /// Run the full preprocessing chain.
    pub fn prepare(&self, image: &DynamicImage) -> DynamicImage {
        let (orig_width, orig_height) = image.dimensions();

        let mut processed = image.grayscale();

        if (self.contrast_factor - 1.0).abs() > f32::EPSILON {
            processed = processed.adjust_contrast(contrast_percent(self.contrast_factor));
        }

        if self.sharpen_sigma > 0.0 {
            processed = processed.unsharpen(self.sharpen_sigma, self.sharpen_threshold);
        }

        let mut gray = processed.to_luma8();
        if self.median_radius > 0 {
            gray = imageproc::filter::median_filter(&gray, self.median_radius, self.median_radius);
        }

        let (width, height) = gray.dimensions();
        let (new_width, new_height) = self.calculate_upscale_dimensions(width, height);
        let prepared = DynamicImage::ImageLuma8(gray);

        debug!(
            "Preprocessed image {}x{} -> {}x{}",
            orig_width, orig_height, new_width, new_height
        );

        if (new_width, new_height) == (width, height) {
            prepared
        } else {
            prepared.resize_exact(new_width, new_height, FilterType::Lanczos3)
        }
    }

    /// Scale both sides uniformly so the shorter one is at least `min_dimension`.
    fn calculate_upscale_dimensions(&self, width: u32, height: u32) -> (u32, u32) {
        if width == 0 || height == 0 {
            return (width, height);
        }

        let shorter = width.min(height);
        if shorter >= self.min_dimension {
            return (width, height);
        }

        let scale = self.min_dimension as f64 / shorter as f64;
        let scaled = |side: u32| {
            if side == shorter {
                self.min_dimension
            } else {
                ((side as f64 * scale).round() as u32).max(self.min_dimension)
            }
        };

        (scaled(width), scaled(height))
    }
}

impl Default for ImagePreprocessor {
    fn default() -> Self {
        Self::new()
    }
}

/// `DynamicImage::adjust_contrast` takes a percentage whose effect is the
/// multiplier `((100 + c) / 100)^2`; invert that for a plain factor.
fn contrast_percent(factor: f32) -> f32 {
    (factor.max(0.0).sqrt() - 1.0) * 100.0
}
