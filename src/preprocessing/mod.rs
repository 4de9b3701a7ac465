//! # Image Preprocessing Module
//!
//! This module prepares photographs for the second (enhanced) recognition pass.
//! The chain is upscale → grayscale → CLAHE → adaptive binarization → median denoise.
//!
//! The module is organized into focused sub-modules:
//! - `binarization`: Sauvola/Niblack local thresholding over integral images
//! - `enhancement`: Upscaling, CLAHE contrast enhancement and denoising
//! - `types`: Shared types and error definitions

pub mod binarization;
pub mod enhancement;
pub mod types;

use image::DynamicImage;

use crate::config::PreprocessingConfig;
use crate::observability::preprocessing_span;

// Re-export commonly used types and functions for convenience
pub use types::{
    BinarizationParams, BinarizedImageResult, ClaheImageResult, PreparedImage,
    PreprocessingError, ThresholdMethod,
};

pub use binarization::{
    apply_adaptive_threshold, binarize, compute_threshold, local_statistics, mirror_pad,
    threshold_map, IntegralImage, LocalStatistics, PaddedImage,
};
pub use enhancement::{apply_clahe, denoise_binary, upscale_to_min_width};

/// Run the full preprocessing chain on a decoded image.
///
/// # Arguments
///
/// * `image` - The untouched photograph
/// * `config` - Preprocessing settings (upscale width, CLAHE, binarization, denoise)
///
/// # Returns
///
/// The binarized, denoised image together with the scale factor that was applied
pub fn prepare_for_recognition(
    image: &DynamicImage,
    config: &PreprocessingConfig,
) -> Result<PreparedImage, PreprocessingError> {
    let span = preprocessing_span("prepare_for_recognition");
    let _enter = span.enter();
    let start_time = std::time::Instant::now();

    config.binarization.validate()?;

    let original_dimensions = (image.width(), image.height());
    let (scaled, scale_factor) = upscale_to_min_width(image, config.min_width);
    let gray = scaled.to_luma8();

    let enhanced = apply_clahe(
        &gray,
        config.clahe_clip_limit,
        (config.clahe_grid, config.clahe_grid),
    )?;
    let binarized =
        apply_adaptive_threshold(&DynamicImage::ImageLuma8(enhanced.image), &config.binarization)?;
    let denoised = denoise_binary(&binarized.image, config.denoise_radius);

    let processing_time = start_time.elapsed();
    tracing::info!(
        target: "ocr_preprocessing",
        "Prepared {}x{} image for recognition in {}ms (scale {:.2}, method {}, foreground {:.1}%)",
        original_dimensions.0,
        original_dimensions.1,
        processing_time.as_millis(),
        scale_factor,
        config.binarization.method,
        binarized.foreground_ratio * 100.0
    );

    Ok(PreparedImage {
        image: denoised,
        original_dimensions,
        scale_factor,
        processing_time_ms: processing_time.as_millis() as u32,
    })
}

/// Run [`prepare_for_recognition`], logging and swallowing failures.
///
/// Returns `None` when preprocessing fails; the caller then recognizes the
/// untouched image only.
pub fn try_prepare(image: &DynamicImage, config: &PreprocessingConfig) -> Option<PreparedImage> {
    match prepare_for_recognition(image, config) {
        Ok(prepared) => Some(prepared),
        Err(e) => {
            crate::errors::error_logging::log_preprocessing_error(
                &e,
                "prepare_for_recognition",
                Some((image.width(), image.height())),
            );
            None
        }
    }
}
