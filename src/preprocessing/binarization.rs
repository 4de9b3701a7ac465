//! # Adaptive Binarization Module
//!
//! This module converts a grayscale image into a black/white image using a
//! per-pixel threshold computed from the local neighbourhood (Sauvola or Niblack).
//! Unlike a single global threshold, local thresholds keep text readable under
//! shadows and uneven lighting.
//!
//! Window statistics are computed in O(1) per pixel from two integral images
//! (sum of intensities and sum of squared intensities) over a mirror-padded copy
//! of the source.

use image::{DynamicImage, GrayImage, Luma};
use tracing;

use super::types::{BinarizationParams, BinarizedImageResult, PreprocessingError, ThresholdMethod};

/// Mean, variance and standard deviation of one pixel's window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalStatistics {
    pub mean: f64,
    pub variance: f64,
    pub std_dev: f64,
}

/// Row-major f64 plane produced by [`mirror_pad`].
#[derive(Debug, Clone, PartialEq)]
pub struct PaddedImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<f64>,
}

/// Summed-area table with one extra leading row and column of zeros.
///
/// Cell `(x, y)` holds the sum of all source values in the rectangle
/// `[0, x) × [0, y)`, so the table is `(height + 1) × (width + 1)`.
#[derive(Debug, Clone)]
pub struct IntegralImage {
    width: usize,
    height: usize,
    data: Vec<f64>,
}

impl IntegralImage {
    /// Build the table from `width × height` row-major source values.
    ///
    /// # Panics
    ///
    /// Panics if `values.len() != width * height`.
    pub fn new(width: usize, height: usize, values: &[f64]) -> Self {
        assert_eq!(
            values.len(),
            width * height,
            "source length must match dimensions"
        );

        let stride = width + 1;
        let mut data = vec![0f64; stride * (height + 1)];

        for y in 0..height {
            let mut row_sum = 0f64;
            for x in 0..width {
                row_sum += values[y * width + x];
                data[(y + 1) * stride + x + 1] = data[y * stride + x + 1] + row_sum;
            }
        }

        Self {
            width: width + 1,
            height: height + 1,
            data,
        }
    }

    /// Table width (source width + 1).
    pub fn width(&self) -> usize {
        self.width
    }

    /// Table height (source height + 1).
    pub fn height(&self) -> usize {
        self.height
    }

    /// Raw table value at `(x, y)`.
    pub fn at(&self, x: usize, y: usize) -> f64 {
        self.data[y * self.width + x]
    }

    /// Sum of the source rectangle `[x0, x1) × [y0, y1)`.
    ///
    /// Uses bottom-right + top-left − top-right − bottom-left.
    pub fn window_sum(&self, x0: usize, y0: usize, x1: usize, y1: usize) -> f64 {
        self.at(x1, y1) + self.at(x0, y0) - self.at(x1, y0) - self.at(x0, y1)
    }
}

/// Edge-inclusive reflection (`fedcba|abcdef|fedcba`), repeated as needed.
fn reflect_index(i: i64, n: i64) -> usize {
    let period = 2 * n;
    let m = i.rem_euclid(period);
    if m >= n {
        (period - 1 - m) as usize
    } else {
        m as usize
    }
}

/// Mirror-pad a grayscale image by `pad` pixels on every side.
pub fn mirror_pad(image: &GrayImage, pad: u32) -> PaddedImage {
    let (src_w, src_h) = image.dimensions();
    let pad = pad as i64;
    let width = src_w as usize + 2 * pad as usize;
    let height = src_h as usize + 2 * pad as usize;

    let mut data = Vec::with_capacity(width * height);
    for py in 0..height as i64 {
        let sy = reflect_index(py - pad, src_h as i64) as u32;
        for px in 0..width as i64 {
            let sx = reflect_index(px - pad, src_w as i64) as u32;
            data.push(image.get_pixel(sx, sy)[0] as f64);
        }
    }

    PaddedImage {
        width,
        height,
        data,
    }
}

/// Compute the window statistics of every pixel, row-major.
///
/// # Errors
///
/// Returns `PreprocessingError::InvalidWindowSize` if `window_size` is zero or even.
pub fn local_statistics(
    image: &GrayImage,
    window_size: u32,
) -> Result<Vec<LocalStatistics>, PreprocessingError> {
    if window_size == 0 || window_size % 2 == 0 {
        return Err(PreprocessingError::InvalidWindowSize { window_size });
    }

    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Ok(Vec::new());
    }

    let padded = mirror_pad(image, window_size / 2);
    let squares: Vec<f64> = padded.data.iter().map(|v| v * v).collect();

    let integral_sum = IntegralImage::new(padded.width, padded.height, &padded.data);
    let integral_sq_sum = IntegralImage::new(padded.width, padded.height, &squares);

    let w = window_size as usize;
    let n = (w * w) as f64;
    let mut stats = Vec::with_capacity(width as usize * height as usize);

    for y in 0..height as usize {
        for x in 0..width as usize {
            let window_sum = integral_sum.window_sum(x, y, x + w, y + w);
            let window_sq_sum = integral_sq_sum.window_sum(x, y, x + w, y + w);

            let mean = window_sum / n;
            // Rounding can leave a tiny negative value here.
            let variance = (window_sq_sum / n - mean * mean).max(0.0);

            stats.push(LocalStatistics {
                mean,
                variance,
                std_dev: variance.sqrt(),
            });
        }
    }

    Ok(stats)
}

/// Threshold of a single pixel given its window statistics.
pub fn compute_threshold(method: ThresholdMethod, mean: f64, std_dev: f64, k: f64, r: f64) -> f64 {
    match method {
        ThresholdMethod::Sauvola => mean * (1.0 + k * (std_dev / r - 1.0)),
        ThresholdMethod::Niblack => mean + k * std_dev,
    }
}

/// Per-pixel thresholds for `image`, row-major.
pub fn threshold_map(
    image: &GrayImage,
    params: &BinarizationParams,
) -> Result<Vec<f64>, PreprocessingError> {
    params.validate()?;

    Ok(local_statistics(image, params.window_size)?
        .into_iter()
        .map(|s| compute_threshold(params.method, s.mean, s.std_dev, params.k, params.r))
        .collect())
}

/// Binarize a grayscale image with a locally adaptive threshold.
///
/// A pixel becomes 255 when its intensity is strictly greater than its
/// threshold, 0 otherwise. The output has the same dimensions as the input.
///
/// # Arguments
///
/// * `image` - The grayscale source
/// * `params` - Window size, k, R and thresholding method
///
/// # Errors
///
/// An even or zero window size (or a non-finite k / non-positive R) is rejected
/// before any computation.
///
/// # Examples
///
/// ```
/// use address_ocr::preprocessing::{binarize, BinarizationParams};
///
/// let image = image::GrayImage::from_pixel(8, 8, image::Luma([200]));
/// let binary = binarize(&image, &BinarizationParams::sauvola().with_window_size(3))?;
/// assert!(binary.pixels().all(|p| p[0] == 255));
/// # Ok::<(), address_ocr::preprocessing::PreprocessingError>(())
/// ```
pub fn binarize(
    image: &GrayImage,
    params: &BinarizationParams,
) -> Result<GrayImage, PreprocessingError> {
    let thresholds = threshold_map(image, params)?;
    let (width, height) = image.dimensions();

    let mut binary = GrayImage::new(width, height);
    for (x, y, pixel) in image.enumerate_pixels() {
        let threshold = thresholds[y as usize * width as usize + x as usize];
        let value = if pixel[0] as f64 > threshold { 255u8 } else { 0u8 };
        binary.put_pixel(x, y, Luma([value]));
    }

    Ok(binary)
}

/// Binarize any image (converted to grayscale first) and collect metadata.
pub fn apply_adaptive_threshold(
    image: &DynamicImage,
    params: &BinarizationParams,
) -> Result<BinarizedImageResult, PreprocessingError> {
    let start_time = std::time::Instant::now();

    let gray = image.to_luma8();
    let binary = binarize(&gray, params)?;

    let total = (binary.width() as usize * binary.height() as usize).max(1);
    let foreground = binary.pixels().filter(|p| p[0] == 0).count();
    let processing_time = start_time.elapsed();

    tracing::debug!(
        target: "ocr_preprocessing",
        "Adaptive thresholding completed in {}ms: method={}, window={}, k={}, dimensions={}x{}",
        processing_time.as_millis(),
        params.method,
        params.window_size,
        params.k,
        binary.width(),
        binary.height()
    );
    metrics::histogram!("binarization_duration_ms").record(processing_time.as_millis() as f64);

    Ok(BinarizedImageResult {
        image: binary,
        params: params.clone(),
        foreground_ratio: foreground as f32 / total as f32,
        processing_time_ms: processing_time.as_millis() as u32,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient_image(width: u32, height: u32) -> GrayImage {
        GrayImage::from_fn(width, height, |x, y| Luma([((x * 7 + y * 13) % 256) as u8]))
    }

    #[test]
    fn test_reflect_index_matches_edge_inclusive_reflection() {
        // fedcba|abcdef|fedcba with n = 6
        assert_eq!(reflect_index(-1, 6), 0);
        assert_eq!(reflect_index(-3, 6), 2);
        assert_eq!(reflect_index(6, 6), 5);
        assert_eq!(reflect_index(8, 6), 3);
        // pad larger than the image keeps bouncing
        assert_eq!(reflect_index(-3, 2), 1);
        assert_eq!(reflect_index(5, 1), 0);
    }

    #[test]
    fn test_integral_image_dimensions() {
        let padded = mirror_pad(&gradient_image(10, 6), 2);
        assert_eq!((padded.width, padded.height), (14, 10));

        let integral = IntegralImage::new(padded.width, padded.height, &padded.data);
        assert_eq!(integral.width(), padded.width + 1);
        assert_eq!(integral.height(), padded.height + 1);
        assert_eq!(integral.at(0, 0), 0.0);
    }

    #[test]
    fn test_window_sum_matches_direct_sum() {
        let values: Vec<f64> = (0..20).map(|v| v as f64).collect();
        let integral = IntegralImage::new(5, 4, &values);

        // rows 1..3, columns 2..5
        let expected: f64 = (1..3)
            .flat_map(|y| (2..5).map(move |x| (y * 5 + x) as f64))
            .sum();
        assert_eq!(integral.window_sum(2, 1, 5, 3), expected);
        assert_eq!(integral.window_sum(0, 0, 5, 4), values.iter().sum::<f64>());
    }

    #[test]
    fn test_flat_region_has_zero_variance() {
        let image = GrayImage::from_pixel(9, 9, Luma([77]));
        let stats = local_statistics(&image, 5).expect("valid window");
        for s in stats {
            assert_eq!(s.mean, 77.0);
            assert_eq!(s.variance, 0.0);
            assert_eq!(s.std_dev, 0.0);
        }
    }

    #[test]
    fn test_binarize_rejects_even_window() {
        let image = gradient_image(4, 4);
        let params = BinarizationParams::sauvola().with_window_size(4);
        assert_eq!(
            binarize(&image, &params),
            Err(PreprocessingError::InvalidWindowSize { window_size: 4 })
        );
    }

    #[test]
    fn test_binarize_output_is_binary_and_same_size() {
        let image = gradient_image(31, 17);
        let binary = binarize(&image, &BinarizationParams::sauvola()).expect("valid params");

        assert_eq!(binary.dimensions(), image.dimensions());
        assert!(binary.pixels().all(|p| p[0] == 0 || p[0] == 255));
    }

    #[test]
    fn test_dark_text_on_shadowed_background() {
        // Background brightness falls from 220 to 90 left to right; a dark
        // stroke runs down column 20.
        let image = GrayImage::from_fn(40, 20, |x, _| {
            if x == 20 {
                Luma([20])
            } else {
                Luma([(220 - x * 130 / 39) as u8])
            }
        });
        let binary = binarize(&image, &BinarizationParams::sauvola().with_window_size(7))
            .expect("valid params");

        assert_eq!(binary.get_pixel(20, 10)[0], 0);
        assert_eq!(binary.get_pixel(2, 10)[0], 255);
        assert_eq!(binary.get_pixel(37, 10)[0], 255);
    }

    #[test]
    fn test_apply_adaptive_threshold_reports_metadata() {
        let image = DynamicImage::ImageLuma8(GrayImage::from_pixel(6, 6, Luma([255])));
        let result = apply_adaptive_threshold(&image, &BinarizationParams::sauvola())
            .expect("valid params");

        assert_eq!(result.foreground_ratio, 0.0);
        assert_eq!(result.params, BinarizationParams::sauvola());
    }

    #[test]
    fn test_empty_image_yields_empty_output() {
        let image = GrayImage::new(0, 0);
        let binary = binarize(&image, &BinarizationParams::default()).expect("valid params");
        assert_eq!(binary.dimensions(), (0, 0));
    }
}
