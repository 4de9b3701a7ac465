//! # Image Enhancement Module
//!
//! Steps that surround the binarization engine: upscaling small photographs,
//! CLAHE contrast enhancement before thresholding, and median denoising after it.

use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, Luma};
use tracing;

use super::types::{ClaheImageResult, PreprocessingError};

/// Upscale `image` with a cubic filter so that its width is at least `min_width`.
///
/// Returns the (possibly unchanged) image and the scale factor applied.
pub fn upscale_to_min_width(image: &DynamicImage, min_width: u32) -> (DynamicImage, f32) {
    let (width, height) = (image.width(), image.height());
    if width == 0 || width >= min_width {
        return (image.clone(), 1.0);
    }

    let scale = min_width as f32 / width as f32;
    let new_height = ((height as f32) * scale).round().max(1.0) as u32;
    let resized = image.resize_exact(min_width, new_height, FilterType::CatmullRom);

    tracing::debug!(
        target: "ocr_preprocessing",
        "Upscaled image from {}x{} to {}x{} (scale {:.2})",
        width,
        height,
        min_width,
        new_height,
        scale
    );

    (resized, scale)
}

/// Applies Contrast Limited Adaptive Histogram Equalization.
///
/// The image is split into a `grid.0 × grid.1` grid of tiles. Each tile gets a
/// clipped, equalized lookup table; every pixel is mapped through the four
/// surrounding tile tables and bilinearly blended so that tile seams do not show.
///
/// # Arguments
///
/// * `image` - The grayscale input
/// * `clip_limit` - Histogram clip limit relative to a uniform histogram (e.g. 2.0)
/// * `grid` - Number of tiles along x and y (e.g. (8, 8))
pub fn apply_clahe(
    image: &GrayImage,
    clip_limit: f32,
    grid: (u32, u32),
) -> Result<ClaheImageResult, PreprocessingError> {
    let start_time = std::time::Instant::now();

    if clip_limit <= 0.0 || !clip_limit.is_finite() {
        return Err(PreprocessingError::InvalidParameter {
            name: "clip_limit",
            message: format!("must be > 0.0, got {}", clip_limit),
        });
    }
    if grid.0 == 0 || grid.1 == 0 {
        return Err(PreprocessingError::InvalidParameter {
            name: "grid",
            message: "tile grid dimensions must be > 0".to_string(),
        });
    }

    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Ok(ClaheImageResult {
            image: image.clone(),
            clip_limit,
            grid,
            processing_time_ms: 0,
        });
    }

    let tiles_x = grid.0.min(width);
    let tiles_y = grid.1.min(height);
    // Tiles never exceed the image and each is at least one pixel wide.
    let x_bounds = tile_bounds(width, tiles_x);
    let y_bounds = tile_bounds(height, tiles_y);

    let mut luts = Vec::with_capacity((tiles_x * tiles_y) as usize);
    for &(y0, y1) in &y_bounds {
        for &(x0, x1) in &x_bounds {
            luts.push(tile_lut(image, x0, y0, x1, y1, clip_limit));
        }
    }

    let tile_w = width as f32 / tiles_x as f32;
    let tile_h = height as f32 / tiles_y as f32;

    let mut output = GrayImage::new(width, height);
    for (x, y, pixel) in image.enumerate_pixels() {
        // Position relative to tile centres.
        let gx = ((x as f32 + 0.5) / tile_w - 0.5).clamp(0.0, (tiles_x - 1) as f32);
        let gy = ((y as f32 + 0.5) / tile_h - 0.5).clamp(0.0, (tiles_y - 1) as f32);
        let tx0 = (gx.floor() as u32).min(tiles_x - 1);
        let ty0 = (gy.floor() as u32).min(tiles_y - 1);
        let tx1 = (tx0 + 1).min(tiles_x - 1);
        let ty1 = (ty0 + 1).min(tiles_y - 1);
        let fx = gx - tx0 as f32;
        let fy = gy - ty0 as f32;

        let v = pixel[0] as usize;
        let lut = |tx: u32, ty: u32| luts[(ty * tiles_x + tx) as usize][v] as f32;

        let top = lut(tx0, ty0) * (1.0 - fx) + lut(tx1, ty0) * fx;
        let bottom = lut(tx0, ty1) * (1.0 - fx) + lut(tx1, ty1) * fx;
        let value = top * (1.0 - fy) + bottom * fy;

        output.put_pixel(x, y, Luma([value.round().clamp(0.0, 255.0) as u8]));
    }

    let processing_time = start_time.elapsed();
    tracing::debug!(
        target: "ocr_preprocessing",
        "CLAHE applied in {}ms: clip_limit={}, grid={:?}",
        processing_time.as_millis(),
        clip_limit,
        grid
    );

    Ok(ClaheImageResult {
        image: output,
        clip_limit,
        grid,
        processing_time_ms: processing_time.as_millis() as u32,
    })
}

/// Split `extent` pixels into `tiles` contiguous `[start, end)` ranges.
///
/// Requires `1 <= tiles <= extent`.
fn tile_bounds(extent: u32, tiles: u32) -> Vec<(u32, u32)> {
    let edge = |i: u32| (i as u64 * extent as u64 / tiles as u64) as u32;
    (0..tiles).map(|i| (edge(i), edge(i + 1))).collect()
}

/// Clipped histogram equalization table of one tile.
fn tile_lut(image: &GrayImage, x0: u32, y0: u32, x1: u32, y1: u32, clip_limit: f32) -> [u8; 256] {
    let mut histogram = [0u32; 256];
    for y in y0..y1 {
        for x in x0..x1 {
            histogram[image.get_pixel(x, y)[0] as usize] += 1;
        }
    }

    let total = ((x1 - x0) * (y1 - y0)).max(1);
    let clip = ((clip_limit * total as f32 / 256.0).round() as u32).max(1);

    let mut excess = 0u32;
    for count in histogram.iter_mut() {
        if *count > clip {
            excess += *count - clip;
            *count = clip;
        }
    }

    let increment = excess / 256;
    let mut remainder = excess % 256;
    for count in histogram.iter_mut() {
        *count += increment;
        if remainder > 0 {
            *count += 1;
            remainder -= 1;
        }
    }

    let mut lut = [0u8; 256];
    let mut cumulative = 0u32;
    for (value, count) in histogram.iter().enumerate() {
        cumulative += count;
        lut[value] = ((cumulative as f32 / total as f32) * 255.0).round().min(255.0) as u8;
    }
    lut
}

/// Removes isolated speckles left by binarization with a median filter.
///
/// A radius of 0 returns the image unchanged.
pub fn denoise_binary(image: &GrayImage, radius: u32) -> GrayImage {
    if radius == 0 {
        return image.clone();
    }
    imageproc::filter::median_filter(image, radius, radius)
}
