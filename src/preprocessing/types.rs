//! # Shared Types for Image Preprocessing
//!
//! This module contains the shared types, structs, and enums used across
//! the preprocessing sub-modules.

use image::GrayImage;

/// Errors that can occur during image preprocessing operations.
#[derive(Debug, Clone, PartialEq)]
pub enum PreprocessingError {
    /// Window size for local statistics is zero or even
    InvalidWindowSize { window_size: u32 },
    /// A numeric parameter is out of its valid range
    InvalidParameter { name: &'static str, message: String },
}

impl std::fmt::Display for PreprocessingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PreprocessingError::InvalidWindowSize { window_size } => {
                write!(
                    f,
                    "Invalid window size: {}. Must be a positive odd integer",
                    window_size
                )
            }
            PreprocessingError::InvalidParameter { name, message } => {
                write!(f, "Invalid parameter '{}': {}", name, message)
            }
        }
    }
}

impl std::error::Error for PreprocessingError {}

/// Local thresholding formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThresholdMethod {
    /// `mean * (1 + k * (std / r - 1))`
    #[default]
    Sauvola,
    /// `mean + k * std`
    Niblack,
}

impl ThresholdMethod {
    /// Parse a method name as used in configuration ("sauvola" / "niblack").
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "sauvola" => Some(ThresholdMethod::Sauvola),
            "niblack" => Some(ThresholdMethod::Niblack),
            _ => None,
        }
    }

    /// The conventional sensitivity coefficient for this method.
    pub fn default_k(&self) -> f64 {
        match self {
            ThresholdMethod::Sauvola => 0.2,
            ThresholdMethod::Niblack => -0.2,
        }
    }
}

impl std::fmt::Display for ThresholdMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ThresholdMethod::Sauvola => write!(f, "sauvola"),
            ThresholdMethod::Niblack => write!(f, "niblack"),
        }
    }
}

/// Parameters of the adaptive binarization engine.
#[derive(Debug, Clone, PartialEq)]
pub struct BinarizationParams {
    /// Side of the square neighbourhood window (positive, odd)
    pub window_size: u32,
    /// Sensitivity coefficient
    pub k: f64,
    /// Dynamic range of the standard deviation (Sauvola only)
    pub r: f64,
    /// Thresholding formula
    pub method: ThresholdMethod,
}

impl BinarizationParams {
    /// Default window size for local statistics.
    pub const DEFAULT_WINDOW_SIZE: u32 = 25;

    /// Default dynamic range of the standard deviation.
    pub const DEFAULT_R: f64 = 128.0;

    /// Sauvola with window 25, k = 0.2, R = 128.
    pub fn sauvola() -> Self {
        Self {
            window_size: Self::DEFAULT_WINDOW_SIZE,
            k: ThresholdMethod::Sauvola.default_k(),
            r: Self::DEFAULT_R,
            method: ThresholdMethod::Sauvola,
        }
    }

    /// Niblack with window 25, k = -0.2.
    pub fn niblack() -> Self {
        Self {
            window_size: Self::DEFAULT_WINDOW_SIZE,
            k: ThresholdMethod::Niblack.default_k(),
            r: Self::DEFAULT_R,
            method: ThresholdMethod::Niblack,
        }
    }

    /// Returns a copy with a different window size.
    pub fn with_window_size(mut self, window_size: u32) -> Self {
        self.window_size = window_size;
        self
    }

    /// Returns a copy with a different sensitivity coefficient.
    pub fn with_k(mut self, k: f64) -> Self {
        self.k = k;
        self
    }

    /// Check the preconditions of the binarization engine.
    pub fn validate(&self) -> Result<(), PreprocessingError> {
        if self.window_size == 0 || self.window_size % 2 == 0 {
            return Err(PreprocessingError::InvalidWindowSize {
                window_size: self.window_size,
            });
        }
        if !self.k.is_finite() {
            return Err(PreprocessingError::InvalidParameter {
                name: "k",
                message: format!("must be finite, got {}", self.k),
            });
        }
        if !self.r.is_finite() || self.r <= 0.0 {
            return Err(PreprocessingError::InvalidParameter {
                name: "r",
                message: format!("must be a positive number, got {}", self.r),
            });
        }
        Ok(())
    }
}

impl Default for BinarizationParams {
    fn default() -> Self {
        Self::sauvola()
    }
}

/// Result of adaptive binarization.
#[derive(Debug, Clone)]
pub struct BinarizedImageResult {
    /// The binary image (every pixel is 0 or 255)
    pub image: GrayImage,
    /// Parameters the image was binarized with
    pub params: BinarizationParams,
    /// Share of pixels classified as foreground (0)
    pub foreground_ratio: f32,
    /// Processing time in milliseconds
    pub processing_time_ms: u32,
}

/// Result of CLAHE contrast enhancement operation.
#[derive(Debug, Clone)]
pub struct ClaheImageResult {
    /// The contrast-enhanced image
    pub image: GrayImage,
    /// Clip limit used for histogram clipping
    pub clip_limit: f32,
    /// Number of tiles along each axis
    pub grid: (u32, u32),
    /// Processing time in milliseconds
    pub processing_time_ms: u32,
}

/// Image that went through the full preprocessing chain and is ready for
/// the second recognition pass.
#[derive(Debug, Clone)]
pub struct PreparedImage {
    /// Binarized and denoised image
    pub image: GrayImage,
    /// Dimensions of the source image (width, height)
    pub original_dimensions: (u32, u32),
    /// Scale factor applied before binarization (1.0 when not upscaled)
    pub scale_factor: f32,
    /// Processing time in milliseconds
    pub processing_time_ms: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params_are_sauvola() {
        let params = BinarizationParams::default();
        assert_eq!(params.method, ThresholdMethod::Sauvola);
        assert_eq!(params.window_size, 25);
        assert_eq!(params.k, 0.2);
        assert_eq!(params.r, 128.0);
    }

    #[test]
    fn test_niblack_default_k_is_negative() {
        assert_eq!(BinarizationParams::niblack().k, -0.2);
    }

    #[test]
    fn test_validate_rejects_even_and_zero_windows() {
        for window_size in [0, 2, 24] {
            let params = BinarizationParams::sauvola().with_window_size(window_size);
            assert_eq!(
                params.validate(),
                Err(PreprocessingError::InvalidWindowSize { window_size })
            );
        }
        assert!(BinarizationParams::sauvola().with_window_size(1).validate().is_ok());
    }

    #[test]
    fn test_with_k_overrides_sensitivity() {
        let params = BinarizationParams::niblack().with_k(-0.5);
        assert_eq!(params.k, -0.5);
        assert_eq!(params.method, ThresholdMethod::Niblack);
        assert!(params.validate().is_ok());

        assert!(matches!(
            BinarizationParams::sauvola().with_k(f64::NAN).validate(),
            Err(PreprocessingError::InvalidParameter { name: "k", .. })
        ));
    }

    #[test]
    fn test_validate_rejects_bad_r() {
        let mut params = BinarizationParams::sauvola();
        params.r = 0.0;
        assert!(matches!(
            params.validate(),
            Err(PreprocessingError::InvalidParameter { name: "r", .. })
        ));
    }

    #[test]
    fn test_method_parse() {
        assert_eq!(ThresholdMethod::parse(" Sauvola "), Some(ThresholdMethod::Sauvola));
        assert_eq!(ThresholdMethod::parse("NIBLACK"), Some(ThresholdMethod::Niblack));
        assert_eq!(ThresholdMethod::parse("otsu"), None);
    }
}
