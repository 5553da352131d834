//! Core types for bounded-memory decoding.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::encode::EncodeError;

/// Error types for the probe / decode / normalize chain.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The source could not be opened or read.
    #[error("Image source could not be read: {0}")]
    UnreadableSource(String),

    /// The bytes are not a recognized or decodable image.
    #[error("Invalid or unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// The source carries no data (empty buffer, empty path, empty locator, id <= 0).
    #[error("Image source is empty")]
    EmptySource,

    /// An allocation limit was hit while decoding.
    #[error("Out of memory during decoding: {0}")]
    MemoryExhausted(String),

    /// A target dimension of zero was requested.
    #[error("Invalid target size: width ({width}) and height ({height}) must be non-zero")]
    InvalidTarget { width: u32, height: u32 },

    /// Encoding the decoded pixels failed.
    #[error(transparent)]
    Encode(#[from] EncodeError),
}

impl DecodeError {
    /// Map a codec error onto the pipeline's error kinds.
    ///
    /// Limit violations become `MemoryExhausted` so the orchestrator can
    /// retry with a cheaper pixel format.
    pub(crate) fn from_image(err: image::ImageError) -> Self {
        match err {
            image::ImageError::Limits(e) => DecodeError::MemoryExhausted(e.to_string()),
            image::ImageError::IoError(e) => DecodeError::UnreadableSource(e.to_string()),
            other => DecodeError::UnsupportedFormat(other.to_string()),
        }
    }

    /// Returns true if a retry with a smaller pixel format may succeed.
    pub fn is_memory_exhausted(&self) -> bool {
        matches!(self, DecodeError::MemoryExhausted(_))
    }
}

/// Pixel dimensions read from an image header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageBounds {
    pub width: u32,
    pub height: u32,
}

impl ImageBounds {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Total number of pixels, widened so it cannot overflow.
    pub fn pixel_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Returns true if both dimensions are within the given box.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.width <= width && self.height <= height
    }

    pub(crate) fn swapped(self) -> Self {
        Self {
            width: self.height,
            height: self.width,
        }
    }
}

/// In-memory pixel representation produced by the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PixelFormat {
    /// RGBA, 8 bits per channel (32 bits per pixel).
    #[default]
    HighFidelity,
    /// RGB565 little-endian, no alpha (16 bits per pixel).
    LowMemory,
}

impl PixelFormat {
    #[inline]
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::HighFidelity => 4,
            PixelFormat::LowMemory => 2,
        }
    }

    /// Number of bytes a `width x height` buffer needs, or `None` on overflow.
    pub fn buffer_len(self, width: u32, height: u32) -> Option<usize> {
        (width as usize)
            .checked_mul(height as usize)?
            .checked_mul(self.bytes_per_pixel())
    }
}

/// Allocation ceilings applied while decoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeLimits {
    /// Upper bound on what the codec may allocate for the full-resolution decode.
    pub max_source_alloc: Option<u64>,
    /// Upper bound on the output pixel buffer of a single decode.
    pub max_pixel_bytes: Option<u64>,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self {
            max_source_alloc: Some(512 * 1024 * 1024),
            max_pixel_bytes: None,
        }
    }
}

impl DecodeLimits {
    /// No ceilings at all.
    pub fn unbounded() -> Self {
        Self {
            max_source_alloc: None,
            max_pixel_bytes: None,
        }
    }
}

/// Parameters for one decode attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodeConfig {
    /// Power-of-two downsample factor; 1 keeps full resolution.
    pub sample_size: u32,
    pub pixel_format: PixelFormat,
    /// Declared density multiplier of the source (`160 * d` dpi).
    pub density_override: Option<f32>,
    /// Rotate/flip according to the EXIF orientation tag.
    pub apply_orientation: bool,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            sample_size: 1,
            pixel_format: PixelFormat::HighFidelity,
            density_override: None,
            apply_orientation: false,
        }
    }
}

impl DecodeConfig {
    pub fn new(sample_size: u32, pixel_format: PixelFormat) -> Self {
        Self {
            sample_size: sample_size.max(1),
            pixel_format,
            ..Default::default()
        }
    }

    /// Same settings with a different pixel format.
    pub fn with_pixel_format(self, pixel_format: PixelFormat) -> Self {
        Self {
            pixel_format,
            ..self
        }
    }
}

/// Scale factor implied by a density override, if it changes anything.
///
/// A source declared at `160 * d` dpi is rendered at the 160 dpi baseline,
/// so dimensions are multiplied by `1 / d`. Zero, negative and non-finite
/// overrides are ignored.
pub(crate) fn density_scale(density_override: Option<f32>) -> Option<f64> {
    let density = density_override?;
    if !density.is_finite() || density <= 0.0 || density == 1.0 {
        return None;
    }
    Some(1.0 / density as f64)
}

/// Apply a scale factor to a dimension, never going below one pixel.
pub(crate) fn scale_dimension(value: u32, scale: f64) -> u32 {
    let scaled = (value as f64 * scale).round();
    if scaled >= u32::MAX as f64 {
        u32::MAX
    } else {
        (scaled as u32).max(1)
    }
}

/// A decoded image owning its pixel buffer.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Layout of `pixels`.
    pub pixel_format: PixelFormat,
    /// Row-major pixel data, `width * height * bytes_per_pixel` bytes.
    pub pixels: Vec<u8>,
}

impl DecodedImage {
    /// Create a new DecodedImage with the given dimensions and pixel data.
    pub fn new(width: u32, height: u32, pixel_format: PixelFormat, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(
            Some(pixels.len()),
            pixel_format.buffer_len(width, height),
            "Pixel buffer size mismatch"
        );
        Self {
            width,
            height,
            pixel_format,
            pixels,
        }
    }

    /// Get the total number of pixels.
    pub fn pixel_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Get the size of the pixel buffer in bytes.
    pub fn byte_size(&self) -> usize {
        self.pixels.len()
    }

    /// Check if this is an empty/invalid image.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.pixels.is_empty()
    }

    /// Expand to packed RGB8, dropping alpha.
    pub fn to_rgb8_bytes(&self) -> Vec<u8> {
        let mut rgb = Vec::with_capacity(self.pixel_count() as usize * 3);
        match self.pixel_format {
            PixelFormat::HighFidelity => {
                for px in self.pixels.chunks_exact(4) {
                    rgb.extend_from_slice(&px[..3]);
                }
            }
            PixelFormat::LowMemory => {
                for px in self.pixels.chunks_exact(2) {
                    let value = u16::from_le_bytes([px[0], px[1]]);
                    rgb.extend_from_slice(&super::pixels::unpack_rgb565(value));
                }
            }
        }
        rgb
    }

    /// Convert to an `image::DynamicImage` for resampling.
    pub fn to_dynamic(&self) -> Option<image::DynamicImage> {
        match self.pixel_format {
            PixelFormat::HighFidelity => {
                image::RgbaImage::from_raw(self.width, self.height, self.pixels.clone())
                    .map(image::DynamicImage::ImageRgba8)
            }
            PixelFormat::LowMemory => {
                image::RgbImage::from_raw(self.width, self.height, self.to_rgb8_bytes())
                    .map(image::DynamicImage::ImageRgb8)
            }
        }
    }
}
