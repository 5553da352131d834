//! JPEG encoding of decoded images.
//!
//! Alpha is discarded: high-fidelity RGBA is written as RGB, and RGB565 is
//! expanded to RGB before encoding.

use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder};

use super::error::EncodeError;
use crate::decode::DecodedImage;

/// Encode a decoded image as JPEG at `quality` (clamped to 1-100).
pub fn encode_jpeg(image: &DecodedImage, quality: u8) -> Result<Vec<u8>, EncodeError> {
    validate(image)?;
    let rgb = image.to_rgb8_bytes();
    encode_rgb(&rgb, image.width, image.height, quality)
}

/// Check dimensions and buffer length before handing pixels to a codec.
pub(crate) fn validate(image: &DecodedImage) -> Result<(), EncodeError> {
    if image.width == 0 || image.height == 0 {
        return Err(EncodeError::InvalidDimensions {
            width: image.width,
            height: image.height,
        });
    }

    let expected = image
        .pixel_format
        .buffer_len(image.width, image.height)
        .ok_or(EncodeError::InvalidDimensions {
            width: image.width,
            height: image.height,
        })?;
    if image.pixels.len() != expected {
        return Err(EncodeError::InvalidPixelData {
            expected,
            actual: image.pixels.len(),
        });
    }
    Ok(())
}

/// Encode packed RGB8 pixels. The compressor calls this repeatedly on one buffer.
pub(crate) fn encode_rgb(
    rgb: &[u8],
    width: u32,
    height: u32,
    quality: u8,
) -> Result<Vec<u8>, EncodeError> {
    let quality = quality.clamp(1, 100);
    let mut buffer = Vec::new();

    JpegEncoder::new_with_quality(&mut buffer, quality)
        .write_image(rgb, width, height, ExtendedColorType::Rgb8)
        .map_err(|e| EncodeError::EncodingFailed(e.to_string()))?;

    Ok(buffer)
}


// ============================================================================
// Property-Based Tests
// ============================================================================
