//! Lossless PNG encoding of decoded images.

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};

use super::error::EncodeError;
use super::jpeg::validate;
use crate::decode::{DecodedImage, PixelFormat};

/// Encode a decoded image as PNG.
///
/// High-fidelity images keep their alpha channel; RGB565 images are expanded
/// to RGB8.
pub fn encode_png(image: &DecodedImage) -> Result<Vec<u8>, EncodeError> {
    validate(image)?;
    let mut buffer = Vec::new();
    let encoder = PngEncoder::new(&mut buffer);

    let result = match image.pixel_format {
        PixelFormat::HighFidelity => encoder.write_image(
            &image.pixels,
            image.width,
            image.height,
            ExtendedColorType::Rgba8,
        ),
        PixelFormat::LowMemory => encoder.write_image(
            &image.to_rgb8_bytes(),
            image.width,
            image.height,
            ExtendedColorType::Rgb8,
        ),
    };
    result.map_err(|e| EncodeError::EncodingFailed(e.to_string()))?;

    Ok(buffer)
}
