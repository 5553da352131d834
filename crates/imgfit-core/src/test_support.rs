//! Shared fixtures for unit tests.

use std::io::Cursor;

use image::{DynamicImage, ImageFormat, RgbImage};

use crate::decode::pixels::pack_rgb565;
use crate::decode::{DecodedImage, PixelFormat};

/// Smooth RGB gradient; compresses well.
pub fn gradient_rgb(width: u32, height: u32) -> DynamicImage {
    let mut img = RgbImage::new(width, height);
    for (x, y, px) in img.enumerate_pixels_mut() {
        let r = (x * 255 / width.max(1)) as u8;
        let g = (y * 255 / height.max(1)) as u8;
        px.0 = [r, g, 128];
    }
    DynamicImage::ImageRgb8(img)
}

/// Deterministic pseudo-random noise; compresses badly.
pub fn noise_rgb(width: u32, height: u32) -> DynamicImage {
    let mut state: u32 = 0x2545_F491;
    let mut img = RgbImage::new(width, height);
    for px in img.pixels_mut() {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        let [r, g, b, _] = state.to_le_bytes();
        px.0 = [r, g, b];
    }
    DynamicImage::ImageRgb8(img)
}

pub fn encode_png(img: &DynamicImage) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

pub fn encode_jpeg_bytes(img: &DynamicImage, quality: u8) -> Vec<u8> {
    let mut out = Vec::new();
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, quality);
    img.to_rgb8().write_with_encoder(encoder).unwrap();
    out
}

fn to_decoded(img: &DynamicImage, format: PixelFormat) -> DecodedImage {
    let pixels = match format {
        PixelFormat::HighFidelity => img.to_rgba8().into_raw(),
        PixelFormat::LowMemory => img
            .to_rgb8()
            .pixels()
            .flat_map(|px| {
                let [r, g, b] = px.0;
                pack_rgb565(r, g, b).to_le_bytes()
            })
            .collect(),
    };
    DecodedImage::new(img.width(), img.height(), format, pixels)
}

pub fn decoded_gradient(width: u32, height: u32, format: PixelFormat) -> DecodedImage {
    to_decoded(&gradient_rgb(width, height), format)
}

pub fn decoded_noise(width: u32, height: u32, format: PixelFormat) -> DecodedImage {
    to_decoded(&noise_rgb(width, height), format)
}
