//! Resampling helpers for sample-size, density and budget scaling.
//!
//! All functions return new images without modifying the input.

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};

use super::pixels::into_pixel_format;
use super::sample::sampled_dimensions;
use super::types::{density_scale, scale_dimension};
use super::{DecodeError, DecodeLimits, DecodedImage, ImageBounds};

/// Final dimensions for a decode of `bounds` at `sample_size` and density override.
pub fn target_dimensions(
    bounds: ImageBounds,
    sample_size: u32,
    density_override: Option<f32>,
) -> (u32, u32) {
    let (width, height) = sampled_dimensions(bounds, sample_size);
    match density_scale(density_override) {
        Some(scale) => (scale_dimension(width, scale), scale_dimension(height, scale)),
        None => (width, height),
    }
}

/// Resample to exact dimensions.
///
/// Shrinking uses the box-averaging thumbnail path, which is how a
/// sampled decode behaves; enlarging (density < 1) uses bilinear.
pub(crate) fn resample(img: DynamicImage, width: u32, height: u32) -> DynamicImage {
    let (src_width, src_height) = img.dimensions();
    if src_width == width && src_height == height {
        return img;
    }

    if width <= src_width && height <= src_height {
        img.thumbnail_exact(width, height)
    } else {
        img.resize_exact(width, height, FilterType::Triangle)
    }
}

/// Scale a decoded image by `scale`, keeping its pixel format.
///
/// Used when quality reduction alone cannot reach the byte budget.
pub fn scale_decoded(
    image: &DecodedImage,
    scale: f64,
    limits: &DecodeLimits,
) -> Result<DecodedImage, DecodeError> {
    if !scale.is_finite() || scale <= 0.0 {
        return Err(DecodeError::InvalidTarget {
            width: 0,
            height: 0,
        });
    }

    let width = scale_dimension(image.width, scale);
    let height = scale_dimension(image.height, scale);
    if width == image.width && height == image.height {
        return Ok(image.clone());
    }

    let dynamic = image.to_dynamic().ok_or_else(|| {
        DecodeError::UnsupportedFormat("pixel buffer does not match dimensions".to_string())
    })?;
    let resized = resample(dynamic, width, height);
    let pixels = into_pixel_format(&resized, image.pixel_format, limits)?;

    Ok(DecodedImage::new(width, height, image.pixel_format, pixels))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::PixelFormat;

    fn create_test_image(width: u32, height: u32) -> DynamicImage {
        let mut img = image::RgbImage::new(width, height);
        for (x, y, px) in img.enumerate_pixels_mut() {
            *px = image::Rgb([
                ((x * 255) / width.max(1)) as u8,
                ((y * 255) / height.max(1)) as u8,
                128,
            ]);
        }
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn test_target_dimensions_sample_only() {
        let bounds = ImageBounds::new(4000, 3000);
        assert_eq!(target_dimensions(bounds, 4, None), (1000, 750));
        assert_eq!(target_dimensions(bounds, 1, None), (4000, 3000));
    }

    #[test]
    fn test_target_dimensions_with_density() {
        let bounds = ImageBounds::new(4000, 3000);
        assert_eq!(target_dimensions(bounds, 4, Some(2.0)), (500, 375));
        assert_eq!(target_dimensions(bounds, 4, Some(0.0)), (1000, 750));
        assert_eq!(target_dimensions(bounds, 4, Some(0.5)), (2000, 1500));
    }

    #[test]
    fn test_resample_same_dimensions() {
        let resized = resample(create_test_image(100, 50), 100, 50);
        assert_eq!(resized.dimensions(), (100, 50));
    }

    #[test]
    fn test_resample_shrink_and_grow() {
        assert_eq!(resample(create_test_image(100, 50), 25, 13).dimensions(), (25, 13));
        assert_eq!(resample(create_test_image(10, 10), 20, 20).dimensions(), (20, 20));
    }

    #[test]
    fn test_scale_decoded_keeps_format() {
        let image = DecodedImage::new(40, 20, PixelFormat::LowMemory, vec![0u8; 40 * 20 * 2]);
        let scaled = scale_decoded(&image, 0.5, &DecodeLimits::default()).unwrap();

        assert_eq!((scaled.width, scaled.height), (20, 10));
        assert_eq!(scaled.pixel_format, PixelFormat::LowMemory);
        assert_eq!(scaled.pixels.len(), 20 * 10 * 2);
    }

    #[test]
    fn test_scale_decoded_rejects_bad_scale() {
        let image = DecodedImage::new(4, 4, PixelFormat::HighFidelity, vec![0u8; 64]);
        assert!(scale_decoded(&image, 0.0, &DecodeLimits::default()).is_err());
        assert!(scale_decoded(&image, f64::NAN, &DecodeLimits::default()).is_err());
    }
}
