//! Pixel buffer allocation and format packing.

use image::{DynamicImage, GenericImageView};

use super::{DecodeError, DecodeLimits, PixelFormat};

/// Pack an 8-bit RGB triple into RGB565.
#[inline]
pub(crate) fn pack_rgb565(r: u8, g: u8, b: u8) -> u16 {
    ((r as u16 & 0xF8) << 8) | ((g as u16 & 0xFC) << 3) | (b as u16 >> 3)
}

/// Expand RGB565 back to 8-bit RGB, replicating high bits into the low ones.
#[inline]
pub(crate) fn unpack_rgb565(value: u16) -> [u8; 3] {
    let r = ((value >> 11) & 0x1F) as u8;
    let g = ((value >> 5) & 0x3F) as u8;
    let b = (value & 0x1F) as u8;
    [(r << 3) | (r >> 2), (g << 2) | (g >> 4), (b << 3) | (b >> 2)]
}

/// Reserve an output buffer of `len` bytes without aborting on failure.
pub(crate) fn try_alloc(len: usize, limits: &DecodeLimits) -> Result<Vec<u8>, DecodeError> {
    if let Some(max) = limits.max_pixel_bytes {
        if len as u64 > max {
            return Err(DecodeError::MemoryExhausted(format!(
                "pixel buffer of {} bytes exceeds limit of {} bytes",
                len, max
            )));
        }
    }

    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(len)
        .map_err(|e| DecodeError::MemoryExhausted(e.to_string()))?;
    Ok(buffer)
}

/// Copy a decoded image into a freshly reserved buffer of the requested format.
pub(crate) fn into_pixel_format(
    img: &DynamicImage,
    format: PixelFormat,
    limits: &DecodeLimits,
) -> Result<Vec<u8>, DecodeError> {
    let (width, height) = img.dimensions();
    let len = format.buffer_len(width, height).ok_or_else(|| {
        DecodeError::MemoryExhausted(format!("{}x{} pixel buffer overflows", width, height))
    })?;

    let mut buffer = try_alloc(len, limits)?;
    match format {
        PixelFormat::HighFidelity => {
            for (_, _, px) in img.pixels() {
                buffer.extend_from_slice(&px.0);
            }
        }
        PixelFormat::LowMemory => {
            for (_, _, px) in img.pixels() {
                let [r, g, b, _] = px.0;
                buffer.extend_from_slice(&pack_rgb565(r, g, b).to_le_bytes());
            }
        }
    }

    debug_assert_eq!(buffer.len(), len);
    Ok(buffer)
}
