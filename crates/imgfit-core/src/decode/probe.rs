//! Header-only dimension probing.

use image::ImageReader;

use super::open::{open_source, SourceReader};
use super::orientation::read_orientation;
use super::types::{density_scale, scale_dimension};
use super::{DecodeError, ImageBounds};
use crate::source::{ImageSource, ResourceLookup};

/// Probe the dimensions of `source` without decoding pixel data.
///
/// The reported bounds account for the density override and, when
/// requested, for an EXIF orientation that swaps the axes.
///
/// # Errors
///
/// * `EmptySource` - the source carries no data
/// * `UnreadableSource` - the source could not be opened
/// * `UnsupportedFormat` - the header could not be parsed
pub fn probe_bounds(
    source: &ImageSource,
    density_override: Option<f32>,
    apply_orientation: bool,
    resources: Option<&dyn ResourceLookup>,
) -> Result<ImageBounds, DecodeError> {
    let reader = open_source(source, resources)?;
    probe_reader(reader, density_override, apply_orientation)
}

/// Probe in-memory bytes. Convenience for callers without capabilities.
pub fn probe_bytes(bytes: &[u8], density_override: Option<f32>) -> Result<ImageBounds, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::EmptySource);
    }
    probe_reader(
        Box::new(std::io::Cursor::new(bytes)),
        density_override,
        false,
    )
}

pub(crate) fn probe_reader(
    mut reader: SourceReader<'_>,
    density_override: Option<f32>,
    apply_orientation: bool,
) -> Result<ImageBounds, DecodeError> {
    let swaps = if apply_orientation {
        read_orientation(&mut reader)
            .map_err(|e| DecodeError::UnreadableSource(e.to_string()))?
            .swaps_dimensions()
    } else {
        false
    };

    let image_reader = ImageReader::new(reader)
        .with_guessed_format()
        .map_err(|e| DecodeError::UnreadableSource(e.to_string()))?;
    if image_reader.format().is_none() {
        return Err(DecodeError::UnsupportedFormat(
            "unrecognized image signature".to_string(),
        ));
    }

    let (width, height) = image_reader
        .into_dimensions()
        .map_err(|e| DecodeError::UnsupportedFormat(e.to_string()))?;

    let mut bounds = match density_scale(density_override) {
        Some(scale) => ImageBounds::new(scale_dimension(width, scale), scale_dimension(height, scale)),
        None => ImageBounds::new(width, height),
    };
    if swaps {
        bounds = bounds.swapped();
    }

    log::debug!(
        "probed {}x{} (density {:?}, swapped {})",
        bounds.width,
        bounds.height,
        density_override,
        swaps
    );
    Ok(bounds)
}
