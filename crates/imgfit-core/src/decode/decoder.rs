//! Full decoding of any [`ImageSource`] at a given sample size and pixel format.

use std::sync::Arc;

use image::{DynamicImage, ImageDecoder, ImageReader, Limits};

use super::capability::codec_enforces_limits;
use super::open::{open_source, SourceReader};
use super::orientation::{apply_orientation, read_orientation, Orientation};
use super::pixels::into_pixel_format;
use super::probe::probe_reader;
use super::resize::{resample, target_dimensions};
use super::{DecodeConfig, DecodeError, DecodeLimits, DecodedImage, ImageBounds};
use crate::source::{ImageSource, ResourceLookup};

/// The two operations the normalizer needs from a decoder.
///
/// [`SourceDecoder`] is the production implementation; tests substitute
/// decoders that fail on demand.
pub trait Decode {
    /// Read dimensions only.
    fn probe(
        &self,
        source: &ImageSource,
        density_override: Option<f32>,
        apply_orientation: bool,
    ) -> Result<ImageBounds, DecodeError>;

    /// Materialize pixels according to `config`.
    fn decode(&self, source: &ImageSource, config: &DecodeConfig)
        -> Result<DecodedImage, DecodeError>;
}

/// Decodes every source variant under the configured allocation limits.
#[derive(Clone, Default)]
pub struct SourceDecoder {
    limits: DecodeLimits,
    resources: Option<Arc<dyn ResourceLookup>>,
}

impl SourceDecoder {
    pub fn new(limits: DecodeLimits) -> Self {
        Self {
            limits,
            resources: None,
        }
    }

    /// Attach the capability used to resolve `ImageSource::ResourceId`.
    pub fn with_resources(mut self, resources: Arc<dyn ResourceLookup>) -> Self {
        self.resources = Some(resources);
        self
    }

    pub fn limits(&self) -> &DecodeLimits {
        &self.limits
    }

    fn open<'a>(&self, source: &'a ImageSource) -> Result<SourceReader<'a>, DecodeError> {
        open_source(source, self.resources.as_deref())
    }
}

impl std::fmt::Debug for SourceDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceDecoder")
            .field("limits", &self.limits)
            .field("resources", &self.resources.is_some())
            .finish()
    }
}

impl Decode for SourceDecoder {
    fn probe(
        &self,
        source: &ImageSource,
        density_override: Option<f32>,
        apply_orientation: bool,
    ) -> Result<ImageBounds, DecodeError> {
        let reader = self.open(source)?;
        probe_reader(reader, density_override, apply_orientation)
    }

    fn decode(
        &self,
        source: &ImageSource,
        config: &DecodeConfig,
    ) -> Result<DecodedImage, DecodeError> {
        let reader = self.open(source)?;
        decode_reader(reader, config, &self.limits)
    }
}

/// Decode in-memory bytes. Convenience for callers without capabilities.
pub fn decode_bytes(
    bytes: &[u8],
    config: &DecodeConfig,
    limits: &DecodeLimits,
) -> Result<DecodedImage, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::EmptySource);
    }
    decode_reader(Box::new(std::io::Cursor::new(bytes)), config, limits)
}

/// Decode an opened source. The reader is consumed and dropped before returning.
pub(crate) fn decode_reader(
    mut reader: SourceReader<'_>,
    config: &DecodeConfig,
    limits: &DecodeLimits,
) -> Result<DecodedImage, DecodeError> {
    let orientation = if config.apply_orientation {
        read_orientation(&mut reader).map_err(|e| DecodeError::UnreadableSource(e.to_string()))?
    } else {
        Orientation::Normal
    };

    let full = decode_full(reader, limits)?;
    let bounds = ImageBounds::new(full.width(), full.height());
    let (width, height) = target_dimensions(bounds, config.sample_size, config.density_override);
    let sampled = resample(full, width, height);
    let oriented = apply_orientation(sampled, orientation);

    let pixels = into_pixel_format(&oriented, config.pixel_format, limits)?;
    let decoded = DecodedImage::new(
        oriented.width(),
        oriented.height(),
        config.pixel_format,
        pixels,
    );

    log::debug!(
        "decoded {}x{} -> {}x{} (sample {}, {:?})",
        bounds.width,
        bounds.height,
        decoded.width,
        decoded.height,
        config.sample_size,
        config.pixel_format
    );
    Ok(decoded)
}

/// Run the codec at full resolution under `limits.max_source_alloc`.
///
/// The decoder's reported buffer size is checked against the ceiling first,
/// so the limit holds whether or not the codec enforces it.
fn decode_full(reader: SourceReader<'_>, limits: &DecodeLimits) -> Result<DynamicImage, DecodeError> {
    let mut image_reader = ImageReader::new(reader)
        .with_guessed_format()
        .map_err(|e| DecodeError::UnreadableSource(e.to_string()))?;
    if image_reader.format().is_none() {
        return Err(DecodeError::UnsupportedFormat(
            "unrecognized image signature".to_string(),
        ));
    }

    let mut codec_limits = Limits::default();
    codec_limits.max_alloc = limits.max_source_alloc;
    image_reader.limits(codec_limits);

    let decoder = image_reader
        .into_decoder()
        .map_err(DecodeError::from_image)?;

    if let Some(max) = limits.max_source_alloc {
        let required = decoder.total_bytes();
        if required > max {
            return Err(DecodeError::MemoryExhausted(format!(
                "decode needs {} bytes, limit is {} bytes",
                required, max
            )));
        }
        if !codec_enforces_limits() {
            log::debug!("codec ignores max_alloc, {} byte buffer pre-checked only", required);
        }
    }

    DynamicImage::from_decoder(decoder).map_err(DecodeError::from_image)
}
