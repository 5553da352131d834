//! Probe, size, decode and compress an image source in one bounded-memory call.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::decode::{
    compute_sample_size, scale_decoded, Decode, DecodeConfig, DecodeError, DecodeLimits,
    DecodedImage, PixelFormat, SourceDecoder,
};
use crate::encode::{compress, compress_png, Compressed, CompressionBudget};
use crate::source::{ImageSource, ResourceLookup};

/// Encoding used for the normalized output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Lossy, quality-stepped toward the byte budget.
    #[default]
    Jpeg,
    /// Lossless, single pass.
    Png,
}

/// Knobs for [`Normalizer`]. Every field has a default, so partial JSON works.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeOptions {
    pub output: OutputFormat,
    /// Declared density multiplier of the source (`160 * d` dpi).
    pub density_override: Option<f32>,
    /// Honour the EXIF orientation tag.
    pub apply_orientation: bool,
    /// Shrink dimensions once when quality alone cannot reach the budget.
    pub dimension_fallback: bool,
    pub limits: DecodeLimits,
}

/// Result of a successful [`Normalizer::run`].
#[derive(Debug, Clone)]
pub struct NormalizeOutcome {
    /// Encoded output.
    pub bytes: Vec<u8>,
    /// Dimensions of the encoded image.
    pub width: u32,
    pub height: u32,
    /// Sample size used for the decode.
    pub sample_size: u32,
    /// Pixel format of the decode that succeeded.
    pub pixel_format: PixelFormat,
    /// JPEG quality of `bytes`; `None` for PNG.
    pub quality: Option<u8>,
    /// 1, or 2 when the decode was retried with `LowMemory`.
    pub decode_attempts: u32,
    /// False when the budget could not be met.
    pub within_budget: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NormalizeState {
    Probing,
    SizingDecided,
    Decoding,
    DecodeFailed,
    Decoded,
    Compressing,
    Done,
}

fn enter(state: &mut NormalizeState, next: NormalizeState) {
    log::debug!("normalize: {:?} -> {:?}", state, next);
    *state = next;
}

/// Runs the probe / sample / decode / compress pipeline with a single
/// `LowMemory` retry when the first decode runs out of memory.
#[derive(Debug, Clone)]
pub struct Normalizer<D = SourceDecoder> {
    decoder: D,
    options: NormalizeOptions,
}

impl Normalizer<SourceDecoder> {
    pub fn new(options: NormalizeOptions) -> Self {
        Self {
            decoder: SourceDecoder::new(options.limits.clone()),
            options,
        }
    }

    /// Allow `ImageSource::ResourceId` sources to be resolved.
    pub fn with_resources(mut self, resources: Arc<dyn ResourceLookup>) -> Self {
        self.decoder = self.decoder.with_resources(resources);
        self
    }
}

impl Default for Normalizer<SourceDecoder> {
    fn default() -> Self {
        Self::new(NormalizeOptions::default())
    }
}

impl<D: Decode> Normalizer<D> {
    pub fn with_decoder(decoder: D, options: NormalizeOptions) -> Self {
        Self { decoder, options }
    }

    pub fn options(&self) -> &NormalizeOptions {
        &self.options
    }

    /// Normalize `source` to fit `target_width x target_height` and `budget`.
    ///
    /// # Errors
    ///
    /// * `InvalidTarget` - a target dimension is zero (checked before probing)
    /// * `EmptySource` - the source is empty (checked before probing)
    /// * any probe or decode error; `MemoryExhausted` only if the
    ///   `LowMemory` retry also ran out of memory
    /// * `Encode` - the compressor rejected the decoded image
    pub fn run(
        &self,
        source: &ImageSource,
        target_width: u32,
        target_height: u32,
        budget: &CompressionBudget,
    ) -> Result<NormalizeOutcome, DecodeError> {
        let mut state = NormalizeState::Probing;
        let result = self.run_states(source, target_width, target_height, budget, &mut state);
        if let Err(e) = &result {
            log::debug!("normalize: {:?} -> Failed ({})", state, e);
        }
        result
    }

    fn run_states(
        &self,
        source: &ImageSource,
        target_width: u32,
        target_height: u32,
        budget: &CompressionBudget,
        state: &mut NormalizeState,
    ) -> Result<NormalizeOutcome, DecodeError> {
        if target_width == 0 || target_height == 0 {
            return Err(DecodeError::InvalidTarget {
                width: target_width,
                height: target_height,
            });
        }
        if source.is_empty() {
            return Err(DecodeError::EmptySource);
        }

        let bounds = self.decoder.probe(
            source,
            self.options.density_override,
            self.options.apply_orientation,
        )?;
        let sample_size = compute_sample_size(bounds, target_width, target_height);
        log::debug!(
            "{} source {}x{} -> sample size {} for {}x{}",
            source.kind(),
            bounds.width,
            bounds.height,
            sample_size,
            target_width,
            target_height
        );
        enter(state, NormalizeState::SizingDecided);

        let config = DecodeConfig {
            sample_size,
            pixel_format: PixelFormat::HighFidelity,
            density_override: self.options.density_override,
            apply_orientation: self.options.apply_orientation,
        };
        enter(state, NormalizeState::Decoding);
        let (image, decode_attempts) = match self.decoder.decode(source, &config) {
            Ok(image) => (image, 1),
            Err(e) if e.is_memory_exhausted() => {
                enter(state, NormalizeState::DecodeFailed);
                log::warn!("decode out of memory ({}), retrying with LowMemory", e);
                let retry = config.with_pixel_format(PixelFormat::LowMemory);
                (self.decoder.decode(source, &retry)?, 2)
            }
            Err(e) => return Err(e),
        };
        enter(state, NormalizeState::Decoded);

        enter(state, NormalizeState::Compressing);
        let (image, compressed) = self.compress_with_fallback(image, budget)?;
        enter(state, NormalizeState::Done);

        Ok(NormalizeOutcome {
            bytes: compressed.bytes,
            width: image.width,
            height: image.height,
            sample_size,
            pixel_format: image.pixel_format,
            quality: compressed.quality,
            decode_attempts,
            within_budget: compressed.within_budget,
        })
    }

    fn encode(&self, image: &DecodedImage, budget: &CompressionBudget) -> Result<Compressed, DecodeError> {
        let compressed = match self.options.output {
            OutputFormat::Jpeg => compress(image, budget)?,
            OutputFormat::Png => compress_png(image, budget)?,
        };
        Ok(compressed)
    }

    /// Compress, then shrink once and compress again if enabled and still
    /// over budget. The smaller output wins.
    fn compress_with_fallback(
        &self,
        image: DecodedImage,
        budget: &CompressionBudget,
    ) -> Result<(DecodedImage, Compressed), DecodeError> {
        let first = self.encode(&image, budget)?;
        if first.within_budget || !self.options.dimension_fallback || budget.max_bytes == 0 {
            return Ok((image, first));
        }

        let scale = (budget.max_bytes as f64 / first.bytes.len() as f64).sqrt();
        let smaller = match scale_decoded(&image, scale, &self.options.limits) {
            Ok(smaller) => smaller,
            Err(e) => {
                log::warn!("dimension fallback skipped: {}", e);
                return Ok((image, first));
            }
        };
        let second = self.encode(&smaller, budget)?;
        log::debug!(
            "dimension fallback {}x{} -> {}x{}: {} -> {} bytes",
            image.width,
            image.height,
            smaller.width,
            smaller.height,
            first.bytes.len(),
            second.bytes.len()
        );

        if second.bytes.len() < first.bytes.len() {
            Ok((smaller, second))
        } else {
            Ok((image, first))
        }
    }
}

/// Normalize `source` to JPEG bytes within `budget`, using default limits.
///
/// Convenience over [`Normalizer`] for the common case.
pub fn normalize_image(
    source: ImageSource,
    target_width: u32,
    target_height: u32,
    budget: CompressionBudget,
    density_override: Option<f32>,
) -> Result<Vec<u8>, DecodeError> {
    let normalizer = Normalizer::new(NormalizeOptions {
        density_override,
        ..Default::default()
    });
    normalizer
        .run(&source, target_width, target_height, &budget)
        .map(|outcome| outcome.bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::{sampled_dimensions, ImageBounds};
    use crate::source::{ImageStream, StreamOpener};
    use crate::test_support::{decoded_gradient, encode_png, gradient_rgb, noise_rgb};
    use std::cell::{Cell, RefCell};
    use std::io;

    /// Decoder that reports fixed bounds and fails on demand.
    struct ScriptedDecoder {
        bounds: ImageBounds,
        fail_high: Option<fn() -> DecodeError>,
        fail_low: Option<fn() -> DecodeError>,
        probes: Cell<usize>,
        configs: RefCell<Vec<DecodeConfig>>,
    }

    impl ScriptedDecoder {
        fn new(width: u32, height: u32) -> Self {
            Self {
                bounds: ImageBounds::new(width, height),
                fail_high: None,
                fail_low: None,
                probes: Cell::new(0),
                configs: RefCell::new(Vec::new()),
            }
        }
    }

    fn out_of_memory() -> DecodeError {
        DecodeError::MemoryExhausted("scripted".to_string())
    }

    fn bad_format() -> DecodeError {
        DecodeError::UnsupportedFormat("scripted".to_string())
    }

    impl Decode for ScriptedDecoder {
        fn probe(&self, _: &ImageSource, _: Option<f32>, _: bool) -> Result<ImageBounds, DecodeError> {
            self.probes.set(self.probes.get() + 1);
            Ok(self.bounds)
        }

        fn decode(&self, _: &ImageSource, config: &DecodeConfig) -> Result<DecodedImage, DecodeError> {
            self.configs.borrow_mut().push(*config);
            let failure = match config.pixel_format {
                PixelFormat::HighFidelity => self.fail_high,
                PixelFormat::LowMemory => self.fail_low,
            };
            if let Some(make_error) = failure {
                return Err(make_error());
            }
            let (width, height) = sampled_dimensions(self.bounds, config.sample_size);
            Ok(decoded_gradient(width, height, config.pixel_format))
        }
    }

    struct NoopOpener;

    impl StreamOpener for NoopOpener {
        fn open(&self, _locator: &str) -> io::Result<Box<dyn ImageStream>> {
            Ok(Box::new(io::Cursor::new(Vec::new())))
        }
    }

    fn any_source() -> ImageSource {
        ImageSource::bytes(vec![1u8])
    }

    #[test]
    fn test_single_decode_when_memory_suffices() {
        let decoder = ScriptedDecoder::new(4000, 3000);
        let normalizer = Normalizer::with_decoder(decoder, NormalizeOptions::default());
        let outcome = normalizer
            .run(&any_source(), 800, 600, &CompressionBudget::new(1_000_000))
            .unwrap();

        assert_eq!(outcome.sample_size, 4);
        assert_eq!((outcome.width, outcome.height), (1000, 750));
        assert_eq!(outcome.decode_attempts, 1);
        assert_eq!(outcome.pixel_format, PixelFormat::HighFidelity);

        let configs = normalizer.decoder.configs.borrow();
        assert_eq!(configs.len(), 1);
        assert_eq!(normalizer.decoder.probes.get(), 1);
    }

    #[test]
    fn test_memory_exhausted_retries_once_with_low_memory() {
        let mut decoder = ScriptedDecoder::new(1600, 1200);
        decoder.fail_high = Some(out_of_memory);
        let normalizer = Normalizer::with_decoder(decoder, NormalizeOptions::default());

        let outcome = normalizer
            .run(&any_source(), 400, 300, &CompressionBudget::default())
            .unwrap();
        assert_eq!(outcome.decode_attempts, 2);
        assert_eq!(outcome.pixel_format, PixelFormat::LowMemory);

        let configs = normalizer.decoder.configs.borrow();
        assert_eq!(configs.len(), 2);
        assert_eq!(configs[0].pixel_format, PixelFormat::HighFidelity);
        assert_eq!(configs[1].pixel_format, PixelFormat::LowMemory);
        assert_eq!(configs[0].sample_size, configs[1].sample_size);
    }

    #[test]
    fn test_no_second_retry() {
        let mut decoder = ScriptedDecoder::new(100, 100);
        decoder.fail_high = Some(out_of_memory);
        decoder.fail_low = Some(out_of_memory);
        let normalizer = Normalizer::with_decoder(decoder, NormalizeOptions::default());

        let result = normalizer.run(&any_source(), 50, 50, &CompressionBudget::default());
        assert!(matches!(result, Err(DecodeError::MemoryExhausted(_))));
        assert_eq!(normalizer.decoder.configs.borrow().len(), 2);
    }

    #[test]
    fn test_other_errors_are_not_retried() {
        let mut decoder = ScriptedDecoder::new(100, 100);
        decoder.fail_high = Some(bad_format);
        let normalizer = Normalizer::with_decoder(decoder, NormalizeOptions::default());

        let result = normalizer.run(&any_source(), 50, 50, &CompressionBudget::default());
        assert!(matches!(result, Err(DecodeError::UnsupportedFormat(_))));
        assert_eq!(normalizer.decoder.configs.borrow().len(), 1);
    }

    #[test]
    fn test_zero_target_rejected_before_probe() {
        let normalizer =
            Normalizer::with_decoder(ScriptedDecoder::new(10, 10), NormalizeOptions::default());

        for (w, h) in [(0, 600), (800, 0), (0, 0)] {
            let result = normalizer.run(&any_source(), w, h, &CompressionBudget::default());
            assert!(matches!(
                result,
                Err(DecodeError::InvalidTarget { width, height }) if width == w && height == h
            ));
        }
        assert_eq!(normalizer.decoder.probes.get(), 0);
    }

    #[test]
    fn test_empty_sources_never_reach_decoder() {
        let normalizer =
            Normalizer::with_decoder(ScriptedDecoder::new(10, 10), NormalizeOptions::default());
        let sources = [
            ImageSource::bytes(Vec::new()),
            ImageSource::path(""),
            ImageSource::locator("", Arc::new(NoopOpener)),
            ImageSource::ResourceId(0),
            ImageSource::ResourceId(-3),
        ];

        for source in &sources {
            let result = normalizer.run(source, 10, 10, &CompressionBudget::default());
            assert!(matches!(result, Err(DecodeError::EmptySource)), "{:?}", source);
        }
        assert_eq!(normalizer.decoder.probes.get(), 0);
        assert!(normalizer.decoder.configs.borrow().is_empty());
    }

    #[test]
    fn test_options_forwarded_to_decoder() {
        let options = NormalizeOptions {
            density_override: Some(2.0),
            apply_orientation: true,
            ..Default::default()
        };
        let normalizer = Normalizer::with_decoder(ScriptedDecoder::new(64, 64), options);
        normalizer
            .run(&any_source(), 64, 64, &CompressionBudget::default())
            .unwrap();

        let config = normalizer.decoder.configs.borrow()[0];
        assert_eq!(config.density_override, Some(2.0));
        assert!(config.apply_orientation);
        assert_eq!(config.sample_size, 1);
    }

    #[test]
    fn test_pixel_ceiling_triggers_real_retry() {
        let png = encode_png(&gradient_rgb(10, 10));
        let options = NormalizeOptions {
            limits: DecodeLimits {
                max_pixel_bytes: Some(250),
                ..DecodeLimits::default()
            },
            ..Default::default()
        };

        let outcome = Normalizer::new(options)
            .run(&ImageSource::bytes(png), 10, 10, &CompressionBudget::default())
            .unwrap();
        assert_eq!(outcome.decode_attempts, 2);
        assert_eq!(outcome.pixel_format, PixelFormat::LowMemory);
        assert_eq!((outcome.width, outcome.height), (10, 10));
    }

    /// Serves one image and counts how many times it was opened.
    struct CountingOpener {
        bytes: Vec<u8>,
        opens: std::sync::atomic::AtomicUsize,
    }

    impl StreamOpener for CountingOpener {
        fn open(&self, _locator: &str) -> io::Result<Box<dyn ImageStream>> {
            self.opens.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(Box::new(io::Cursor::new(self.bytes.clone())))
        }
    }

    #[test]
    fn test_source_ceiling_fails_after_one_retry() {
        let opener = Arc::new(CountingOpener {
            bytes: encode_png(&gradient_rgb(64, 64)),
            opens: std::sync::atomic::AtomicUsize::new(0),
        });
        let options = NormalizeOptions {
            limits: DecodeLimits {
                max_source_alloc: Some(1024),
                max_pixel_bytes: None,
            },
            ..Default::default()
        };
        let source = ImageSource::locator("content://photo", opener.clone());

        let result = Normalizer::new(options).run(&source, 16, 16, &CompressionBudget::default());
        assert!(matches!(result, Err(DecodeError::MemoryExhausted(_))));
        // One probe, then the first decode and its single LowMemory retry
        assert_eq!(opener.opens.load(std::sync::atomic::Ordering::SeqCst), 3);
    }

    #[test]
    fn test_png_output() {
        let png = encode_png(&gradient_rgb(32, 32));
        let options = NormalizeOptions {
            output: OutputFormat::Png,
            ..Default::default()
        };

        let outcome = Normalizer::new(options)
            .run(&ImageSource::bytes(png), 8, 8, &CompressionBudget::default())
            .unwrap();
        assert_eq!(&outcome.bytes[1..4], b"PNG");
        assert_eq!(outcome.quality, None);
        assert_eq!(outcome.sample_size, 2);
    }

    #[test]
    fn test_dimension_fallback_shrinks_output() {
        let png = encode_png(&noise_rgb(128, 128));
        let source = ImageSource::bytes(png);
        let budget = CompressionBudget::new(500);

        let plain = Normalizer::default().run(&source, 128, 128, &budget).unwrap();
        assert!(!plain.within_budget);
        assert_eq!((plain.width, plain.height), (128, 128));

        let options = NormalizeOptions {
            dimension_fallback: true,
            ..Default::default()
        };
        let shrunk = Normalizer::new(options).run(&source, 128, 128, &budget).unwrap();
        assert!(shrunk.width < 128 && shrunk.height < 128);
        assert!(shrunk.bytes.len() < plain.bytes.len());
    }

    #[test]
    fn test_dimension_fallback_skipped_for_zero_budget() {
        let png = encode_png(&noise_rgb(32, 32));
        let options = NormalizeOptions {
            dimension_fallback: true,
            ..Default::default()
        };
        let outcome = Normalizer::new(options)
            .run(&ImageSource::bytes(png), 32, 32, &CompressionBudget::new(0))
            .unwrap();
        assert_eq!((outcome.width, outcome.height), (32, 32));
        assert!(!outcome.within_budget);
    }

    #[test]
    fn test_options_from_partial_json() {
        let options: NormalizeOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options, NormalizeOptions::default());

        let options: NormalizeOptions =
            serde_json::from_str(r#"{"output": "png", "dimension_fallback": true}"#).unwrap();
        assert_eq!(options.output, OutputFormat::Png);
        assert!(options.dimension_fallback);
        assert_eq!(options.limits, DecodeLimits::default());
    }

    #[test]
    fn test_normalize_image_empty_bytes() {
        let result = normalize_image(
            ImageSource::bytes(Vec::new()),
            800,
            600,
            CompressionBudget::new(100_000),
            None,
        );
        assert!(matches!(result, Err(DecodeError::EmptySource)));
    }
}
