//! imgfit Core - bounded-memory image normalization
//!
//! This crate reads an image from bytes, a file, a content locator or a
//! bundled resource, decodes it at a power-of-two sample size that fits a
//! target box, and re-encodes it until the output fits a byte budget.
//!
//! The entry points are [`normalize_image`] for the common JPEG case and
//! [`Normalizer`] for PNG output, capabilities and diagnostics. The
//! [`decode`] and [`encode`] modules expose the individual stages.

pub mod decode;
pub mod encode;
mod normalize;
pub mod source;

#[cfg(test)]
mod test_support;

pub use decode::{
    compute_sample_size, Decode, DecodeConfig, DecodeError, DecodeLimits, DecodedImage,
    ImageBounds, PixelFormat, SourceDecoder,
};
pub use encode::{CompressionBudget, EncodeError};
pub use normalize::{normalize_image, NormalizeOptions, NormalizeOutcome, Normalizer, OutputFormat};
pub use source::{ImageSource, ImageStream, ResourceLookup, StreamOpener};
