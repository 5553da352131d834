//! Bounded-memory image decoding.
//!
//! This module provides functionality for:
//! - Probing image dimensions from headers only
//! - Choosing a power-of-two sample size for a target box
//! - Decoding any [`ImageSource`](crate::source::ImageSource) at a sample size
//!   and pixel format, under allocation limits
//!
//! # Memory Strategy
//!
//! Peak memory is bounded three ways:
//! - **Codec ceiling**: the decoder's full-resolution buffer size is checked
//!   against `DecodeLimits::max_source_alloc` before decoding, and the codec
//!   also runs under `image::Limits::max_alloc`
//! - **Sampling**: the full-resolution image is dropped as soon as it has been
//!   resampled to the sampled size
//! - **Output ceiling**: the output buffer is reserved fallibly and checked
//!   against `DecodeLimits::max_pixel_bytes`
//!
//! Any of these failing yields `DecodeError::MemoryExhausted`, which callers
//! may answer by retrying with `PixelFormat::LowMemory`. Only the output
//! ceiling depends on the pixel format: the codec decodes at full resolution
//! in its native layout, so a `max_source_alloc` breach fails the same way
//! on retry.
//!
//! # Examples
//!
//! ```ignore
//! use imgfit_core::decode::{compute_sample_size, decode_bytes, probe_bytes};
//! use imgfit_core::decode::{DecodeConfig, DecodeLimits, PixelFormat};
//!
//! let bytes = std::fs::read("photo.jpg").unwrap();
//! let bounds = probe_bytes(&bytes, None).unwrap();
//! let sample = compute_sample_size(bounds, 800, 600);
//! let config = DecodeConfig::new(sample, PixelFormat::HighFidelity);
//! let image = decode_bytes(&bytes, &config, &DecodeLimits::default()).unwrap();
//! println!("Decoded {}x{} image", image.width, image.height);
//! ```

mod capability;
mod decoder;
mod open;
mod orientation;
pub(crate) mod pixels;
mod probe;
mod resize;
mod sample;
mod types;

pub use capability::codec_enforces_limits;
pub use decoder::{decode_bytes, Decode, SourceDecoder};
pub use orientation::Orientation;
pub use probe::{probe_bounds, probe_bytes};
pub use resize::{scale_decoded, target_dimensions};
pub use sample::{compute_sample_size, sampled_dimensions};
pub use types::{DecodeConfig, DecodeError, DecodeLimits, DecodedImage, ImageBounds, PixelFormat};
