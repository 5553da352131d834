//! Encoding of decoded pixels.
//!
//! This module provides:
//! - JPEG encoding at a fixed quality
//! - Lossless PNG encoding
//! - A quality-stepping compressor that searches for the largest quality
//!   whose output fits a byte budget
//!
//! # Examples
//!
//! ```ignore
//! use imgfit_core::encode::{compress, CompressionBudget};
//!
//! let result = compress(&decoded, &CompressionBudget::new(100_000)).unwrap();
//! println!("{} bytes at quality {:?}", result.bytes.len(), result.quality);
//! ```

mod compress;
mod error;
mod jpeg;
mod png;

pub use compress::{compress, compress_png, CompressionBudget, Compressed};
pub use error::EncodeError;
pub use jpeg::encode_jpeg;
pub use png::encode_png;
