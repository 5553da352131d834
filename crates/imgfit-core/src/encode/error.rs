use thiserror::Error;

/// Errors that can occur while encoding decoded pixels.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Pixel data length doesn't match the image dimensions and format
    #[error("Invalid pixel data: expected {expected} bytes, got {actual}")]
    InvalidPixelData { expected: usize, actual: usize },

    /// Width or height is zero
    #[error("Invalid dimensions: width ({width}) and height ({height}) must be non-zero")]
    InvalidDimensions { width: u32, height: u32 },

    /// The codec rejected the image
    #[error("Encoding failed: {0}")]
    EncodingFailed(String),
}
