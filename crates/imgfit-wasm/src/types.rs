//! WASM-compatible wrapper types for pipeline results.
//!
//! These wrap core types so JavaScript gets plain getters instead of
//! serialized objects.

use imgfit_core::{ImageBounds, NormalizeOutcome, PixelFormat};
use wasm_bindgen::prelude::*;

/// Image dimensions returned by `probe_bounds`.
#[wasm_bindgen]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JsBounds {
    width: u32,
    height: u32,
}

#[wasm_bindgen]
impl JsBounds {
    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.height
    }
}

impl From<ImageBounds> for JsBounds {
    fn from(bounds: ImageBounds) -> Self {
        Self {
            width: bounds.width,
            height: bounds.height,
        }
    }
}

/// Encoded output of `normalize_image` plus diagnostics.
///
/// # Memory Management
///
/// The encoded bytes live in WASM memory. `bytes()` copies them into a
/// `Uint8Array`; call the generated `free()` afterwards to release the WASM
/// copy early.
#[wasm_bindgen]
pub struct JsNormalizeResult {
    bytes: Vec<u8>,
    width: u32,
    height: u32,
    sample_size: u32,
    quality: Option<u8>,
    decode_attempts: u32,
    within_budget: bool,
    low_memory: bool,
}

#[wasm_bindgen]
impl JsNormalizeResult {
    /// Copy of the encoded image bytes.
    pub fn bytes(&self) -> Vec<u8> {
        self.bytes.clone()
    }

    #[wasm_bindgen(getter)]
    pub fn byte_length(&self) -> usize {
        self.bytes.len()
    }

    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[wasm_bindgen(getter)]
    pub fn sample_size(&self) -> u32 {
        self.sample_size
    }

    /// JPEG quality used, or `undefined` for PNG output.
    #[wasm_bindgen(getter)]
    pub fn quality(&self) -> Option<u8> {
        self.quality
    }

    /// 2 when the first decode ran out of memory and was retried.
    #[wasm_bindgen(getter)]
    pub fn decode_attempts(&self) -> u32 {
        self.decode_attempts
    }

    #[wasm_bindgen(getter)]
    pub fn within_budget(&self) -> bool {
        self.within_budget
    }

    /// True if the pixels were decoded as RGB565.
    #[wasm_bindgen(getter)]
    pub fn low_memory(&self) -> bool {
        self.low_memory
    }
}

impl From<NormalizeOutcome> for JsNormalizeResult {
    fn from(outcome: NormalizeOutcome) -> Self {
        Self {
            low_memory: outcome.pixel_format == PixelFormat::LowMemory,
            bytes: outcome.bytes,
            width: outcome.width,
            height: outcome.height,
            sample_size: outcome.sample_size,
            quality: outcome.quality,
            decode_attempts: outcome.decode_attempts,
            within_budget: outcome.within_budget,
        }
    }
}
