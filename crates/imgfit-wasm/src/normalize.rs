//! Normalization binding.
//!
//! ```typescript
//! import { normalize_image } from '@imgfit/wasm';
//!
//! const result = normalize_image(bytes, 800, 600, 100_000, { output: 'jpeg' });
//! const blob = new Blob([result.bytes()], { type: 'image/jpeg' });
//! console.log(`${result.width}x${result.height} at quality ${result.quality}`);
//! ```

use crate::types::JsNormalizeResult;
use imgfit_core::{CompressionBudget, DecodeError, ImageSource, NormalizeOptions, Normalizer};
use wasm_bindgen::prelude::*;

/// Decode `bytes` at a sample size fitting `target_width x target_height`
/// and re-encode until the output is at most `max_bytes`.
///
/// `options` is an optional object with any of `output` (`"jpeg"` or
/// `"png"`), `density_override`, `apply_orientation`, `dimension_fallback`
/// and `limits`. Missing fields take their defaults.
///
/// # Errors
///
/// Returns an error if the options are malformed, the target is zero,
/// the bytes are empty or undecodable, or decoding runs out of memory twice.
#[wasm_bindgen]
pub fn normalize_image(
    bytes: &[u8],
    target_width: u32,
    target_height: u32,
    max_bytes: u32,
    options: JsValue,
) -> Result<JsNormalizeResult, JsValue> {
    let options = parse_options(options)?;
    normalize_bytes(bytes, target_width, target_height, max_bytes as usize, options)
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

fn parse_options(value: JsValue) -> Result<NormalizeOptions, JsValue> {
    if value.is_undefined() || value.is_null() {
        return Ok(NormalizeOptions::default());
    }
    serde_wasm_bindgen::from_value(value)
        .map_err(|e| JsValue::from_str(&format!("Invalid options: {}", e)))
}

pub(crate) fn normalize_bytes(
    bytes: &[u8],
    target_width: u32,
    target_height: u32,
    max_bytes: usize,
    options: NormalizeOptions,
) -> Result<JsNormalizeResult, DecodeError> {
    let source = ImageSource::bytes(bytes);
    Normalizer::new(options)
        .run(&source, target_width, target_height, &CompressionBudget::new(max_bytes))
        .map(JsNormalizeResult::from)
}
