//! Probing and sizing bindings.
//!
//! # Functions
//!
//! - [`probe_bounds`] - Read image dimensions from the header only
//! - [`compute_sample_size`] - Power-of-two downsample factor for a target box
//!
//! # Example
//!
//! ```typescript
//! import { probe_bounds, compute_sample_size } from '@imgfit/wasm';
//!
//! const bounds = probe_bounds(bytes, undefined);
//! const sample = compute_sample_size(bounds.width, bounds.height, 800, 600);
//! ```

use crate::types::JsBounds;
use imgfit_core::{decode, ImageBounds};
use wasm_bindgen::prelude::*;

/// Read the dimensions of an encoded image without decoding its pixels.
///
/// `density_override` scales the reported bounds by `1 / d`.
///
/// # Errors
///
/// Returns an error if the bytes are empty or not a supported image.
#[wasm_bindgen]
pub fn probe_bounds(bytes: &[u8], density_override: Option<f32>) -> Result<JsBounds, JsValue> {
    decode::probe_bytes(bytes, density_override)
        .map(JsBounds::from)
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Downsample factor that brings `width x height` close to the target box.
///
/// Returns 1 when the image already fits.
#[wasm_bindgen]
pub fn compute_sample_size(width: u32, height: u32, target_width: u32, target_height: u32) -> u32 {
    decode::compute_sample_size(ImageBounds::new(width, height), target_width, target_height)
}
