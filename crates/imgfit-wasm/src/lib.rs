//! imgfit WASM - WebAssembly bindings for imgfit
//!
//! This crate exposes the byte-buffer flavour of the imgfit-core pipeline
//! to JavaScript/TypeScript.
//!
//! # Module Structure
//!
//! - `normalize` - Bounded-memory decode plus byte-budget compression
//! - `decode` - Header probing and sample-size computation
//! - `types` - WASM-compatible wrapper types for results
//! - `logger` - `log` backend writing to the browser console
//!
//! # Usage
//!
//! ```typescript
//! import init, { normalize_image, set_log_level } from '@imgfit/wasm';
//!
//! await init();
//! set_log_level('debug');
//!
//! const bytes = new Uint8Array(await file.arrayBuffer());
//! const result = normalize_image(bytes, 1280, 1280, 200_000, undefined);
//! console.log(`Normalized to ${result.byte_length} bytes`);
//! ```

use wasm_bindgen::prelude::*;

mod decode;
mod logger;
mod normalize;
mod types;

pub use decode::{compute_sample_size, probe_bounds};
pub use normalize::normalize_image;
pub use types::{JsBounds, JsNormalizeResult};

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {
    logger::install(log::LevelFilter::Info);
}

/// Change the console log level (`"off"`, `"error"`, ..., `"trace"`).
///
/// Unknown names select `"info"`.
#[wasm_bindgen]
pub fn set_log_level(level: &str) {
    logger::install(logger::parse_level(level));
}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
