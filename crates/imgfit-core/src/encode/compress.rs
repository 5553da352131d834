//! Quality-stepping compression toward a byte budget.

use serde::{Deserialize, Serialize};

use super::error::EncodeError;
use super::jpeg::{encode_rgb, validate};
use super::png::encode_png;
use crate::decode::DecodedImage;

/// Target size and quality schedule for [`compress`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionBudget {
    /// Largest acceptable encoded size in bytes.
    pub max_bytes: usize,
    /// Lowest quality the loop will try.
    pub floor_quality: u8,
    /// Quality decrement between attempts.
    pub step: u8,
}

impl Default for CompressionBudget {
    fn default() -> Self {
        Self {
            max_bytes: 100 * 1024,
            floor_quality: 10,
            step: 10,
        }
    }
}

impl CompressionBudget {
    pub fn new(max_bytes: usize) -> Self {
        Self {
            max_bytes,
            ..Default::default()
        }
    }

    /// Floor clamped into the codec's 1-100 range.
    pub fn effective_floor(&self) -> u8 {
        self.floor_quality.clamp(1, 100)
    }

    /// Step with zero treated as one.
    pub fn effective_step(&self) -> u8 {
        self.step.max(1)
    }

    /// Upper bound on the number of encodes [`compress`] performs.
    pub fn max_attempts(&self) -> usize {
        let span = (100 - self.effective_floor()) as usize;
        span.div_ceil(self.effective_step() as usize) + 1
    }
}

/// Output of a compression run.
#[derive(Debug, Clone)]
pub struct Compressed {
    /// Smallest encoding produced.
    pub bytes: Vec<u8>,
    /// Quality that produced `bytes`; `None` for lossless output.
    pub quality: Option<u8>,
    /// Whether `bytes` fits `max_bytes`.
    pub within_budget: bool,
    /// `(quality, encoded length)` for every encode, in order.
    pub attempts: Vec<(u8, usize)>,
}

/// Re-encode `image` as JPEG at decreasing quality until it fits `budget`.
///
/// Starts at quality 100 and steps down by `budget.step` while the result is
/// over `budget.max_bytes` and the quality is above the floor. The last step
/// lands exactly on the floor. The pixels are converted once and never
/// re-decoded. If the floor is reached while still over budget, the smallest
/// buffer produced is returned with `within_budget == false`.
pub fn compress(image: &DecodedImage, budget: &CompressionBudget) -> Result<Compressed, EncodeError> {
    validate(image)?;
    let rgb = image.to_rgb8_bytes();
    let floor = budget.effective_floor();
    let step = budget.effective_step();

    let mut quality = 100u8;
    let mut current = encode_rgb(&rgb, image.width, image.height, quality)?;
    let mut attempts = vec![(quality, current.len())];
    let mut best = (quality, current.clone());

    while current.len() > budget.max_bytes && quality > floor {
        quality = quality.saturating_sub(step).max(floor);
        current = encode_rgb(&rgb, image.width, image.height, quality)?;
        attempts.push((quality, current.len()));
        if current.len() <= best.1.len() {
            best = (quality, current.clone());
        }
    }

    let (quality, bytes) = best;
    let within_budget = bytes.len() <= budget.max_bytes;
    if !within_budget {
        log::warn!(
            "budget of {} bytes unreachable, returning {} bytes at quality {}",
            budget.max_bytes,
            bytes.len(),
            quality
        );
    }
    log::debug!(
        "compressed {}x{} in {} attempt(s): {} bytes at quality {}",
        image.width,
        image.height,
        attempts.len(),
        bytes.len(),
        quality
    );

    Ok(Compressed {
        bytes,
        quality: Some(quality),
        within_budget,
        attempts,
    })
}

/// Lossless single-pass variant: encode as PNG and report against the budget.
pub fn compress_png(image: &DecodedImage, budget: &CompressionBudget) -> Result<Compressed, EncodeError> {
    let bytes = encode_png(image)?;
    let within_budget = bytes.len() <= budget.max_bytes;
    if !within_budget {
        log::warn!(
            "PNG of {} bytes exceeds budget of {} bytes",
            bytes.len(),
            budget.max_bytes
        );
    }
    Ok(Compressed {
        attempts: vec![(100, bytes.len())],
        bytes,
        quality: None,
        within_budget,
    })
}


// ============================================================================
// Property-Based Tests
// ============================================================================
