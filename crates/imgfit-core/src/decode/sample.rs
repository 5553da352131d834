//! Power-of-two downsample factor selection.

use super::ImageBounds;

/// Largest factor the search is allowed to reach.
const MAX_SAMPLE_SIZE: u32 = 1 << 31;

/// Compute the power-of-two sample size for decoding `bounds` toward a target box.
///
/// Returns 1 when the image already fits. Otherwise the factor is doubled
/// while both half-dimensions, divided by the factor, stay above the target,
/// and the factor the search stops on is returned.
///
/// # Example
///
/// ```ignore
/// use imgfit_core::decode::{compute_sample_size, ImageBounds};
///
/// assert_eq!(compute_sample_size(ImageBounds::new(4000, 3000), 800, 600), 4);
/// ```
pub fn compute_sample_size(bounds: ImageBounds, target_width: u32, target_height: u32) -> u32 {
    if bounds.fits_within(target_width, target_height) {
        return 1;
    }

    let half_width = bounds.width / 2;
    let half_height = bounds.height / 2;
    let mut sample_size = 1u32;

    while sample_size < MAX_SAMPLE_SIZE
        && half_height / sample_size > target_height
        && half_width / sample_size > target_width
    {
        sample_size *= 2;
    }

    sample_size
}

/// Dimensions produced by decoding at `sample_size`.
pub fn sampled_dimensions(bounds: ImageBounds, sample_size: u32) -> (u32, u32) {
    let sample_size = sample_size.max(1);
    (
        bounds.width.div_ceil(sample_size).max(1),
        bounds.height.div_ceil(sample_size).max(1),
    )
}


// ============================================================================
// Property-Based Tests
// ============================================================================
