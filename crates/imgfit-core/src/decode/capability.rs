//! Process-wide record of whether the codecs honor `image::Limits::max_alloc`.
//!
//! The check runs at most once per process. The decoder always compares the
//! decoder's reported buffer size against the ceiling before decoding; this
//! flag only tells it whether the codec also guards its own allocations.

use std::io::Cursor;
use std::sync::OnceLock;

use image::codecs::png::PngEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageError, ImageReader, Limits};

static CODEC_ENFORCES_LIMITS: OnceLock<bool> = OnceLock::new();

/// Whether the decode path rejects images above `Limits::max_alloc` on its own.
pub fn codec_enforces_limits() -> bool {
    *CODEC_ENFORCES_LIMITS.get_or_init(|| {
        let supported = probe_codec_limits();
        log::debug!("codec allocation limits enforced: {}", supported);
        supported
    })
}

/// Side of the square PNG decoded by the check.
const CHECK_SIDE: u32 = 64;

/// Ceiling well below the check image's 16 KiB pixel buffer.
const CHECK_CEILING: u64 = 1024;

/// Decode a 64x64 RGBA PNG under a ceiling smaller than its pixel buffer.
fn probe_codec_limits() -> bool {
    let pixels = vec![0u8; (CHECK_SIDE * CHECK_SIDE * 4) as usize];
    let mut png = Vec::new();
    let encoded = PngEncoder::new(&mut png).write_image(
        &pixels,
        CHECK_SIDE,
        CHECK_SIDE,
        ExtendedColorType::Rgba8,
    );
    if encoded.is_err() {
        return false;
    }

    let mut reader = match ImageReader::new(Cursor::new(png)).with_guessed_format() {
        Ok(reader) => reader,
        Err(_) => return false,
    };
    let mut limits = Limits::default();
    limits.max_alloc = Some(CHECK_CEILING);
    reader.limits(limits);

    let result = reader
        .into_decoder()
        .and_then(|decoder| DynamicImage::from_decoder(decoder));
    matches!(result, Err(ImageError::Limits(_)))
}
