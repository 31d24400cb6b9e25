// SPDX-License-Identifier: Apache-2.0
//! The built-in overload fallback (`spec.md` §3, §4.6 step 5): a small
//! 425×850 placeholder silhouette served with 200 when the queue is full
//! and the requesting user has no previous render to fall back to.
//!
//! Generated once, in-process, from the same `avatar_compositor` raster
//! and WebP-encoding primitives every real render uses, rather than
//! shipping a hand-authored binary via `include_bytes!` — this guarantees
//! the asset is always a well-formed WebP for whatever `image`/`webp`
//! crate versions the build links against.

use avatar_compositor::layout::{FRAME_HEIGHT, FRAME_WIDTH};
use avatar_compositor::{encode_webp, AVATAR_QUALITY, CompositorError};
use bytes::Bytes;
use image::{Rgba, RgbaImage};
use tracing::error;

/// A flat mid-grey silhouette placeholder.
const PLACEHOLDER_COLOR: Rgba<u8> = Rgba([120, 120, 120, 255]);

pub fn generate() -> Result<Bytes, CompositorError> {
    let image = RgbaImage::from_pixel(FRAME_WIDTH, FRAME_HEIGHT, PLACEHOLDER_COLOR);
    let bytes = encode_webp(&image, AVATAR_QUALITY)?;
    Ok(Bytes::from(bytes))
}

/// Best-effort: a missing default asset degrades to `Overloaded` (`spec.md`
/// §4.6 step 5: "503 if even the default is missing"), it never panics.
#[must_use]
pub fn generate_or_log() -> Option<Bytes> {
    match generate() {
        Ok(bytes) => Some(bytes),
        Err(err) => {
            error!(error = %err, "failed to generate built-in default asset");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn produces_well_formed_webp() {
        let bytes = generate().expect("generate");
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WEBP");
    }
}
