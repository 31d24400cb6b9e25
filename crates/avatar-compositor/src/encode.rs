// SPDX-License-Identifier: Apache-2.0
//! WebP encoding of the rendered outputs (`spec.md` §3: avatar at quality
//! 95, thumbnail at quality 75–100).

use image::RgbaImage;

use crate::CompositorError;

/// Encode an RGBA raster as lossy WebP at the given quality (0..=100).
pub fn encode_webp(image: &RgbaImage, quality: f32) -> Result<Vec<u8>, CompositorError> {
    let encoder = webp::Encoder::from_rgba(image.as_raw(), image.width(), image.height());
    let memory = encoder.encode(quality);
    Ok(memory.to_vec())
}

/// Quality used for the avatar crop (`spec.md` §3).
pub const AVATAR_QUALITY: f32 = 95.0;
/// Default quality used for the thumbnail crop; callers may pick any value
/// in `75..=100` (`spec.md` §3).
pub const DEFAULT_THUMBNAIL_QUALITY: f32 = 90.0;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn encodes_nonempty_bytes() {
        let image = RgbaImage::from_pixel(4, 4, Rgba([255, 0, 0, 255]));
        let bytes = encode_webp(&image, AVATAR_QUALITY).unwrap();
        assert!(!bytes.is_empty());
        // RIFF/WEBP magic.
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WEBP");
    }
}
