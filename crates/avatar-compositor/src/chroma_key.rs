// SPDX-License-Identifier: Apache-2.0
//! Chroma-key mask compositing mode (`spec.md` §4.3, historical assets).
//!
//! Target color `(0, 255, 4)` with per-channel tolerance `(±50, ±150, ±50)`.
//! For any fully opaque pixel in a *mask layer* whose color lies in the
//! target box, the corresponding pixel in the *source* layer is made fully
//! transparent. The single-image form erases the source's own matching
//! pixels (mask == source).

use image::{Rgba, RgbaImage};

const TARGET: [u8; 3] = [0, 255, 4];
const TOLERANCE: [u8; 3] = [50, 150, 50];

fn in_target_box(px: Rgba<u8>) -> bool {
    px.0[3] == 255
        && (0..3).all(|c| {
            let d = i16::from(px.0[c]) - i16::from(TARGET[c]);
            d.unsigned_abs() <= u16::from(TOLERANCE[c])
        })
}

/// Apply the chroma-key mask to `source` in place, using `mask` as the
/// reference layer (or `source` itself, for the single-image form).
///
/// `source` and `mask` must have identical dimensions.
pub fn apply_mask(source: &mut RgbaImage, mask: &RgbaImage) {
    debug_assert_eq!(source.dimensions(), mask.dimensions());
    for (dst, mask_px) in source.pixels_mut().zip(mask.pixels()) {
        if in_target_box(*mask_px) {
            dst.0[3] = 0;
        }
    }
}

/// Apply the single-image form: a layer erases its own matching pixels.
pub fn apply_self_mask(layer: &mut RgbaImage) {
    for px in layer.pixels_mut() {
        if in_target_box(*px) {
            px.0[3] = 0;
        }
    }
}
