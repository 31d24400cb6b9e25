// SPDX-License-Identifier: Apache-2.0
//! Normalizing part rasters to full 2550×850 sheets and extracting
//! per-direction frames (`spec.md` §4.3 "Direction extraction").

use image::{GenericImageView, RgbaImage};

use crate::layout::{DIRECTION_COUNT, FRAME_HEIGHT, FRAME_WIDTH, SHEET_HEIGHT, SHEET_WIDTH};
use crate::CompositorError;

/// A part raster, already normalized to a full six-direction sheet.
#[derive(Debug, Clone)]
pub struct LayerRaster(RgbaImage);

impl LayerRaster {
    /// Normalize a loaded image into a full sheet.
    ///
    /// Accepts either a full `2550×850` sheet (used as-is) or a single
    /// `425×850` frame (tiled across all six directions, so the part shows
    /// identically from every angle — the common case for symmetric props).
    pub fn normalize(image: &RgbaImage) -> Result<Self, CompositorError> {
        let (w, h) = image.dimensions();
        if w == SHEET_WIDTH && h == SHEET_HEIGHT {
            return Ok(Self(image.clone()));
        }
        if w == FRAME_WIDTH && h == FRAME_HEIGHT {
            let mut sheet = RgbaImage::new(SHEET_WIDTH, SHEET_HEIGHT);
            for dir in 0..DIRECTION_COUNT {
                image::imageops::replace(&mut sheet, image, i64::from(dir * FRAME_WIDTH), 0);
            }
            return Ok(Self(sheet));
        }
        Err(CompositorError::UnexpectedDimensions { width: w, height: h })
    }

    /// Extract the frame for one direction (0..=5) as an owned image.
    #[must_use]
    pub fn frame(&self, direction: u32) -> RgbaImage {
        self.0
            .view(direction * FRAME_WIDTH, 0, FRAME_WIDTH, FRAME_HEIGHT)
            .to_image()
    }

    #[must_use]
    pub fn sheet(&self) -> &RgbaImage {
        &self.0
    }

    pub fn into_sheet(self) -> RgbaImage {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn frame_size_input_tiles_across_directions() {
        let mut frame = RgbaImage::new(FRAME_WIDTH, FRAME_HEIGHT);
        frame.put_pixel(1, 1, Rgba([10, 20, 30, 255]));
        let raster = LayerRaster::normalize(&frame).unwrap();
        for dir in 0..DIRECTION_COUNT {
            let extracted = raster.frame(dir);
            assert_eq!(*extracted.get_pixel(1, 1), Rgba([10, 20, 30, 255]));
        }
    }

    #[test]
    fn sheet_size_input_preserved() {
        let mut sheet = RgbaImage::new(SHEET_WIDTH, SHEET_HEIGHT);
        sheet.put_pixel(500, 0, Rgba([1, 2, 3, 255]));
        let raster = LayerRaster::normalize(&sheet).unwrap();
        assert_eq!(*raster.frame(1).get_pixel(75, 0), Rgba([1, 2, 3, 255]));
    }

    #[test]
    fn unexpected_dimensions_rejected() {
        let bad = RgbaImage::new(10, 10);
        assert!(LayerRaster::normalize(&bad).is_err());
    }
}
