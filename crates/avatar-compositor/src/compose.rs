// SPDX-License-Identifier: Apache-2.0
//! Layer Compositor (C2): pure composition of loaded part rasters into the
//! six-direction sprite sheet, and deterministic derivation of the avatar
//! and thumbnail crops (`spec.md` §4.3).

use std::collections::HashMap;

use avatar_model::TATTOO_SLOT_ORDER;
use image::{imageops, GenericImageView, RgbaImage};

use crate::chroma_key;
use crate::layout::{self, Layer, DIRECTION_COUNT, FRAME_HEIGHT, FRAME_WIDTH, SHEET_HEIGHT, SHEET_WIDTH};
use crate::raster::LayerRaster;
use crate::CompositorError;

/// Key under which the required body-base layer is looked up.
pub const BASE_LAYER_KEY: &str = "base";
/// Key prefix for a tattoo sub-slot, e.g. `"tattoo:armLeft"`.
pub const TATTOO_KEY_PREFIX: &str = "tattoo:";

/// Layout flags that select which of a conditional pseudo-layer pair is
/// drawn (`spec.md` §4.3).
#[derive(Debug, Clone, Copy, Default)]
pub struct LayoutFlags {
    pub shoes_behind_pants: bool,
    pub hair_in_front_of_top: bool,
}

/// Build the combined tattoo layer: all ten per-body-part rasters, straight-
/// alpha composited in their fixed declaration order, into one sheet.
fn combine_tattoos(layers: &HashMap<String, RgbaImage>) -> Option<RgbaImage> {
    let mut combined: Option<RgbaImage> = None;
    for name in TATTOO_SLOT_ORDER {
        let key = format!("{TATTOO_KEY_PREFIX}{name}");
        let Some(part) = layers.get(&key) else { continue };
        match combined.as_mut() {
            None => combined = Some(part.clone()),
            Some(base) => imageops::overlay(base, part, 0, 0),
        }
    }
    combined
}

fn resolve_layer<'a>(
    layer: Layer,
    layers: &'a HashMap<String, RgbaImage>,
    tattoos: &'a Option<RgbaImage>,
    flags: LayoutFlags,
) -> Option<&'a RgbaImage> {
    match layer {
        Layer::Base => layers.get(BASE_LAYER_KEY),
        Layer::Tattoos => tattoos.as_ref(),
        Layer::Slot(name) => layers.get(name),
        Layer::ShoesBefore => (!flags.shoes_behind_pants).then(|| layers.get("shoes")).flatten(),
        Layer::ShoesAfter => flags.shoes_behind_pants.then(|| layers.get("shoes")).flatten(),
        Layer::HairBehind => (!flags.hair_in_front_of_top).then(|| layers.get("hair")).flatten(),
        Layer::HairInFront => flags.hair_in_front_of_top.then(|| layers.get("hair")).flatten(),
    }
}

/// Composite every loaded layer into the full six-direction sprite sheet.
///
/// `layers` maps a layer name (a slot name from `avatar_model::SLOT_ORDER`,
/// `"base"`, or a `"tattoo:<name>"` key) to an already-decoded raster, either
/// a full `2550×850` sheet or a single `425×850` frame (normalized here).
///
/// `chroma_key_masks` is the optional legacy mode (`spec.md` §4.3): when
/// `Some`, each entry names a layer whose opaque target-color pixels should
/// be cut as fully transparent (using the named mask layer, or the layer
/// itself when the mask name matches the source name — the single-image
/// form).
pub fn compose_sheet(
    layers: &HashMap<String, RgbaImage>,
    flags: LayoutFlags,
    chroma_key_masks: Option<&HashMap<String, String>>,
) -> Result<RgbaImage, CompositorError> {
    if !layers.contains_key(BASE_LAYER_KEY) {
        return Err(CompositorError::MissingBaseLayer);
    }

    let mut normalized: HashMap<String, RgbaImage> = HashMap::with_capacity(layers.len());
    for (name, image) in layers {
        normalized.insert(name.clone(), LayerRaster::normalize(image)?.into_sheet());
    }

    if let Some(masks) = chroma_key_masks {
        for (source_name, mask_name) in masks {
            let mask = normalized.get(mask_name).cloned();
            if let Some(source) = normalized.get_mut(source_name) {
                match &mask {
                    Some(mask) if mask_name != source_name => chroma_key::apply_mask(source, mask),
                    _ => chroma_key::apply_self_mask(source),
                }
            }
        }
    }

    let tattoos = combine_tattoos(&normalized);

    let mut sheet = RgbaImage::new(SHEET_WIDTH, SHEET_HEIGHT);
    for direction in 0..DIRECTION_COUNT {
        let order = layout::order_for_direction(direction);
        let mut frame = RgbaImage::new(FRAME_WIDTH, FRAME_HEIGHT);
        for layer in order {
            let Some(sheet_image) = resolve_layer(*layer, &normalized, &tattoos, flags) else { continue };
            let part_frame = sheet_image.view(direction * FRAME_WIDTH, 0, FRAME_WIDTH, FRAME_HEIGHT);
            imageops::overlay(&mut frame, &part_frame, 0, 0);
        }
        imageops::replace(&mut sheet, &frame, i64::from(direction * FRAME_WIDTH), 0);
    }

    Ok(sheet)
}

/// Extract the front-facing avatar frame (`425×850`, direction 0) from a
/// composited sprite sheet.
#[must_use]
pub fn avatar_frame(sheet: &RgbaImage) -> RgbaImage {
    imageops::crop_imm(sheet, 0, 0, FRAME_WIDTH, FRAME_HEIGHT).to_image()
}

/// Thumbnail crop offset and size (`spec.md` §3).
pub const THUMBNAIL_OFFSET: (u32, u32) = (103, 42);
pub const THUMBNAIL_SIZE: u32 = 218;

/// Extract the `218×218` thumbnail crop from the front-facing avatar frame.
#[must_use]
pub fn thumbnail_crop(avatar: &RgbaImage) -> RgbaImage {
    imageops::crop_imm(avatar, THUMBNAIL_OFFSET.0, THUMBNAIL_OFFSET.1, THUMBNAIL_SIZE, THUMBNAIL_SIZE).to_image()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use image::Rgba;

    fn base_layer() -> RgbaImage {
        RgbaImage::from_pixel(SHEET_WIDTH, SHEET_HEIGHT, Rgba([50, 50, 50, 255]))
    }

    #[test]
    fn missing_base_layer_rejected() {
        let layers = HashMap::new();
        let err = compose_sheet(&layers, LayoutFlags::default(), None).unwrap_err();
        assert!(matches!(err, CompositorError::MissingBaseLayer));
    }

    #[test]
    fn deterministic_output() {
        let mut layers = HashMap::new();
        layers.insert(BASE_LAYER_KEY.to_string(), base_layer());
        let mut top = RgbaImage::new(FRAME_WIDTH, FRAME_HEIGHT);
        top.put_pixel(10, 10, Rgba([200, 0, 0, 255]));
        layers.insert("top".to_string(), top);

        let a = compose_sheet(&layers, LayoutFlags::default(), None).unwrap();
        let b = compose_sheet(&layers, LayoutFlags::default(), None).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn sheet_has_correct_dimensions() {
        let mut layers = HashMap::new();
        layers.insert(BASE_LAYER_KEY.to_string(), base_layer());
        let sheet = compose_sheet(&layers, LayoutFlags::default(), None).unwrap();
        assert_eq!(sheet.dimensions(), (SHEET_WIDTH, SHEET_HEIGHT));
    }

    #[test]
    fn shoes_behind_pants_flag_controls_occlusion() {
        let mut layers = HashMap::new();
        layers.insert(BASE_LAYER_KEY.to_string(), base_layer());
        let shoes = RgbaImage::from_pixel(FRAME_WIDTH, FRAME_HEIGHT, Rgba([255, 0, 0, 255]));
        let bottom = RgbaImage::from_pixel(FRAME_WIDTH, FRAME_HEIGHT, Rgba([0, 0, 255, 255]));
        layers.insert("shoes".to_string(), shoes);
        layers.insert("bottom".to_string(), bottom);

        let behind = compose_sheet(&layers, LayoutFlags { shoes_behind_pants: true, hair_in_front_of_top: false }, None).unwrap();
        let in_front = compose_sheet(&layers, LayoutFlags { shoes_behind_pants: false, hair_in_front_of_top: false }, None).unwrap();

        // shoes_behind_pants=true => bottom drawn after shoes => bottom visible (blue)
        assert_eq!(*behind.get_pixel(0, 0), Rgba([0, 0, 255, 255]));
        // shoes_behind_pants=false => shoes drawn after bottom => shoes visible (red)
        assert_eq!(*in_front.get_pixel(0, 0), Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn avatar_and_thumbnail_are_deterministic_crops() {
        let mut layers = HashMap::new();
        layers.insert(BASE_LAYER_KEY.to_string(), base_layer());
        let sheet = compose_sheet(&layers, LayoutFlags::default(), None).unwrap();
        let avatar = avatar_frame(&sheet);
        assert_eq!(avatar.dimensions(), (FRAME_WIDTH, FRAME_HEIGHT));
        let thumb = thumbnail_crop(&avatar);
        assert_eq!(thumb.dimensions(), (THUMBNAIL_SIZE, THUMBNAIL_SIZE));
    }
}
