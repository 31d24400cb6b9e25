// SPDX-License-Identifier: Apache-2.0
//! Layer Compositor (C2): a pure function from loaded part rasters to the
//! six-direction sprite sheet, and deterministic derivation of the avatar
//! and thumbnail crops (`spec.md` §4.3).
//!
//! Nothing in this crate performs I/O or awaits anything — compositing and
//! WebP encoding are CPU-only (`spec.md` §5) and safe to run on a blocking
//! worker pool from async callers.

mod chroma_key;
mod compose;
mod encode;
mod error;
pub mod layout;
mod raster;

pub use compose::{avatar_frame, compose_sheet, thumbnail_crop, LayoutFlags, BASE_LAYER_KEY, TATTOO_KEY_PREFIX, THUMBNAIL_OFFSET, THUMBNAIL_SIZE};
pub use encode::{encode_webp, AVATAR_QUALITY, DEFAULT_THUMBNAIL_QUALITY};
pub use error::CompositorError;
pub use raster::LayerRaster;
