// SPDX-License-Identifier: Apache-2.0
//! Compositor error type.

/// Errors the pure compositor can raise. None of these are network/IO —
/// they are all programmer-facing invariant violations in the caller's
/// input (`spec.md` §7 `Internal`).
#[derive(Debug, thiserror::Error)]
pub enum CompositorError {
    #[error("layer raster has unexpected dimensions {width}x{height}, expected a 425x850 frame or 2550x850 sheet")]
    UnexpectedDimensions { width: u32, height: u32 },

    #[error("composition requires a base layer")]
    MissingBaseLayer,

    #[error("webp encoding failed: {0}")]
    Encode(String),
}
