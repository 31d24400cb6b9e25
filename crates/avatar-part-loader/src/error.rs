// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PartLoaderError {
    #[error("origin fetch failed: {0}")]
    Fetch(#[from] avatar_store::StoreError),

    #[error("failed to decode part image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("disk cache io error: {0}")]
    Disk(#[from] std::io::Error),

    #[error("CDN circuit breaker is open")]
    CircuitOpen,
}
