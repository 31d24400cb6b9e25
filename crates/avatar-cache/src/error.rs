// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("disk cache io error: {0}")]
    Disk(#[from] std::io::Error),

    #[error("remote object store error: {0}")]
    Remote(#[from] avatar_store::StoreError),
}
