// SPDX-License-Identifier: Apache-2.0
//! The render coordinator never composites pixels itself; it drives an
//! injected [`Renderer`], mirroring the teacher's port-trait pattern so the
//! scheduling machinery stays independently testable from the pixel work.

use async_trait::async_trait;
use avatar_cache::RenderedObjects;
use avatar_fingerprint::FingerprintHash;

#[derive(Debug, Clone, thiserror::Error)]
pub enum RenderError {
    #[error("transient render failure: {0}")]
    Transient(String),

    #[error("non-retryable render failure: {0}")]
    Fatal(String),
}

#[async_trait]
pub trait Renderer: Send + Sync {
    /// Produce all three artifacts (avatar front crop, full sprite sheet,
    /// thumbnail crop) for `username` at `fingerprint`.
    async fn render(&self, username: &str, fingerprint: FingerprintHash) -> Result<RenderedObjects, RenderError>;
}
