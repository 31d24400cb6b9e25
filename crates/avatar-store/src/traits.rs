// SPDX-License-Identifier: Apache-2.0
//! Port traits the core depends on, never a concrete HTTP client
//! (`spec.md` §1: object storage and the CDN are external collaborators).

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::StoreError;

/// The remote object store (`spec.md` §6): DigitalOcean Spaces or any
/// S3-compatible bucket.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload `bytes` to `key` with the given content type.
    async fn put(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<(), StoreError>;

    /// Check whether `key` exists without downloading it.
    async fn head(&self, key: &str) -> Result<bool, StoreError>;

    /// Download `key` in full. Returns `NotFound` if it doesn't exist.
    async fn get(&self, key: &str) -> Result<Bytes, StoreError>;

    /// Produce a short-lived signed URL a client can `GET` directly
    /// (`spec.md` §4.6 step 4: redirect to a signed object-store URL).
    fn signed_get_url(&self, key: &str, ttl: Duration) -> Result<String, StoreError>;
}

/// The part-sprite CDN (`spec.md` §4.2): read-only origin for item sprites.
#[async_trait]
pub trait CdnClient: Send + Sync {
    /// Fetch the raw bytes of `<cdn>/item-sprite/<item_ref>.webp`.
    async fn fetch_part(&self, item_ref: &str) -> Result<Bytes, StoreError>;
}
