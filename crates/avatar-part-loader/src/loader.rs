// SPDX-License-Identifier: Apache-2.0
//! Loading a single part's image, memory tier → disk tier → CDN origin.
//!
//! Per `spec.md` §7, a failed part load must never fail the overall render:
//! [`PartLoader::load`] returns `None` rather than propagating an error,
//! logging a warning so the absorbed failure is still observable.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use avatar_model::ItemRef;
use avatar_resilience::{Admission, CircuitBreaker};
use image::RgbaImage;
use tokio::sync::Semaphore;
use tracing::{error, warn};

use crate::disk::DiskTier;
use crate::memory::MemoryTier;

/// Loads and caches individual clothing/body part sprites.
pub struct PartLoader {
    memory: MemoryTier,
    disk: DiskTier,
    cdn: Arc<dyn avatar_store::CdnClient>,
    fetch_limiter: Semaphore,
    breaker: CircuitBreaker,
    origin_hits: AtomicU64,
}

impl PartLoader {
    #[must_use]
    pub fn new(
        cdn: Arc<dyn avatar_store::CdnClient>,
        disk_root: impl Into<std::path::PathBuf>,
        memory_max_entries: usize,
        memory_max_bytes: usize,
        fetch_concurrency: usize,
        breaker_threshold: u32,
        breaker_open_timeout: std::time::Duration,
    ) -> Self {
        Self {
            memory: MemoryTier::new(memory_max_entries, memory_max_bytes),
            disk: DiskTier::new(disk_root),
            cdn,
            fetch_limiter: Semaphore::new(fetch_concurrency.max(1)),
            breaker: CircuitBreaker::new(breaker_threshold, breaker_open_timeout),
            origin_hits: AtomicU64::new(0),
        }
    }

    /// Load a decoded RGBA sprite for `item`, or `None` if it could not be
    /// obtained from any tier. Never returns an error.
    pub async fn load(&self, item: &ItemRef) -> Option<Arc<RgbaImage>> {
        let cache_key = item.cache_key();
        if let Some(hit) = self.memory.get(&cache_key) {
            return Some(hit);
        }

        if let Some(image) = self.disk.load(item).await {
            let image = Arc::new(image);
            self.memory.insert(cache_key, image.clone());
            return Some(image);
        }

        self.load_from_origin(item).await
    }

    async fn load_from_origin(&self, item: &ItemRef) -> Option<Arc<RgbaImage>> {
        let admission = self.breaker.admit();
        if admission == Admission::Rejected {
            warn!(item = %item, "CDN circuit breaker open, skipping origin fetch");
            return None;
        }

        let _permit = match self.fetch_limiter.acquire().await {
            Ok(permit) => permit,
            Err(_) => return None,
        };

        let result = self.cdn.fetch_part(item.as_str()).await;
        match result {
            Ok(bytes) => match image::load_from_memory(&bytes) {
                Ok(decoded) => {
                    self.breaker.on_success();
                    self.origin_hits.fetch_add(1, Ordering::Relaxed);
                    let rgba = decoded.into_rgba8();
                    if let Err(err) = self.disk.store(item, &rgba).await {
                        warn!(item = %item, error = %err, "failed to populate disk tier");
                    }
                    let rgba = Arc::new(rgba);
                    self.memory.insert(item.cache_key(), rgba.clone());
                    Some(rgba)
                }
                Err(err) => {
                    self.breaker.on_failure();
                    error!(item = %item, error = %err, "failed to decode part image from origin");
                    None
                }
            },
            Err(err) => {
                self.breaker.on_failure();
                warn!(item = %item, error = %err, "origin fetch failed");
                None
            }
        }
    }

    #[must_use]
    pub fn origin_hit_count(&self) -> u64 {
        self.origin_hits.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use avatar_store::{CdnClient, StoreError};
    use bytes::Bytes;
    use std::sync::Mutex as StdMutex;

    struct StubCdn {
        calls: StdMutex<u32>,
        fail: bool,
    }

    #[async_trait]
    impl CdnClient for StubCdn {
        async fn fetch_part(&self, _item_ref: &str) -> Result<Bytes, StoreError> {
            *self.calls.lock().expect("lock") += 1;
            if self.fail {
                return Err(StoreError::NotFound("stub".into()));
            }
            let image = RgbaImage::from_pixel(2, 2, image::Rgba([9, 9, 9, 255]));
            let mut buf = Vec::new();
            image::DynamicImage::ImageRgba8(image)
                .write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
                .expect("encode stub png");
            Ok(Bytes::from(buf))
        }
    }

    #[tokio::test]
    async fn loads_from_origin_and_then_memory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cdn = Arc::new(StubCdn { calls: StdMutex::new(0), fail: false });
        let loader = PartLoader::new(
            cdn.clone(),
            dir.path(),
            10,
            10 * 1024 * 1024,
            4,
            5,
            std::time::Duration::from_secs(60),
        );
        let item = ItemRef::from("shirt_1");
        let first = loader.load(&item).await.expect("first load");
        assert_eq!(first.get_pixel(0, 0).0, [9, 9, 9, 255]);
        assert_eq!(*cdn.calls.lock().expect("lock"), 1);

        let second = loader.load(&item).await.expect("second load (memory hit)");
        assert_eq!(second.get_pixel(0, 0), first.get_pixel(0, 0));
        assert_eq!(*cdn.calls.lock().expect("lock"), 1, "memory tier should avoid a second origin fetch");
    }

    #[tokio::test]
    async fn failed_origin_fetch_returns_none_without_panicking() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cdn = Arc::new(StubCdn { calls: StdMutex::new(0), fail: true });
        let loader = PartLoader::new(
            cdn,
            dir.path(),
            10,
            10 * 1024 * 1024,
            4,
            5,
            std::time::Duration::from_secs(60),
        );
        let result = loader.load(&ItemRef::from("missing_item")).await;
        assert!(result.is_none());
    }
}
