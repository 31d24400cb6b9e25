// SPDX-License-Identifier: Apache-2.0
//! The three-tier result cache, composed (`spec.md` §4.4).
//!
//! Validity (whether a fingerprint is still current for a user) is the
//! caller's responsibility — that check is against the `User` projection,
//! which this crate does not own. This type only moves bytes between tiers.

use std::sync::Arc;
use std::time::Duration;

use avatar_fingerprint::FingerprintHash;
use avatar_store::ObjectStore;
use bytes::Bytes;
use tracing::warn;

use crate::disk::DiskResultTier;
use crate::error::CacheError;
use crate::memory::TtlLru;
use crate::remote::{RemoteResultTier, RenderedObjects};

pub struct ResultCacheConfig {
    pub memory_max_entries: usize,
    pub memory_max_bytes: usize,
    pub memory_ttl: Duration,
    pub disk_root: std::path::PathBuf,
}

impl Default for ResultCacheConfig {
    fn default() -> Self {
        Self {
            memory_max_entries: 50,
            memory_max_bytes: 50 * 1024 * 1024,
            memory_ttl: Duration::from_secs(3600),
            disk_root: std::path::PathBuf::from("avatars"),
        }
    }
}

pub struct ResultCache {
    memory: TtlLru,
    disk: DiskResultTier,
    remote: RemoteResultTier,
}

impl ResultCache {
    #[must_use]
    pub fn new(config: ResultCacheConfig, store: Arc<dyn ObjectStore>) -> Self {
        Self {
            memory: TtlLru::new(config.memory_max_entries, config.memory_max_bytes, config.memory_ttl),
            disk: DiskResultTier::new(config.disk_root),
            remote: RemoteResultTier::new(store),
        }
    }

    /// Front-view avatar bytes: memory → disk → remote (`spec.md` §4.6 step 4).
    pub async fn get_avatar(&self, username: &str, fingerprint: FingerprintHash) -> Option<Bytes> {
        if let Some(hit) = self.memory.get(fingerprint.0) {
            return Some(hit);
        }
        if let Some(hit) = self.disk.load(fingerprint).await {
            self.memory.insert(fingerprint.0, hit.clone());
            return Some(hit);
        }
        if let Some(hit) = self.remote.get_avatar(username).await {
            self.memory.insert(fingerprint.0, hit.clone());
            return Some(hit);
        }
        None
    }

    #[must_use]
    pub fn sprite_key(username: &str) -> String {
        avatar_store::keys::user_clothing_key(username)
    }

    #[must_use]
    pub fn thumbnail_key(username: &str) -> String {
        avatar_store::keys::user_thumbnail_key(username)
    }

    pub async fn object_exists(&self, key: &str) -> bool {
        self.remote.exists(key).await
    }

    pub fn signed_url(&self, key: &str, ttl: Duration) -> Result<String, CacheError> {
        self.remote.signed_url(key, ttl)
    }

    /// Write policy (`spec.md` §4.4): disk first, then all three remote
    /// objects. Failures are logged; the caller decides whether to advance
    /// the user record's `customizationHash` based on the returned result.
    pub async fn write_render(
        &self,
        username: &str,
        fingerprint: FingerprintHash,
        objects: RenderedObjects,
    ) -> Result<(), CacheError> {
        if let Err(err) = self.disk.store(fingerprint, &objects.avatar).await {
            warn!(username, %fingerprint, error = %err, "disk cache write failed");
        }
        self.memory.insert(fingerprint.0, objects.avatar.clone());
        self.remote.put_all(username, &objects).await?;
        Ok(())
    }

    /// `/clear-cache` (`spec.md` §6): purge memory and disk. The in-flight
    /// render queue is a `avatar-coordinator` concern, cancelled separately
    /// by the caller.
    pub async fn clear(&self) {
        self.memory.clear();
        if let Err(err) = self.disk.clear_all().await {
            warn!(error = %err, "failed to clear disk result cache");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use avatar_store::StoreError;
    use std::collections::HashMap;
    use std::sync::Mutex as StdMutex;

    #[derive(Default)]
    struct StubStore {
        objects: StdMutex<HashMap<String, Bytes>>,
    }

    #[async_trait]
    impl ObjectStore for StubStore {
        async fn put(&self, key: &str, bytes: Bytes, _content_type: &str) -> Result<(), StoreError> {
            self.objects.lock().expect("lock").insert(key.to_string(), bytes);
            Ok(())
        }

        async fn head(&self, key: &str) -> Result<bool, StoreError> {
            Ok(self.objects.lock().expect("lock").contains_key(key))
        }

        async fn get(&self, key: &str) -> Result<Bytes, StoreError> {
            self.objects
                .lock()
                .expect("lock")
                .get(key)
                .cloned()
                .ok_or_else(|| StoreError::NotFound(key.to_string()))
        }

        fn signed_get_url(&self, key: &str, _ttl: Duration) -> Result<String, StoreError> {
            Ok(format!("https://example.invalid/{key}?signed=1"))
        }
    }

    #[tokio::test]
    async fn write_then_read_through_all_tiers() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = ResultCacheConfig { disk_root: dir.path().to_path_buf(), ..ResultCacheConfig::default() };
        let store = Arc::new(StubStore::default());
        let cache = ResultCache::new(config, store);
        let fp = FingerprintHash(7);
        let objects = RenderedObjects {
            avatar: Bytes::from_static(b"avatar-bytes"),
            clothing_sheet: Bytes::from_static(b"sheet-bytes"),
            thumbnail: Bytes::from_static(b"thumb-bytes"),
        };
        cache.write_render("alice", fp, objects).await.expect("write");

        let fetched = cache.get_avatar("alice", fp).await.expect("memory hit");
        assert_eq!(fetched, Bytes::from_static(b"avatar-bytes"));
        assert!(cache.object_exists(&ResultCache::sprite_key("alice")).await);
        assert!(cache.object_exists(&ResultCache::thumbnail_key("alice")).await);
    }

    #[tokio::test]
    async fn falls_back_to_remote_when_memory_and_disk_are_cold() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = ResultCacheConfig { disk_root: dir.path().to_path_buf(), ..ResultCacheConfig::default() };
        let store = Arc::new(StubStore::default());
        store
            .put("user-avatar/bob.webp", Bytes::from_static(b"remote-avatar"), "image/webp")
            .await
            .expect("seed");
        let cache = ResultCache::new(config, store);
        let fetched = cache.get_avatar("bob", FingerprintHash(1)).await.expect("remote hit");
        assert_eq!(fetched, Bytes::from_static(b"remote-avatar"));
    }
}
