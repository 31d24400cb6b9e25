// SPDX-License-Identifier: Apache-2.0
//! The remote tier: canonical, user-keyed objects in the object store
//! (`spec.md` §4.4, §6).

use std::sync::Arc;
use std::time::Duration;

use avatar_store::{keys, ObjectStore};
use bytes::Bytes;

use crate::error::CacheError;

pub struct RemoteResultTier {
    store: Arc<dyn ObjectStore>,
}

/// The three objects a completed render writes, keyed by username.
#[derive(Debug, Clone)]
pub struct RenderedObjects {
    pub avatar: Bytes,
    pub clothing_sheet: Bytes,
    pub thumbnail: Bytes,
}

impl RemoteResultTier {
    #[must_use]
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    pub async fn put_all(&self, username: &str, objects: &RenderedObjects) -> Result<(), CacheError> {
        self.store.put(&keys::user_avatar_key(username), objects.avatar.clone(), "image/webp").await?;
        self.store
            .put(&keys::user_clothing_key(username), objects.clothing_sheet.clone(), "image/webp")
            .await?;
        self.store
            .put(&keys::user_thumbnail_key(username), objects.thumbnail.clone(), "image/webp")
            .await?;
        Ok(())
    }

    pub async fn get_avatar(&self, username: &str) -> Option<Bytes> {
        self.store.get(&keys::user_avatar_key(username)).await.ok()
    }

    pub async fn exists(&self, key: &str) -> bool {
        self.store.head(key).await.unwrap_or(false)
    }

    pub fn signed_url(&self, key: &str, ttl: Duration) -> Result<String, CacheError> {
        self.store.signed_get_url(key, ttl).map_err(CacheError::from)
    }
}
