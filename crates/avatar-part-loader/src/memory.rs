// SPDX-License-Identifier: Apache-2.0
//! Byte-bounded in-memory LRU tier for decoded parts.

use std::num::NonZeroUsize;
use std::sync::Arc;

use image::RgbaImage;
use lru::LruCache;
use parking_lot::Mutex;

/// Rough per-part footprint: 4 bytes per pixel, RGBA8.
fn byte_size(image: &RgbaImage) -> usize {
    (image.width() as usize) * (image.height() as usize) * 4
}

pub struct MemoryTier {
    entries: Mutex<LruCache<String, Arc<RgbaImage>>>,
    max_bytes: usize,
    current_bytes: Mutex<usize>,
}

impl MemoryTier {
    #[must_use]
    pub fn new(max_entries: usize, max_bytes: usize) -> Self {
        let capacity = NonZeroUsize::new(max_entries.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self { entries: Mutex::new(LruCache::new(capacity)), max_bytes, current_bytes: Mutex::new(0) }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<Arc<RgbaImage>> {
        self.entries.lock().get(key).cloned()
    }

    pub fn insert(&self, key: String, image: Arc<RgbaImage>) {
        let size = byte_size(&image);
        let mut entries = self.entries.lock();
        let mut current = self.current_bytes.lock();
        if let Some(old) = entries.push(key, image) {
            *current = current.saturating_sub(byte_size(&old.1));
        }
        *current += size;
        while *current > self.max_bytes {
            match entries.pop_lru() {
                Some((_, evicted)) => *current = current.saturating_sub(byte_size(&evicted)),
                None => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(w: u32, h: u32) -> Arc<RgbaImage> {
        Arc::new(RgbaImage::new(w, h))
    }

    #[test]
    fn stores_and_retrieves() {
        let tier = MemoryTier::new(10, 10 * 1024 * 1024);
        tier.insert("a".into(), image(4, 4));
        assert!(tier.get("a").is_some());
        assert!(tier.get("missing").is_none());
    }

    #[test]
    fn evicts_to_stay_under_byte_budget() {
        let tier = MemoryTier::new(10, 200);
        tier.insert("a".into(), image(5, 5)); // 100 bytes
        tier.insert("b".into(), image(5, 5)); // 100 bytes, total 200
        assert!(tier.get("a").is_some());
        tier.insert("c".into(), image(5, 5)); // forces eviction of "a" (LRU)
        assert!(tier.get("a").is_none());
        assert!(tier.get("c").is_some());
    }
}
