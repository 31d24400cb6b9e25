// SPDX-License-Identifier: Apache-2.0
//! Memory tier: LRU keyed by fingerprint, bounded by entry count and byte
//! budget, with a 1-hour TTL refreshed on access (`spec.md` §4.4).

use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use bytes::Bytes;
use lru::LruCache;
use parking_lot::Mutex;

struct Entry {
    bytes: Bytes,
    expires_at: Instant,
}

pub struct TtlLru {
    entries: Mutex<LruCache<u32, Entry>>,
    max_bytes: usize,
    current_bytes: Mutex<usize>,
    ttl: Duration,
}

impl TtlLru {
    #[must_use]
    pub fn new(max_entries: usize, max_bytes: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(max_entries.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self { entries: Mutex::new(LruCache::new(capacity)), max_bytes, current_bytes: Mutex::new(0), ttl }
    }

    /// Returns the cached bytes for `key` if present and not expired,
    /// refreshing its TTL and recency on access.
    #[must_use]
    pub fn get(&self, key: u32) -> Option<Bytes> {
        let mut entries = self.entries.lock();
        let now = Instant::now();
        match entries.get_mut(&key) {
            Some(entry) if entry.expires_at > now => {
                entry.expires_at = now + self.ttl;
                Some(entry.bytes.clone())
            }
            Some(_) => {
                entries.pop(&key);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, key: u32, bytes: Bytes) {
        let size = bytes.len();
        let mut entries = self.entries.lock();
        let mut current = self.current_bytes.lock();
        let entry = Entry { bytes, expires_at: Instant::now() + self.ttl };
        if let Some((_, old)) = entries.push(key, entry) {
            *current = current.saturating_sub(old.bytes.len());
        }
        *current += size;
        while *current > self.max_bytes {
            match entries.pop_lru() {
                Some((_, evicted)) => *current = current.saturating_sub(evicted.bytes.len()),
                None => break,
            }
        }
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
        *self.current_bytes.lock() = 0;
    }
}
