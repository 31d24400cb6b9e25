// SPDX-License-Identifier: Apache-2.0
//! Bounded priority queue (`spec.md` §4.5): a `BinaryHeap` guarded by a
//! mutex, paired with a `Notify` so idle workers wake promptly.

use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::job::{DedupKey, QueuedJob};

pub struct JobQueue {
    heap: Mutex<BinaryHeap<QueuedJob>>,
    capacity: usize,
    sequence: AtomicU64,
    notify: Notify,
}

impl JobQueue {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self { heap: Mutex::new(BinaryHeap::new()), capacity, sequence: AtomicU64::new(0), notify: Notify::new() }
    }

    /// Push a new job. Returns `false` (without enqueuing) if the queue is
    /// at capacity — the caller is responsible for *not* re-submitting via
    /// the dedup map in that case (`spec.md` §4.5: "the job itself is not
    /// enqueued").
    pub fn push(&self, key: DedupKey, priority: u8) -> bool {
        let mut heap = self.heap.lock();
        if heap.len() >= self.capacity {
            return false;
        }
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        heap.push(QueuedJob { key, best_priority: priority, sequence });
        drop(heap);
        self.notify.notify_one();
        true
    }

    pub fn pop(&self) -> Option<QueuedJob> {
        self.heap.lock().pop()
    }

    /// Discard every queued job without running it (`clear-cache`'s
    /// cancellation of in-flight work, `spec.md` §9 Open Question 3).
    pub fn drain(&self) -> Vec<QueuedJob> {
        self.heap.lock().drain().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.heap.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub async fn wait_for_work(&self) {
        self.notify.notified().await;
    }

    pub fn notify_all_workers(&self) {
        self.notify.notify_waiters();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use avatar_fingerprint::FingerprintHash;

    #[test]
    fn rejects_push_past_capacity() {
        let queue = JobQueue::new(1);
        assert!(queue.push(DedupKey::new("a", FingerprintHash(1)), 1));
        assert!(!queue.push(DedupKey::new("b", FingerprintHash(2)), 1));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn pop_returns_highest_priority_first() {
        let queue = JobQueue::new(10);
        queue.push(DedupKey::new("low", FingerprintHash(1)), 0);
        queue.push(DedupKey::new("high", FingerprintHash(2)), 2);
        let popped = queue.pop().expect("pop");
        assert_eq!(popped.key.username, "high");
    }

    #[test]
    fn drain_empties_the_queue() {
        let queue = JobQueue::new(10);
        queue.push(DedupKey::new("a", FingerprintHash(1)), 0);
        queue.push(DedupKey::new("b", FingerprintHash(2)), 1);
        let drained = queue.drain();
        assert_eq!(drained.len(), 2);
        assert!(queue.is_empty());
    }
}
