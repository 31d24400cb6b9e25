// SPDX-License-Identifier: Apache-2.0
//! The render coordinator itself: wires the dedup map, priority queue,
//! worker pool, retry policy and circuit breaker together (`spec.md` §4.5).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use avatar_cache::{RenderedObjects, ResultCache};
use avatar_fingerprint::FingerprintHash;
use avatar_resilience::{Admission, CircuitBreaker, RetryPolicy};
use parking_lot::Mutex;
use tokio::sync::{broadcast, oneshot};
use tracing::{info, warn};

use crate::error::CoordinatorError;
use crate::events::JobEvent;
use crate::job::{DedupKey, JobKind};
use crate::queue::JobQueue;
use crate::renderer::{RenderError, Renderer};

/// What a `submit` caller gets back on success: the rendered bytes, plus
/// whether the result cache write actually landed. `spec.md` §7: "remote-
/// write failures leave `customizationHash` unchanged" — the caller needs
/// `persisted` to decide whether it's safe to advance the user record.
#[derive(Debug, Clone)]
pub struct RenderOutcome {
    pub objects: RenderedObjects,
    pub persisted: bool,
}

type Waiter = oneshot::Sender<Result<RenderOutcome, CoordinatorError>>;

pub struct CoordinatorConfig {
    pub queue_capacity: usize,
    pub worker_count: usize,
    pub job_timeout: Duration,
    pub retry: RetryPolicy,
    pub store_breaker_threshold: u32,
    pub store_breaker_open_timeout: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 1000,
            worker_count: 3,
            job_timeout: Duration::from_secs(30),
            retry: RetryPolicy::new(3, Duration::from_secs(2)),
            store_breaker_threshold: 5,
            store_breaker_open_timeout: Duration::from_secs(60),
        }
    }
}

pub struct RenderCoordinator {
    queue: Arc<JobQueue>,
    inflight: Mutex<HashMap<DedupKey, Vec<Waiter>>>,
    renderer: Arc<dyn Renderer>,
    cache: Arc<ResultCache>,
    retry: RetryPolicy,
    job_timeout: Duration,
    store_breaker: CircuitBreaker,
    events: broadcast::Sender<JobEvent>,
    paused: Mutex<bool>,
}

impl RenderCoordinator {
    #[must_use]
    pub fn new(config: CoordinatorConfig, renderer: Arc<dyn Renderer>, cache: Arc<ResultCache>) -> Arc<Self> {
        let (events, _) = broadcast::channel(256);
        let coordinator = Arc::new(Self {
            queue: Arc::new(JobQueue::new(config.queue_capacity)),
            inflight: Mutex::new(HashMap::new()),
            renderer,
            cache,
            retry: config.retry,
            job_timeout: config.job_timeout,
            store_breaker: CircuitBreaker::new(config.store_breaker_threshold, config.store_breaker_open_timeout),
            events,
            paused: Mutex::new(false),
        });
        for worker_id in 0..config.worker_count.max(1) {
            let this = coordinator.clone();
            tokio::spawn(async move { this.worker_loop(worker_id).await });
        }
        coordinator
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.events.subscribe()
    }

    pub fn pause(&self) {
        *self.paused.lock() = true;
    }

    pub fn resume(&self) {
        *self.paused.lock() = false;
        self.queue.notify_all_workers();
    }

    #[must_use]
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// `clear-cache`'s cancellation of in-flight work (`spec.md` §9 Open
    /// Question 3): drop every still-queued job and fail every attached
    /// waiter with `Cancelled`. A job a worker has already popped keeps
    /// running to completion, but its result is discarded — the inflight
    /// entry is gone by the time it finishes, so `notify_waiters` is a
    /// no-op for it.
    pub fn cancel_all(&self) {
        self.queue.drain();
        let waiters = std::mem::take(&mut *self.inflight.lock());
        for (key, senders) in waiters {
            let _ = self.events.send(JobEvent::Failed { key: key.clone(), reason: "cache cleared".into() });
            for sender in senders {
                let _ = sender.send(Err(CoordinatorError::Cancelled("cache cleared".into())));
            }
        }
    }

    /// Submit a render request, de-duplicating on `(username, fingerprint)`.
    /// Resolves when the job (new or already in flight) reaches a terminal
    /// state.
    pub async fn submit(
        &self,
        username: &str,
        fingerprint: FingerprintHash,
        kind: JobKind,
    ) -> Result<RenderOutcome, CoordinatorError> {
        let key = DedupKey::new(username, fingerprint);
        let (tx, rx) = oneshot::channel();

        let is_new = {
            let mut inflight = self.inflight.lock();
            match inflight.get_mut(&key) {
                Some(waiters) => {
                    waiters.push(tx);
                    false
                }
                None => {
                    inflight.insert(key.clone(), vec![tx]);
                    true
                }
            }
        };

        if is_new {
            if !self.queue.push(key.clone(), kind.priority()) {
                let waiters = self.inflight.lock().remove(&key);
                if let Some(waiters) = waiters {
                    for waiter in waiters {
                        let _ = waiter.send(Err(CoordinatorError::Overloaded));
                    }
                }
                return Err(CoordinatorError::Overloaded);
            }
            let _ = self.events.send(JobEvent::Added(key));
        }

        rx.await.unwrap_or(Err(CoordinatorError::Internal("render worker dropped its sender".into())))
    }

    async fn worker_loop(&self, worker_id: usize) {
        loop {
            if *self.paused.lock() {
                self.queue.wait_for_work().await;
                continue;
            }
            let Some(job) = self.queue.pop() else {
                self.queue.wait_for_work().await;
                continue;
            };
            info!(worker_id, username = %job.key.username, fingerprint = %job.key.fingerprint, "render job started");
            self.run_job(job.key).await;
        }
    }

    /// Only [`RenderError::Transient`] is worth retrying; a
    /// [`RenderError::Fatal`] (unknown user, composition/encode failure)
    /// would just fail the same way three more times. [`RetryPolicy::retry`]
    /// retries on any `Err`, so a fatal outcome is smuggled through as an
    /// `Ok` carrying a `String` — the retry loop stops immediately, and
    /// `run_job` unwraps the nested result afterward to tell fatal from
    /// successful.
    async fn run_job(&self, key: DedupKey) {
        let username = key.username.clone();
        let fingerprint = key.fingerprint;
        let events = self.events.clone();
        let key_for_retry = key.clone();

        let attempt_result = tokio::time::timeout(
            self.job_timeout,
            self.retry.retry(move |attempt| {
                let username = username.clone();
                let key_for_retry = key_for_retry.clone();
                let events = events.clone();
                async move {
                    if attempt > 0 {
                        let _ = events.send(JobEvent::Retried { key: key_for_retry, attempt });
                    }
                    match self.renderer.render(&username, fingerprint).await {
                        Ok(objects) => Ok(Ok(objects)),
                        Err(RenderError::Fatal(msg)) => Ok(Err(msg)),
                        Err(RenderError::Transient(msg)) => Err(msg),
                    }
                }
            }),
        )
        .await;

        match attempt_result {
            Ok(Ok(Ok(objects))) => self.complete_job(key, objects).await,
            Ok(Ok(Err(fatal_msg))) => self.fail_job(key, CoordinatorError::Internal(fatal_msg)).await,
            Ok(Err(transient_msg)) => self.fail_job(key, CoordinatorError::Transient(transient_msg)).await,
            Err(_elapsed) => self.fail_job(key, CoordinatorError::Timeout).await,
        }
    }

    /// Render success always reaches the waiter with the generated bytes
    /// (`spec.md` §7: "still yield a successful response to the client *if*
    /// bytes were generated"); `persisted` just tells the caller whether
    /// it's safe to advance the user record off the back of this render.
    async fn complete_job(&self, key: DedupKey, objects: RenderedObjects) {
        let persisted = match self.store_breaker.admit() {
            Admission::Rejected => {
                warn!(username = %key.username, "object store circuit breaker open, skipping cache write");
                false
            }
            _ => match self.cache.write_render(&key.username, key.fingerprint, objects.clone()).await {
                Ok(()) => {
                    self.store_breaker.on_success();
                    true
                }
                Err(err) => {
                    self.store_breaker.on_failure();
                    warn!(username = %key.username, error = %err, "result cache write failed");
                    false
                }
            },
        };

        let _ = self.events.send(JobEvent::Completed(key.clone()));
        self.notify_waiters(&key, Ok(RenderOutcome { objects, persisted }));
    }

    async fn fail_job(&self, key: DedupKey, error: CoordinatorError) {
        let _ = self.events.send(JobEvent::Failed { key: key.clone(), reason: error.to_string() });
        self.notify_waiters(&key, Err(error));
    }

    fn notify_waiters(&self, key: &DedupKey, result: Result<RenderOutcome, CoordinatorError>) {
        let Some(waiters) = self.inflight.lock().remove(key) else { return };
        for waiter in waiters {
            let _ = waiter.send(result.clone());
        }
    }
}
