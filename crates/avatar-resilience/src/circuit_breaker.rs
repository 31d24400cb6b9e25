// SPDX-License-Identifier: Apache-2.0
//! Circuit breaker (`spec.md` §7): short-circuits calls to a failing
//! upstream without contacting it.
//!
//! `CLOSED → OPEN` after `threshold` consecutive failures; `OPEN` rejects
//! immediately for `timeout`; `HALF_OPEN` admits exactly one probe call.
//!
//! Per the design notes (`spec.md` §9): the single-flight map in
//! `avatar-coordinator` is consulted *before* this breaker — an in-flight
//! job may complete even while the breaker is open for new starts. This
//! type only governs whether a *new* call may start.

use std::time::{Duration, Instant};

use parking_lot::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Closed,
    Open { opened_at: Instant },
    HalfOpen,
}

struct Inner {
    state: State,
    consecutive_failures: u32,
    half_open_probe_in_flight: bool,
}

/// A circuit breaker for one upstream dependency (object store or CDN).
pub struct CircuitBreaker {
    threshold: u32,
    open_timeout: Duration,
    inner: Mutex<Inner>,
}

/// Whether a new call may proceed, and what to do with the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Proceed normally.
    Allowed,
    /// Proceed as the single `HALF_OPEN` probe; report the outcome via
    /// [`CircuitBreaker::on_success`]/[`CircuitBreaker::on_failure`].
    Probe,
    /// Reject immediately; upstream is not contacted.
    Rejected,
}

impl CircuitBreaker {
    #[must_use]
    pub fn new(threshold: u32, open_timeout: Duration) -> Self {
        Self {
            threshold,
            open_timeout,
            inner: Mutex::new(Inner { state: State::Closed, consecutive_failures: 0, half_open_probe_in_flight: false }),
        }
    }

    /// Ask whether a new call is allowed to start.
    pub fn admit(&self) -> Admission {
        let mut inner = self.inner.lock();
        match inner.state {
            State::Closed => Admission::Allowed,
            State::Open { opened_at } => {
                if opened_at.elapsed() >= self.open_timeout {
                    inner.state = State::HalfOpen;
                    inner.half_open_probe_in_flight = true;
                    Admission::Probe
                } else {
                    Admission::Rejected
                }
            }
            State::HalfOpen => {
                if inner.half_open_probe_in_flight {
                    Admission::Rejected
                } else {
                    inner.half_open_probe_in_flight = true;
                    Admission::Probe
                }
            }
        }
    }

    /// Record a successful call.
    pub fn on_success(&self) {
        let mut inner = self.inner.lock();
        inner.consecutive_failures = 0;
        inner.half_open_probe_in_flight = false;
        inner.state = State::Closed;
    }

    /// Record a failed call.
    pub fn on_failure(&self) {
        let mut inner = self.inner.lock();
        inner.half_open_probe_in_flight = false;
        match inner.state {
            State::HalfOpen => {
                inner.state = State::Open { opened_at: Instant::now() };
                inner.consecutive_failures = self.threshold;
            }
            State::Closed | State::Open { .. } => {
                inner.consecutive_failures += 1;
                if inner.consecutive_failures >= self.threshold {
                    inner.state = State::Open { opened_at: Instant::now() };
                }
            }
        }
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        matches!(self.inner.lock().state, State::Open { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_after_threshold_consecutive_failures() {
        let cb = CircuitBreaker::new(3, Duration::from_secs(60));
        for _ in 0..2 {
            assert_eq!(cb.admit(), Admission::Allowed);
            cb.on_failure();
        }
        assert!(!cb.is_open());
        assert_eq!(cb.admit(), Admission::Allowed);
        cb.on_failure();
        assert!(cb.is_open());
        assert_eq!(cb.admit(), Admission::Rejected);
    }

    #[test]
    fn success_resets_failure_count() {
        let cb = CircuitBreaker::new(3, Duration::from_secs(60));
        cb.admit();
        cb.on_failure();
        cb.admit();
        cb.on_failure();
        cb.admit();
        cb.on_success();
        assert!(!cb.is_open());
        // two more failures shouldn't open it since the count was reset
        cb.admit();
        cb.on_failure();
        cb.admit();
        cb.on_failure();
        assert!(!cb.is_open());
    }

    #[test]
    fn half_open_admits_single_probe() {
        let cb = CircuitBreaker::new(1, Duration::from_millis(0));
        cb.admit();
        cb.on_failure();
        assert!(cb.is_open());
        // open_timeout is zero, so the next admit transitions to half-open probe
        assert_eq!(cb.admit(), Admission::Probe);
        // a second concurrent caller is rejected while the probe is in flight
        assert_eq!(cb.admit(), Admission::Rejected);
    }

    #[test]
    fn half_open_success_closes_breaker() {
        let cb = CircuitBreaker::new(1, Duration::from_millis(0));
        cb.admit();
        cb.on_failure();
        assert_eq!(cb.admit(), Admission::Probe);
        cb.on_success();
        assert!(!cb.is_open());
        assert_eq!(cb.admit(), Admission::Allowed);
    }

    #[test]
    fn half_open_failure_reopens() {
        let cb = CircuitBreaker::new(1, Duration::from_millis(0));
        cb.admit();
        cb.on_failure();
        assert_eq!(cb.admit(), Admission::Probe);
        cb.on_failure();
        assert!(cb.is_open());
    }
}
