// SPDX-License-Identifier: Apache-2.0
//! Errors for object-storage and CDN clients.

/// Errors raised by `ObjectStore`/`CdnClient` implementations.
///
/// All of these are `Transient` in the sense of `spec.md` §7 — callers
/// (the circuit breaker in `avatar-coordinator`) decide whether to retry.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("object not found: {0}")]
    NotFound(String),

    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upstream returned status {status}: {body}")]
    UpstreamStatus { status: u16, body: String },

    #[error("signing error: {0}")]
    Signing(String),
}
