// SPDX-License-Identifier: Apache-2.0
//! Render coordinator (`spec.md` §2 C5): single-flight de-dup, bounded
//! priority queue, fixed worker pool, retries, and a circuit breaker
//! guarding the result cache's remote writes.

mod coordinator;
mod error;
mod events;
mod job;
mod queue;
mod renderer;

pub use coordinator::{CoordinatorConfig, RenderCoordinator, RenderOutcome};
pub use error::CoordinatorError;
pub use events::JobEvent;
pub use job::{DedupKey, JobKind};
pub use renderer::{RenderError, Renderer};
