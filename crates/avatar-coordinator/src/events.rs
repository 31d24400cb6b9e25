// SPDX-License-Identifier: Apache-2.0
//! Observable events (`spec.md` §4.5): the only telemetry surface the spec
//! mandates. Consumers subscribe via [`tokio::sync::broadcast`]; a lagging
//! or absent subscriber never blocks job execution.

use crate::job::DedupKey;

#[derive(Debug, Clone)]
pub enum JobEvent {
    Added(DedupKey),
    Completed(DedupKey),
    Retried { key: DedupKey, attempt: u32 },
    Failed { key: DedupKey, reason: String },
}
