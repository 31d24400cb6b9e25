// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum CoordinatorError {
    #[error("render queue is full")]
    Overloaded,

    #[error("render timed out")]
    Timeout,

    #[error("a dependency's circuit breaker is open")]
    DependencyOpen,

    #[error("transient render failure: {0}")]
    Transient(String),

    #[error("internal coordinator error: {0}")]
    Internal(String),

    #[error("cancelled: {0}")]
    Cancelled(String),
}
