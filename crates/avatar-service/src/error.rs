// SPDX-License-Identifier: Apache-2.0
//! Maps every core error kind (`spec.md` §7) onto an HTTP response.

use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("unknown user")]
    NotFound,

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("upstream dependency unavailable")]
    Transient,

    #[error("render queue is overloaded")]
    Overloaded,

    #[error("render timed out")]
    Timeout,

    #[error("a dependency's circuit breaker is open")]
    DependencyOpen,

    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Transient => StatusCode::BAD_GATEWAY,
            ApiError::Overloaded => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ApiError::DependencyOpen => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(ErrorBody { error: self.to_string() });
        let mut response = (status, body).into_response();
        if matches!(self, ApiError::Overloaded) {
            response.headers_mut().insert("Retry-After", HeaderValue::from_static("5"));
        }
        response
    }
}

impl From<avatar_coordinator::CoordinatorError> for ApiError {
    fn from(err: avatar_coordinator::CoordinatorError) -> Self {
        match err {
            avatar_coordinator::CoordinatorError::Overloaded => ApiError::Overloaded,
            avatar_coordinator::CoordinatorError::Timeout => ApiError::Timeout,
            avatar_coordinator::CoordinatorError::DependencyOpen => ApiError::DependencyOpen,
            avatar_coordinator::CoordinatorError::Transient(_) => ApiError::Transient,
            avatar_coordinator::CoordinatorError::Internal(msg) => ApiError::Internal(msg),
            avatar_coordinator::CoordinatorError::Cancelled(_) => ApiError::Transient,
        }
    }
}
