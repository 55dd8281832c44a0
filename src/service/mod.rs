//! HTTP handlers for anflux.

pub mod note;
pub mod query;
pub mod stream;
pub mod watch;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::storage::{PointError, StoreError};

/// Error returned by request handlers.
///
/// Server-side failures are logged when converted into a response; client
/// errors are not.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Failed to create point: {0}")]
    InvalidPoint(#[from] PointError),

    #[error("Failed to write point: {0}")]
    Write(StoreError),

    #[error("Failed to execute query: {0}")]
    Query(StoreError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::InvalidPoint(_) => StatusCode::BAD_REQUEST,
            ApiError::Write(_) | ApiError::Query(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), "{message}");
        }
        (status, message).into_response()
    }
}

/// Handle GET /health.
pub async fn handle_health() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
