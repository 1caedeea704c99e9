//! Error taxonomy for the catalog, ingestion, and streaming paths.
//!
//! Callers pattern-match on the variant instead of catching exceptions;
//! the HTTP layer maps each kind to a status code via [`IntoResponse`].

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("video {0} not found")]
    NotFound(i64),

    #[error("{0}")]
    Validation(String),

    /// Range start lies at or beyond the end of the resource.
    #[error("range start {start} is beyond the resource size {size}")]
    UnsatisfiableRange { start: u64, size: u64 },

    /// Record store failure. Retryable by the caller.
    #[error("store error: {0}")]
    Store(#[from] sqlx::Error),

    /// Bounded-retry exhaustion or upstream timeout. Retryable.
    #[error("{0}")]
    Transient(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("queue error: {0}")]
    Queue(String),

    /// Ingestion worker failure, retrieved through task polling.
    #[error("upload task failed: {0}")]
    Task(String),
}

impl Error {
    pub fn status(&self) -> StatusCode {
        match self {
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::UnsatisfiableRange { .. } => StatusCode::RANGE_NOT_SATISFIABLE,
            Error::Store(_) | Error::Transient(_) => StatusCode::SERVICE_UNAVAILABLE,
            Error::Io(_) | Error::Queue(_) | Error::Task(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(serde_json::json!({ "detail": self.to_string() }));

        if let Error::UnsatisfiableRange { size, .. } = self {
            return (
                status,
                [(header::CONTENT_RANGE, format!("bytes */{}", size))],
                body,
            )
                .into_response();
        }

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_follows_taxonomy() {
        assert_eq!(Error::NotFound(3).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            Error::Validation("bad".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::UnsatisfiableRange { start: 10, size: 5 }.status(),
            StatusCode::RANGE_NOT_SATISFIABLE
        );
        assert_eq!(
            Error::Transient("down".into()).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            Error::Task("boom".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
