//! Byte streaming endpoint.

use super::AppState;
use crate::application::streaming::ServeReply;
use crate::error::{Error, Result};
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, HeaderName, StatusCode};
use axum::response::Response;
use std::io;
use tokio::fs::File;
use tokio_util::io::ReaderStream;

static CACHE_STATUS: HeaderName = HeaderName::from_static("x-cache-status");

pub async fn serve(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<Response> {
    let range = headers
        .get(header::RANGE)
        .and_then(|value| value.to_str().ok());

    match state.streamer.serve(id, range).await? {
        ServeReply::Full {
            path,
            size,
            content_type,
        } => {
            let file = File::open(&path).await?;
            let body = Body::from_stream(ReaderStream::new(file));
            Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, content_type)
                .header(header::CONTENT_LENGTH, size.to_string())
                .header(header::ACCEPT_RANGES, "bytes")
                .body(body)
                .map_err(into_io_error)
        }
        ServeReply::Partial {
            body,
            start,
            end,
            size,
            content_type,
            cache,
        } => Response::builder()
            .status(StatusCode::PARTIAL_CONTENT)
            .header(header::CONTENT_TYPE, content_type)
            .header(
                header::CONTENT_RANGE,
                format!("bytes {}-{}/{}", start, end, size),
            )
            .header(header::ACCEPT_RANGES, "bytes")
            .header(header::CONTENT_LENGTH, body.len().to_string())
            .header(&CACHE_STATUS, cache.as_str())
            .body(Body::from(body))
            .map_err(into_io_error),
    }
}

fn into_io_error(err: axum::http::Error) -> Error {
    Error::Io(io::Error::new(io::ErrorKind::Other, err))
}
