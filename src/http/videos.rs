//! Catalog endpoints: list, detail, upload, task polling, update, delete.

use super::AppState;
use crate::domain::task::{file_extension, TaskStatus, UploadJob};
use crate::domain::video::{duration_in_bounds, Video, VideoUpdate, MAX_DURATION};
use crate::error::{Error, Result};
use crate::ports::{BlobStore, UploadQueue};
use axum::body::Bytes;
use axum::extract::{Multipart, Path, State};
use axum::http::{header, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{BoxError, Json};
use futures::{Stream, TryStreamExt};
use std::io;
use std::path::{Path as FsPath, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio_util::io::StreamReader;
use tracing::warn;
use uuid::Uuid;

/// The service owns its caching; downstream HTTP caches must stay out.
fn no_store() -> [(HeaderName, HeaderValue); 3] {
    [
        (
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-cache, no-store, must-revalidate"),
        ),
        (header::PRAGMA, HeaderValue::from_static("no-cache")),
        (header::EXPIRES, HeaderValue::from_static("0")),
    ]
}

pub async fn list(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let videos = state.catalog.list().await?;
    Ok((no_store(), Json(videos)))
}

pub async fn detail(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let video = state.catalog.get(id).await?;
    Ok((no_store(), Json(video)))
}

/// Accept a multipart upload, park the file in the temp area, and enqueue
/// the finalize job. Returns 202 with the task id for polling.
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    let mut title: Option<String> = None;
    let mut description: Option<String> = None;
    let mut duration: Option<i32> = None;
    let mut upload: Option<(PathBuf, String)> = None;

    // A field may fail after the file was already parked in the temp area;
    // the parked file must not outlive a failed request.
    let parsed: Result<()> = async {
        while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "title" => title = Some(field.text().await.map_err(bad_multipart)?),
                "description" => {
                    let text = field.text().await.map_err(bad_multipart)?;
                    description = (!text.is_empty()).then_some(text);
                }
                "duration" => {
                    let text = field.text().await.map_err(bad_multipart)?;
                    duration = Some(text.trim().parse().map_err(|_| {
                        Error::Validation("duration must be an integer".into())
                    })?);
                }
                "file" => {
                    let original = field
                        .file_name()
                        .map(str::to_owned)
                        .unwrap_or_else(|| String::from("upload"));
                    let temp_name = format!("{}{}", Uuid::new_v4(), file_extension(&original));
                    let path = state.blobs.temp_path(&temp_name);
                    stream_to_file(&path, field).await?;
                    upload = Some((path, original));
                }
                _ => {}
            }
        }
        Ok(())
    }
    .await;

    if let Err(e) = parsed {
        if let Some((path, _)) = &upload {
            let _ = tokio::fs::remove_file(path).await;
        }
        return Err(e);
    }

    let Some((temp_path, original_filename)) = upload else {
        return Err(Error::Validation("file field is required".into()));
    };

    let job = match validated_job(title, description, duration, &temp_path, original_filename) {
        Ok(job) => job,
        Err(e) => {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(e);
        }
    };

    if let Err(e) = state.queue.set_status(&job.id, &TaskStatus::Pending).await {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(Error::Queue(e.to_string()));
    }
    if let Err(e) = state.queue.enqueue(&job).await {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(Error::Queue(e.to_string()));
    }

    Ok((
        StatusCode::ACCEPTED,
        Json(serde_json::json!({
            "message": "upload received, processing in the background",
            "task_id": job.id,
        })),
    ))
}

pub async fn task_status(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Response> {
    match state.queue.get_status(&task_id).await {
        Ok(Some(TaskStatus::Failure { detail })) => Err(Error::Task(detail)),
        Ok(Some(status)) => Ok(Json(status).into_response()),
        // unknown or expired ids poll as still pending
        Ok(None) => Ok(Json(TaskStatus::Pending).into_response()),
        Err(e) => Err(Error::Queue(e.to_string())),
    }
}

/// Update metadata and optionally replace the backing file. The replacement
/// is durably written first, the record is committed to the new path, and
/// only then is the old file removed, so the record never points at a
/// missing file.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    mut multipart: Multipart,
) -> Result<Json<Video>> {
    let current = state.catalog.get(id).await?;

    let mut title: Option<String> = None;
    let mut description: Option<String> = None;
    let mut duration: Option<i32> = None;
    let mut new_file: Option<PathBuf> = None;

    let parsed: Result<()> = async {
        while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "title" => title = Some(field.text().await.map_err(bad_multipart)?),
                "description" => {
                    let text = field.text().await.map_err(bad_multipart)?;
                    description = (!text.is_empty()).then_some(text);
                }
                "duration" => {
                    let text = field.text().await.map_err(bad_multipart)?;
                    duration = Some(text.trim().parse().map_err(|_| {
                        Error::Validation("duration must be an integer".into())
                    })?);
                }
                "file" => {
                    let Some(original) = field.file_name().map(str::to_owned) else {
                        continue;
                    };
                    if original.is_empty() {
                        continue;
                    }
                    let file_name =
                        format!("{}_{}{}", id, Uuid::new_v4(), file_extension(&original));
                    let path = state.blobs.durable_path(&file_name);
                    stream_to_file(&path, field).await?;
                    new_file = Some(path);
                }
                _ => {}
            }
        }
        Ok(())
    }
    .await;

    if let Err(e) = parsed {
        if let Some(path) = &new_file {
            let _ = tokio::fs::remove_file(path).await;
        }
        return Err(e);
    }

    let changes = VideoUpdate {
        title: title.map(|t| t.trim().to_string()).unwrap_or_default(),
        description,
        duration: duration.unwrap_or(-1),
        storage_path: new_file
            .as_ref()
            .map(|path| path.to_string_lossy().to_string()),
    };

    if changes.title.is_empty() || !duration_in_bounds(changes.duration) {
        if let Some(path) = &new_file {
            let _ = tokio::fs::remove_file(path).await;
        }
        return Err(Error::Validation(format!(
            "title must be non-empty and duration within [0, {}]",
            MAX_DURATION
        )));
    }

    let updated = match state.catalog.update(id, &changes).await {
        Ok(video) => video,
        Err(e) => {
            if let Some(path) = &new_file {
                let _ = tokio::fs::remove_file(path).await;
            }
            return Err(e);
        }
    };

    if new_file.is_some() && updated.storage_path != current.storage_path {
        if let Err(e) = state
            .blobs
            .remove(FsPath::new(&current.storage_path))
            .await
        {
            warn!(path = %current.storage_path, error = %e, "could not remove replaced file");
        }
    }

    Ok(Json(updated))
}

pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>> {
    state.catalog.delete(id).await?;
    Ok(Json(serde_json::json!({ "detail": "deleted" })))
}

fn bad_multipart(err: axum::extract::multipart::MultipartError) -> Error {
    Error::Validation(format!("invalid multipart payload: {}", err))
}

fn validated_job(
    title: Option<String>,
    description: Option<String>,
    duration: Option<i32>,
    temp_path: &FsPath,
    original_filename: String,
) -> Result<UploadJob> {
    let title = title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| Error::Validation("title must be a non-empty string".into()))?;
    let duration =
        duration.ok_or_else(|| Error::Validation("duration field is required".into()))?;
    if !duration_in_bounds(duration) {
        return Err(Error::Validation(format!(
            "duration must be within [0, {}]",
            MAX_DURATION
        )));
    }
    Ok(UploadJob::new(
        title,
        description,
        duration,
        temp_path.to_string_lossy().to_string(),
        original_filename,
    ))
}

// Save a `Stream` to a file, removing the partial file on failure.
async fn stream_to_file<S, E>(path: &FsPath, stream: S) -> Result<()>
where
    S: Stream<Item = std::result::Result<Bytes, E>>,
    E: Into<BoxError>,
{
    let write = async {
        let body_with_io_error = stream.map_err(|err| io::Error::new(io::ErrorKind::Other, err));
        let body_reader = StreamReader::new(body_with_io_error);
        futures::pin_mut!(body_reader);

        let mut file = BufWriter::new(File::create(path).await?);
        tokio::io::copy(&mut body_reader, &mut file).await?;
        file.flush().await?;

        Ok::<_, io::Error>(())
    }
    .await;

    if let Err(err) = write {
        let _ = tokio::fs::remove_file(path).await;
        return Err(Error::Io(err));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use futures::stream;
    use std::fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn stream_to_file_writes_the_payload() {
        let temp_dir = tempdir().unwrap();
        let file_path = temp_dir.path().join("upload.bin");

        type E = std::io::Error;
        let payload = "some video bytes";
        let mock_stream = stream::iter(vec![Ok::<Bytes, E>(Bytes::from(payload))]);

        stream_to_file(&file_path, mock_stream).await.unwrap();

        assert_eq!(fs::read_to_string(&file_path).unwrap(), payload);
    }

    #[tokio::test]
    async fn stream_to_file_removes_the_partial_file_on_error() {
        let temp_dir = tempdir().unwrap();
        let file_path = temp_dir.path().join("upload.bin");

        let mock_stream = stream::iter(vec![
            Ok::<Bytes, &str>(Bytes::from("partial")),
            Err("connection reset"),
        ]);

        let result = stream_to_file(&file_path, mock_stream).await;

        assert!(matches!(result, Err(Error::Io(_))));
        assert!(!file_path.exists());
    }

    #[test]
    fn validated_job_requires_title_and_bounded_duration() {
        let temp = FsPath::new("/tmp/x.mp4");

        let ok = validated_job(
            Some("clip".into()),
            None,
            Some(9999),
            temp,
            "clip.mp4".into(),
        )
        .unwrap();
        assert_eq!(ok.title, "clip");
        assert_eq!(ok.duration, 9999);

        assert!(matches!(
            validated_job(Some("  ".into()), None, Some(10), temp, "c.mp4".into()),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            validated_job(Some("clip".into()), None, None, temp, "c.mp4".into()),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            validated_job(Some("clip".into()), None, Some(10000), temp, "c.mp4".into()),
            Err(Error::Validation(_))
        ));
    }
}
