//! Range-addressable streaming engine.
//!
//! Resolves an id to its backing file through the metadata boundary, then
//! serves either the whole file or a clamped byte range. Ranged reads go
//! through a segment cache keyed by `(id, start, end)`; the buffer read on
//! a miss is the one that is both cached and returned, so the cached bytes
//! can never diverge from the bytes sent.

use crate::domain::range::ByteRange;
use crate::error::{Error, Result};
use crate::ports::{BlobStore, ByteCache, MetadataSource};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// TTL for cached byte segments.
pub const SEGMENT_TTL_SECS: u64 = 600;

pub fn segment_key(id: i64, start: u64, end: u64) -> String {
    format!("video:{}:range:{}:{}", id, start, end)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
}

impl CacheStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
        }
    }
}

/// What the HTTP layer should send back.
#[derive(Debug)]
pub enum ServeReply {
    /// Whole file, streamed from disk by the caller.
    Full {
        path: PathBuf,
        size: u64,
        content_type: String,
    },
    /// One byte segment, already in memory.
    Partial {
        body: Vec<u8>,
        start: u64,
        end: u64,
        size: u64,
        content_type: String,
        cache: CacheStatus,
    },
}

pub struct StreamService<M, C, B> {
    metadata: Arc<M>,
    cache: C,
    blobs: B,
    /// Bound on the metadata lookup only; the byte transfer itself is
    /// unbounded.
    metadata_timeout: Duration,
}

impl<M, C, B> StreamService<M, C, B>
where
    M: MetadataSource,
    C: ByteCache,
    B: BlobStore,
{
    pub fn new(metadata: Arc<M>, cache: C, blobs: B, metadata_timeout: Duration) -> Self {
        Self {
            metadata,
            cache,
            blobs,
            metadata_timeout,
        }
    }

    pub async fn serve(&self, id: i64, range_header: Option<&str>) -> Result<ServeReply> {
        let video = match tokio::time::timeout(self.metadata_timeout, self.metadata.resolve(id))
            .await
        {
            Ok(resolved) => resolved?,
            Err(_) => {
                return Err(Error::Transient(format!(
                    "metadata lookup for video {} timed out",
                    id
                )))
            }
        };

        let path = PathBuf::from(&video.storage_path);
        let size = match self.blobs.len(&path).await {
            Ok(size) => size,
            Err(e) => {
                warn!(id, path = %video.storage_path, error = %e, "backing file missing");
                return Err(Error::NotFound(id));
            }
        };
        let content_type = mime_guess::from_path(&path)
            .first_or_octet_stream()
            .to_string();

        let Some(header) = range_header else {
            return Ok(ServeReply::Full {
                path,
                size,
                content_type,
            });
        };

        let range = ByteRange::parse(header, size)?;
        let key = segment_key(id, range.start, range.end);

        match self.cache.get(&key).await {
            Ok(Some(body)) => {
                debug!(key, "segment cache hit");
                return Ok(ServeReply::Partial {
                    body,
                    start: range.start,
                    end: range.end,
                    size,
                    content_type,
                    cache: CacheStatus::Hit,
                });
            }
            Ok(None) => {}
            Err(e) => {
                warn!(key, error = %e, "segment cache read failed, serving from disk")
            }
        }

        let body = self
            .blobs
            .read_range(&path, range.start, range.length())
            .await?;
        if let Err(e) = self.cache.set_ex(&key, &body, SEGMENT_TTL_SECS).await {
            warn!(key, error = %e, "segment cache fill failed");
        }

        Ok(ServeReply::Partial {
            body,
            start: range.start,
            end: range.end,
            size,
            content_type,
            cache: CacheStatus::Miss,
        })
    }
}
