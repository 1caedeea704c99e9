//! Cache-aside accessor for video metadata.
//!
//! Reads prefer the cache and fall back to the record store, populating the
//! cache on miss. Every write deletes the affected cache keys after the
//! store commit, so a reader can never observe a stale value right after a
//! committed write. A cache outage degrades reads to always-miss; it never
//! fails a request on its own.

use crate::domain::video::{NewVideo, Video, VideoUpdate};
use crate::error::{Error, Result};
use crate::ports::{BlobStore, ByteCache, MetadataSource, VideoRepository};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use std::time::Duration;
use tracing::warn;

/// TTL for whole-record and list cache entries.
pub const METADATA_TTL_SECS: u64 = 3600;

/// Cache key for the canonical list page.
pub const LIST_KEY: &str = "videos_list";

/// The list cache is keyed independently of paging, so only one page shape
/// is cacheable; this is the canonical window all callers use.
pub const LIST_OFFSET: i64 = 0;
pub const LIST_LIMIT: i64 = 100;

pub fn video_key(id: i64) -> String {
    format!("video:{}", id)
}

pub struct CatalogService<R, C, B> {
    repo: R,
    cache: C,
    blobs: B,
}

impl<R, C, B> CatalogService<R, C, B>
where
    R: VideoRepository,
    C: ByteCache,
    B: BlobStore,
{
    pub fn new(repo: R, cache: C, blobs: B) -> Self {
        Self { repo, cache, blobs }
    }

    pub async fn get(&self, id: i64) -> Result<Video> {
        let key = video_key(id);
        if let Some(video) = self.cache_read::<Video>(&key).await {
            return Ok(video);
        }

        let video = self.repo.get(id).await?.ok_or(Error::NotFound(id))?;
        self.cache_fill(&key, &video).await;
        Ok(video)
    }

    pub async fn list(&self) -> Result<Vec<Video>> {
        if let Some(videos) = self.cache_read::<Vec<Video>>(LIST_KEY).await {
            return Ok(videos);
        }

        let videos = self.repo.list(LIST_OFFSET, LIST_LIMIT).await?;
        self.cache_fill(LIST_KEY, &videos).await;
        Ok(videos)
    }

    pub async fn create(&self, new: &NewVideo) -> Result<Video> {
        let video = self.repo.insert(new).await?;
        self.invalidate(&[LIST_KEY.to_string()]).await;
        Ok(video)
    }

    pub async fn update(&self, id: i64, changes: &VideoUpdate) -> Result<Video> {
        let video = self
            .repo
            .update(id, changes)
            .await?
            .ok_or(Error::NotFound(id))?;
        self.invalidate(&[video_key(id), LIST_KEY.to_string()]).await;
        Ok(video)
    }

    /// Delete a record, its cache entries, and its backing file.
    ///
    /// Cache keys go first so the record cannot stay reachable through the
    /// cache once it stops being reachable through the store. File removal
    /// is best-effort; the row is deleted regardless.
    pub async fn delete(&self, id: i64) -> Result<()> {
        let video = self.repo.get(id).await?.ok_or(Error::NotFound(id))?;

        self.invalidate(&[video_key(id), LIST_KEY.to_string()]).await;

        if let Err(e) = self.blobs.remove(Path::new(&video.storage_path)).await {
            warn!(path = %video.storage_path, error = %e, "could not remove backing file");
        }

        self.repo.delete(id).await?;
        Ok(())
    }

    /// Uncached lookup used by the ingestion idempotency guard.
    pub async fn find_by_storage_path(&self, storage_path: &str) -> Result<Option<Video>> {
        self.repo.get_by_storage_path(storage_path).await
    }

    /// Probe the record store, retrying a fixed number of times with a
    /// fixed backoff before reporting a transient failure.
    pub async fn ping_with_retry(&self, attempts: u32, backoff: Duration) -> Result<()> {
        let mut last_error = String::from("no probe attempted");
        for attempt in 1..=attempts {
            match self.repo.ping().await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    warn!(attempt, error = %e, "store probe failed");
                    last_error = e.to_string();
                    if attempt < attempts {
                        tokio::time::sleep(backoff).await;
                    }
                }
            }
        }
        Err(Error::Transient(format!(
            "store unreachable after {} attempts: {}",
            attempts, last_error
        )))
    }

    async fn cache_read<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.cache.get(key).await {
            Ok(Some(raw)) => match serde_json::from_slice(&raw) {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!(key, error = %e, "undecodable cache entry, treating as miss");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(key, error = %e, "cache read failed, falling through to store");
                None
            }
        }
    }

    async fn cache_fill<T: Serialize>(&self, key: &str, value: &T) {
        let raw = match serde_json::to_vec(value) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key, error = %e, "could not serialize cache value");
                return;
            }
        };
        if let Err(e) = self.cache.set_ex(key, &raw, METADATA_TTL_SECS).await {
            warn!(key, error = %e, "cache fill failed");
        }
    }

    async fn invalidate(&self, keys: &[String]) {
        if let Err(e) = self.cache.del(keys).await {
            warn!(?keys, error = %e, "cache invalidation failed");
        }
    }
}

#[async_trait]
impl<R, C, B> MetadataSource for CatalogService<R, C, B>
where
    R: VideoRepository,
    C: ByteCache,
    B: BlobStore,
{
    async fn resolve(&self, id: i64) -> Result<Video> {
        self.get(id).await
    }
}
