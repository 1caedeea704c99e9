use crate::domain::video::{NewVideo, Video, VideoUpdate};
use crate::error::Result;
use async_trait::async_trait;

/// Persistence of video records.
///
/// `get`/`update`/`delete` report an absent id through `Option`/`bool`
/// rather than an error; the accessor decides what absence means.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VideoRepository: Send + Sync {
    /// Insert a record and return the stored row with its assigned id and
    /// timestamps.
    async fn insert(&self, new: &NewVideo) -> Result<Video>;

    async fn get(&self, id: i64) -> Result<Option<Video>>;

    /// Uncached lookup by the unique storage path.
    async fn get_by_storage_path(&self, storage_path: &str) -> Result<Option<Video>>;

    async fn list(&self, offset: i64, limit: i64) -> Result<Vec<Video>>;

    /// Apply all field changes in one statement; `None` when the id is
    /// absent. No partial application is visible on failure.
    async fn update(&self, id: i64, changes: &VideoUpdate) -> Result<Option<Video>>;

    /// Returns `true` when a row was removed.
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Cheap reachability probe.
    async fn ping(&self) -> Result<()>;
}
