use crate::domain::video::Video;
use crate::error::Result;
use async_trait::async_trait;

/// Boundary the streaming engine resolves ids through. In this deployment
/// it is the cache-aside accessor; behind a service split it would be an
/// HTTP client against the catalog.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MetadataSource: Send + Sync {
    async fn resolve(&self, id: i64) -> Result<Video>;
}
