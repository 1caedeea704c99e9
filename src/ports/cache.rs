use async_trait::async_trait;
use std::error::Error;

/// Shared key-value cache with per-key expiry. Values are opaque bytes;
/// callers own serialization.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ByteCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, Box<dyn Error + Send + Sync>>;

    async fn set_ex(
        &self,
        key: &str,
        value: &[u8],
        ttl_secs: u64,
    ) -> Result<(), Box<dyn Error + Send + Sync>>;

    /// Delete the given keys. Missing keys are not an error.
    async fn del(&self, keys: &[String]) -> Result<(), Box<dyn Error + Send + Sync>>;
}
