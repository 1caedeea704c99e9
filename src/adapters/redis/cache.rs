//! Redis `ByteCache` implementation.

use super::pool::RedisPool;
use super::RedisFailure;
use crate::ports::ByteCache;
use async_trait::async_trait;
use deadpool_redis::redis::AsyncCommands;
use std::error::Error;

#[async_trait]
impl ByteCache for RedisPool {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, Box<dyn Error + Send + Sync>> {
        let mut conn = self.pool.get().await.map_err(RedisFailure::from)?;
        let value: Option<Vec<u8>> = conn.get(key).await.map_err(RedisFailure::from)?;
        Ok(value)
    }

    async fn set_ex(
        &self,
        key: &str,
        value: &[u8],
        ttl_secs: u64,
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        let mut conn = self.pool.get().await.map_err(RedisFailure::from)?;
        conn.set_ex::<_, _, ()>(key, value, ttl_secs)
            .await
            .map_err(RedisFailure::from)?;
        Ok(())
    }

    async fn del(&self, keys: &[String]) -> Result<(), Box<dyn Error + Send + Sync>> {
        if keys.is_empty() {
            return Ok(());
        }
        let mut conn = self.pool.get().await.map_err(RedisFailure::from)?;
        conn.del::<_, ()>(keys).await.map_err(RedisFailure::from)?;
        Ok(())
    }
}
