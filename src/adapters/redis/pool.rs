//! Redis connection pool.

use super::RedisFailure;
use deadpool_redis::{Config, Pool, Runtime};

/// Redis-backed adapter for the cache and the upload queue.
#[derive(Clone)]
pub struct RedisPool {
    pub(super) pool: Pool,
}

impl RedisPool {
    pub fn new(redis_url: &str) -> Result<Self, RedisFailure> {
        let cfg = Config::from_url(redis_url);
        let pool = cfg.create_pool(Some(Runtime::Tokio1))?;
        Ok(Self { pool })
    }
}
