//! Redis adapter.
//!
//! One shared connection pool backs both ports:
//! - `ByteCache` for metadata records and byte segments
//! - `UploadQueue` for the ingestion work queue and task statuses
//!
//! The metadata/segment cache keys (`video:{id}`, `videos_list`,
//! `video:{id}:range:{start}:{end}`) live in the application layer; only
//! queue plumbing keys are namespaced here.

mod cache;
mod pool;
mod queue;

pub use pool::RedisPool;

use std::fmt;

/// Pending upload jobs, pushed by the HTTP layer.
const UPLOAD_QUEUE: &str = "fellini:upload_jobs";
/// Jobs currently owned by a worker; drained back on startup recovery.
const UPLOAD_PROCESSING: &str = "fellini:upload_jobs:processing";
const TASK_STATUS_PREFIX: &str = "fellini:task:";
/// Task results stay pollable for a day.
const TASK_RESULT_TTL_SECS: u64 = 86_400;

pub type RedisError = deadpool_redis::redis::RedisError;
pub type PoolError = deadpool_redis::PoolError;

#[derive(Debug)]
pub enum RedisFailure {
    CreatePool(String),
    Pool(PoolError),
    Command(RedisError),
    Codec(serde_json::Error),
}

impl fmt::Display for RedisFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RedisFailure::CreatePool(e) => write!(f, "redis pool creation failed: {}", e),
            RedisFailure::Pool(e) => write!(f, "redis pool error: {}", e),
            RedisFailure::Command(e) => write!(f, "redis command failed: {}", e),
            RedisFailure::Codec(e) => write!(f, "redis payload codec error: {}", e),
        }
    }
}

impl std::error::Error for RedisFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RedisFailure::CreatePool(_) => None,
            RedisFailure::Pool(e) => Some(e),
            RedisFailure::Command(e) => Some(e),
            RedisFailure::Codec(e) => Some(e),
        }
    }
}

impl From<deadpool_redis::CreatePoolError> for RedisFailure {
    fn from(err: deadpool_redis::CreatePoolError) -> Self {
        RedisFailure::CreatePool(format!("{}", err))
    }
}

impl From<PoolError> for RedisFailure {
    fn from(err: PoolError) -> Self {
        RedisFailure::Pool(err)
    }
}

impl From<RedisError> for RedisFailure {
    fn from(err: RedisError) -> Self {
        RedisFailure::Command(err)
    }
}

impl From<serde_json::Error> for RedisFailure {
    fn from(err: serde_json::Error) -> Self {
        RedisFailure::Codec(err)
    }
}
