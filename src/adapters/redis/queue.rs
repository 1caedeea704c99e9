//! Redis `UploadQueue` implementation.
//!
//! Reliable-queue shape: producers LPUSH onto the pending list, workers
//! BLMOVE the oldest job into a processing list and LREM it only after the
//! outcome has been recorded. Jobs stranded in the processing list by a
//! crashed worker are swept back onto the pending list at startup, which is
//! what makes delivery at-least-once.

use super::pool::RedisPool;
use super::{RedisFailure, TASK_RESULT_TTL_SECS, TASK_STATUS_PREFIX, UPLOAD_PROCESSING, UPLOAD_QUEUE};
use crate::domain::task::{TaskStatus, UploadJob};
use crate::ports::UploadQueue;
use async_trait::async_trait;
use deadpool_redis::redis::{AsyncCommands, Direction};
use std::error::Error;

#[async_trait]
impl UploadQueue for RedisPool {
    async fn enqueue(&self, job: &UploadJob) -> Result<(), Box<dyn Error + Send + Sync>> {
        let mut conn = self.pool.get().await.map_err(RedisFailure::from)?;
        let json = serde_json::to_string(job).map_err(RedisFailure::from)?;
        conn.lpush::<_, _, ()>(UPLOAD_QUEUE, json)
            .await
            .map_err(RedisFailure::from)?;
        Ok(())
    }

    async fn dequeue(
        &self,
        timeout_secs: f64,
    ) -> Result<Option<UploadJob>, Box<dyn Error + Send + Sync>> {
        let mut conn = self.pool.get().await.map_err(RedisFailure::from)?;
        let json: Option<String> = conn
            .blmove(
                UPLOAD_QUEUE,
                UPLOAD_PROCESSING,
                Direction::Right,
                Direction::Left,
                timeout_secs,
            )
            .await
            .map_err(RedisFailure::from)?;
        match json {
            Some(raw) => Ok(Some(
                serde_json::from_str(&raw).map_err(RedisFailure::from)?,
            )),
            None => Ok(None),
        }
    }

    async fn ack(&self, job: &UploadJob) -> Result<(), Box<dyn Error + Send + Sync>> {
        let mut conn = self.pool.get().await.map_err(RedisFailure::from)?;
        let json = serde_json::to_string(job).map_err(RedisFailure::from)?;
        conn.lrem::<_, _, ()>(UPLOAD_PROCESSING, 1, json)
            .await
            .map_err(RedisFailure::from)?;
        Ok(())
    }

    async fn recover_stale(&self) -> Result<usize, Box<dyn Error + Send + Sync>> {
        let mut conn = self.pool.get().await.map_err(RedisFailure::from)?;
        let mut recovered = 0;
        loop {
            // Push to the consuming end so redelivered jobs run first.
            let moved: Option<String> = conn
                .lmove(
                    UPLOAD_PROCESSING,
                    UPLOAD_QUEUE,
                    Direction::Right,
                    Direction::Right,
                )
                .await
                .map_err(RedisFailure::from)?;
            if moved.is_none() {
                return Ok(recovered);
            }
            recovered += 1;
        }
    }

    async fn set_status(
        &self,
        task_id: &str,
        status: &TaskStatus,
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        let mut conn = self.pool.get().await.map_err(RedisFailure::from)?;
        let key = format!("{}{}", TASK_STATUS_PREFIX, task_id);
        let json = serde_json::to_string(status).map_err(RedisFailure::from)?;
        conn.set_ex::<_, _, ()>(&key, json, TASK_RESULT_TTL_SECS)
            .await
            .map_err(RedisFailure::from)?;
        Ok(())
    }

    async fn get_status(
        &self,
        task_id: &str,
    ) -> Result<Option<TaskStatus>, Box<dyn Error + Send + Sync>> {
        let mut conn = self.pool.get().await.map_err(RedisFailure::from)?;
        let key = format!("{}{}", TASK_STATUS_PREFIX, task_id);
        let json: Option<String> = conn.get(&key).await.map_err(RedisFailure::from)?;
        match json {
            Some(raw) => Ok(Some(
                serde_json::from_str(&raw).map_err(RedisFailure::from)?,
            )),
            None => Ok(None),
        }
    }
}
