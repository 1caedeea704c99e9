use crate::domain::task::{TaskStatus, UploadJob};
use async_trait::async_trait;
use std::error::Error;

/// Work queue for upload finalization, with at-least-once delivery and
/// task-status persistence.
///
/// A dequeued job stays owned by the worker until [`ack`](UploadQueue::ack)
/// is called after processing (late acknowledgment); unacked jobs from a
/// crashed worker are put back by [`recover_stale`](UploadQueue::recover_stale).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UploadQueue: Send + Sync {
    async fn enqueue(&self, job: &UploadJob) -> Result<(), Box<dyn Error + Send + Sync>>;

    /// Blocking dequeue. `timeout_secs: 0.0` blocks indefinitely.
    async fn dequeue(
        &self,
        timeout_secs: f64,
    ) -> Result<Option<UploadJob>, Box<dyn Error + Send + Sync>>;

    /// Acknowledge a processed job, releasing queue ownership.
    async fn ack(&self, job: &UploadJob) -> Result<(), Box<dyn Error + Send + Sync>>;

    /// Move jobs abandoned mid-processing back onto the queue. Returns the
    /// number of redelivered jobs.
    async fn recover_stale(&self) -> Result<usize, Box<dyn Error + Send + Sync>>;

    async fn set_status(
        &self,
        task_id: &str,
        status: &TaskStatus,
    ) -> Result<(), Box<dyn Error + Send + Sync>>;

    async fn get_status(
        &self,
        task_id: &str,
    ) -> Result<Option<TaskStatus>, Box<dyn Error + Send + Sync>>;
}
