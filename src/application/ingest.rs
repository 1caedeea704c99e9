//! Asynchronous upload ingestion.
//!
//! The HTTP layer parks the uploaded bytes in the temp area and enqueues an
//! [`UploadJob`]; a pool of workers finalizes each job out of band: move the
//! file into the durable area, insert the catalog record, invalidate the
//! list cache. Delivery is at-least-once, so processing tolerates re-running
//! a job whose temp file is already gone.

use crate::application::catalog::CatalogService;
use crate::domain::task::{TaskStatus, UploadJob};
use crate::domain::video::{NewVideo, Video};
use crate::error::{Error, Result};
use crate::ports::{BlobStore, ByteCache, UploadQueue, VideoRepository};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Blocking-dequeue window; workers re-poll after this many seconds.
pub const DEQUEUE_TIMEOUT_SECS: f64 = 5.0;

pub struct IngestService<R, C, B, Q> {
    catalog: Arc<CatalogService<R, C, B>>,
    queue: Q,
    blobs: B,
}

impl<R, C, B, Q> IngestService<R, C, B, Q>
where
    R: VideoRepository + 'static,
    C: ByteCache + 'static,
    B: BlobStore + Clone + 'static,
    Q: UploadQueue + 'static,
{
    pub fn new(catalog: Arc<CatalogService<R, C, B>>, queue: Q, blobs: B) -> Self {
        Self {
            catalog,
            queue,
            blobs,
        }
    }

    /// Worker loop: dequeue, process, record the outcome, acknowledge.
    ///
    /// The acknowledgment comes last so a worker that dies mid-job leaves
    /// the job claimable for redelivery instead of silently dropped.
    pub async fn run_worker_loop(&self, worker_id: usize) {
        info!(worker_id, "ingest worker started");
        loop {
            match self.queue.dequeue(DEQUEUE_TIMEOUT_SECS).await {
                Ok(Some(job)) => self.handle(worker_id, job).await,
                Ok(None) => continue,
                Err(e) => {
                    error!(worker_id, error = %e, "queue error while dequeuing");
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
            }
        }
    }

    async fn handle(&self, worker_id: usize, job: UploadJob) {
        info!(worker_id, task_id = %job.id, "processing upload");

        let status = match self.process(&job).await {
            Ok(video) => TaskStatus::Success { result: video },
            Err(e) => {
                warn!(worker_id, task_id = %job.id, error = %e, "upload failed");
                TaskStatus::Failure {
                    detail: e.to_string(),
                }
            }
        };

        if let Err(e) = self.queue.set_status(&job.id, &status).await {
            error!(task_id = %job.id, error = %e, "could not record task status");
        }
        if let Err(e) = self.queue.ack(&job).await {
            error!(task_id = %job.id, error = %e, "could not acknowledge job");
        }
    }

    /// Finalize one upload. Safe to re-run on the same job: the durable
    /// filename derives from the job id, so a redelivery lands on the path
    /// the first delivery used.
    pub async fn process(&self, job: &UploadJob) -> Result<Video> {
        let final_name = job.final_name();
        let final_path = self.blobs.durable_path(&final_name);
        let final_path_str = final_path.to_string_lossy().to_string();
        let temp_path = Path::new(&job.temp_path);

        if self.blobs.len(temp_path).await.is_err() {
            // The temp file is gone: either this job already completed, or
            // it crashed between the move and the insert. Redelivery must
            // finish the job, not fail it.
            if let Some(existing) = self.catalog.find_by_storage_path(&final_path_str).await? {
                info!(task_id = %job.id, "redelivered job was already finalized");
                return Ok(existing);
            }
            if self.blobs.len(&final_path).await.is_ok() {
                info!(task_id = %job.id, "resuming record insert for an already-moved file");
                return self.insert_record(job, &final_path_str).await;
            }
            return Err(Error::Task(format!(
                "temp file {} no longer exists and no finalized copy was found",
                job.temp_path
            )));
        }

        if let Err(e) = self.blobs.promote(temp_path, &final_name).await {
            // Failure before the move completed: drop the temp file.
            if let Err(re) = self.blobs.remove(temp_path).await {
                warn!(path = %job.temp_path, error = %re, "could not remove temp file");
            }
            return Err(Error::Io(e));
        }

        self.insert_record(job, &final_path_str).await
    }

    async fn insert_record(&self, job: &UploadJob, storage_path: &str) -> Result<Video> {
        let new = NewVideo {
            title: job.title.clone(),
            description: job.description.clone(),
            duration: job.duration,
            storage_path: storage_path.to_string(),
        };
        match self.catalog.create(&new).await {
            Ok(video) => Ok(video),
            Err(e) => {
                // Roll the moved file back out so nothing is orphaned.
                if let Err(re) = self.blobs.remove(Path::new(storage_path)).await {
                    warn!(
                        path = storage_path,
                        error = %re,
                        "could not remove finalized file after failed insert"
                    );
                }
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::catalog::LIST_KEY;
    use crate::ports::cache::MockByteCache;
    use crate::ports::queue::MockUploadQueue;
    use crate::ports::repository::MockVideoRepository;
    use chrono::Utc;
    use tempfile::TempDir;

    use crate::adapters::fs::FsBlobStore;

    fn stored_video(id: i64, storage_path: &str) -> Video {
        Video {
            id,
            title: "clip".into(),
            description: None,
            duration: 42,
            storage_path: storage_path.into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn invalidating_cache() -> MockByteCache {
        let mut cache = MockByteCache::new();
        cache
            .expect_del()
            .withf(|keys: &[String]| keys == [LIST_KEY.to_string()])
            .returning(|_| Ok(()));
        cache
    }

    struct Harness {
        _dir: TempDir,
        blobs: FsBlobStore,
        svc: IngestService<MockVideoRepository, MockByteCache, FsBlobStore, MockUploadQueue>,
    }

    fn harness(repo: MockVideoRepository, cache: MockByteCache) -> Harness {
        let dir = TempDir::new().unwrap();
        let blobs = FsBlobStore::new(dir.path().join("videos")).unwrap();
        let catalog = Arc::new(CatalogService::new(repo, cache, blobs.clone()));
        let svc = IngestService::new(catalog, MockUploadQueue::new(), blobs.clone());
        Harness {
            _dir: dir,
            blobs,
            svc,
        }
    }

    async fn job_with_temp_file(blobs: &FsBlobStore, content: &[u8]) -> UploadJob {
        let job = UploadJob::new(
            "clip".into(),
            None,
            42,
            String::new(),
            "holiday.mp4".into(),
        );
        let temp = blobs.temp_path(&format!("{}.mp4", job.id));
        tokio::fs::write(&temp, content).await.unwrap();
        UploadJob {
            temp_path: temp.to_string_lossy().to_string(),
            ..job
        }
    }

    #[tokio::test]
    async fn process_moves_the_file_and_creates_the_record() {
        let mut repo = MockVideoRepository::new();
        repo.expect_insert()
            .withf(|new: &NewVideo| new.title == "clip" && new.duration == 42)
            .return_once(|new| Ok(stored_video(1, &new.storage_path)));

        let h = harness(repo, invalidating_cache());
        let job = job_with_temp_file(&h.blobs, b"frame data").await;
        let final_path = h.blobs.durable_path(&job.final_name());

        let video = h.svc.process(&job).await.unwrap();

        assert_eq!(video.storage_path, final_path.to_string_lossy());
        assert!(!Path::new(&job.temp_path).exists());
        assert_eq!(tokio::fs::read(&final_path).await.unwrap(), b"frame data");
    }

    #[tokio::test]
    async fn failed_insert_rolls_the_moved_file_back_out() {
        let mut repo = MockVideoRepository::new();
        repo.expect_insert()
            .return_once(|_| Err(Error::Store(sqlx::Error::PoolClosed)));

        let mut cache = MockByteCache::new();
        cache.expect_del().never();

        let h = harness(repo, cache);
        let job = job_with_temp_file(&h.blobs, b"frame data").await;
        let final_path = h.blobs.durable_path(&job.final_name());

        let err = h.svc.process(&job).await.expect_err("insert should fail");

        assert!(matches!(err, Error::Store(_)));
        assert!(!final_path.exists());
        assert!(!Path::new(&job.temp_path).exists());
    }

    #[tokio::test]
    async fn redelivery_with_existing_record_is_a_noop_success() {
        let job = UploadJob::new(
            "clip".into(),
            None,
            42,
            "/nonexistent/temp.mp4".into(),
            "holiday.mp4".into(),
        );

        let mut repo = MockVideoRepository::new();
        let final_name = job.final_name();
        repo.expect_get_by_storage_path()
            .withf(move |path: &str| path.ends_with(&final_name))
            .return_once(|path| Ok(Some(stored_video(9, path))));
        repo.expect_insert().never();

        let h = harness(repo, MockByteCache::new());
        let video = h.svc.process(&job).await.unwrap();
        assert_eq!(video.id, 9);
    }

    #[tokio::test]
    async fn redelivery_after_crash_between_move_and_insert_resumes() {
        let mut repo = MockVideoRepository::new();
        repo.expect_get_by_storage_path().return_once(|_| Ok(None));
        repo.expect_insert()
            .return_once(|new| Ok(stored_video(3, &new.storage_path)));

        let h = harness(repo, invalidating_cache());
        let job = UploadJob::new(
            "clip".into(),
            None,
            42,
            "/nonexistent/temp.mp4".into(),
            "holiday.mp4".into(),
        );
        // the previous delivery moved the file but died before the insert
        let final_path = h.blobs.durable_path(&job.final_name());
        tokio::fs::write(&final_path, b"already moved").await.unwrap();

        let video = h.svc.process(&job).await.unwrap();

        assert_eq!(video.id, 3);
        assert!(final_path.exists());
    }

    #[tokio::test]
    async fn redelivery_with_nothing_left_fails_the_task() {
        let mut repo = MockVideoRepository::new();
        repo.expect_get_by_storage_path().return_once(|_| Ok(None));
        repo.expect_insert().never();

        let h = harness(repo, MockByteCache::new());
        let job = UploadJob::new(
            "clip".into(),
            None,
            42,
            "/nonexistent/temp.mp4".into(),
            "holiday.mp4".into(),
        );

        assert!(matches!(
            h.svc.process(&job).await,
            Err(Error::Task(_))
        ));
    }
}
