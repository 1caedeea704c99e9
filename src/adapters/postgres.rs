//! PostgreSQL video repository.

use crate::domain::video::{NewVideo, Video, VideoUpdate};
use crate::error::Result;
use crate::ports::VideoRepository;
use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

/// sqlx-backed implementation of [`VideoRepository`].
#[derive(Clone)]
pub struct PgVideoRepository {
    pool: PgPool,
}

impl PgVideoRepository {
    /// Connect with a bounded pool and run pending migrations.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(sqlx::Error::from)?;

        Ok(Self { pool })
    }

    /// Close the pool. Called on shutdown.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl VideoRepository for PgVideoRepository {
    async fn insert(&self, new: &NewVideo) -> Result<Video> {
        let video = sqlx::query_as::<_, Video>(
            "INSERT INTO videos (title, description, duration, storage_path) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, title, description, duration, storage_path, created_at, updated_at",
        )
        .bind(&new.title)
        .bind(&new.description)
        .bind(new.duration)
        .bind(&new.storage_path)
        .fetch_one(&self.pool)
        .await?;
        Ok(video)
    }

    async fn get(&self, id: i64) -> Result<Option<Video>> {
        let video = sqlx::query_as::<_, Video>(
            "SELECT id, title, description, duration, storage_path, created_at, updated_at \
             FROM videos WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(video)
    }

    async fn get_by_storage_path(&self, storage_path: &str) -> Result<Option<Video>> {
        let video = sqlx::query_as::<_, Video>(
            "SELECT id, title, description, duration, storage_path, created_at, updated_at \
             FROM videos WHERE storage_path = $1",
        )
        .bind(storage_path)
        .fetch_optional(&self.pool)
        .await?;
        Ok(video)
    }

    async fn list(&self, offset: i64, limit: i64) -> Result<Vec<Video>> {
        let videos = sqlx::query_as::<_, Video>(
            "SELECT id, title, description, duration, storage_path, created_at, updated_at \
             FROM videos ORDER BY id OFFSET $1 LIMIT $2",
        )
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(videos)
    }

    async fn update(&self, id: i64, changes: &VideoUpdate) -> Result<Option<Video>> {
        // Single statement so no partial field application is ever visible.
        let video = sqlx::query_as::<_, Video>(
            "UPDATE videos \
             SET title = $2, description = $3, duration = $4, \
                 storage_path = COALESCE($5, storage_path), updated_at = now() \
             WHERE id = $1 \
             RETURNING id, title, description, duration, storage_path, created_at, updated_at",
        )
        .bind(id)
        .bind(&changes.title)
        .bind(&changes.description)
        .bind(changes.duration)
        .bind(&changes.storage_path)
        .fetch_optional(&self.pool)
        .await?;
        Ok(video)
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM videos WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
