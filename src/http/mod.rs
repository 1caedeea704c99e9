//! HTTP surface.

pub mod health;
pub mod stream;
pub mod videos;

use crate::adapters::{FsBlobStore, PgVideoRepository, RedisPool};
use crate::application::{CatalogService, StreamService};
use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;
use std::sync::Arc;

pub type Catalog = CatalogService<PgVideoRepository, RedisPool, FsBlobStore>;
pub type Streamer = StreamService<Catalog, RedisPool, FsBlobStore>;

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
    pub streamer: Arc<Streamer>,
    pub queue: RedisPool,
    pub blobs: FsBlobStore,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health::healthz))
        .route("/videos/", get(videos::list).post(videos::upload))
        .route(
            "/videos/:id",
            get(videos::detail)
                .put(videos::update)
                .delete(videos::remove),
        )
        .route("/videos/task/:task_id", get(videos::task_status))
        .route("/stream/:id", get(stream::serve))
        .layer(DefaultBodyLimit::disable())
        .with_state(state)
}
