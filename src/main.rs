//! Service entry point.
//!
//! Wires up the adapters (PostgreSQL, Redis, filesystem blob store), the
//! application services, the ingest worker pool, and the HTTP router. All
//! dependencies are constructed here and passed in explicitly; nothing is
//! process-global.

use fellini::adapters::{FsBlobStore, PgVideoRepository, RedisPool};
use fellini::application::{CatalogService, IngestService, StreamService};
use fellini::config::Config;
use fellini::http::{self, AppState};
use fellini::ports::UploadQueue;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    tracing_subscriber::fmt::init();

    let repo = match PgVideoRepository::connect(&config.database_url).await {
        Ok(repo) => repo,
        Err(e) => {
            eprintln!("Failed to connect to PostgreSQL: {e}");
            std::process::exit(1);
        }
    };

    let redis = match RedisPool::new(&config.redis_url) {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("Failed to connect to Redis: {e}");
            std::process::exit(1);
        }
    };

    let blobs = match FsBlobStore::new(&config.upload_dir) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("Failed to open upload directory {}: {e}", config.upload_dir);
            std::process::exit(1);
        }
    };

    let catalog = Arc::new(CatalogService::new(
        repo.clone(),
        redis.clone(),
        blobs.clone(),
    ));
    let ingest = Arc::new(IngestService::new(
        catalog.clone(),
        redis.clone(),
        blobs.clone(),
    ));

    // Jobs a previous run dequeued but never acknowledged get redelivered.
    match redis.recover_stale().await {
        Ok(0) => {}
        Ok(count) => info!(count, "requeued jobs abandoned by a previous run"),
        Err(e) => error!(error = %e, "could not sweep the processing list"),
    }

    for worker_id in 0..config.workers {
        let worker = ingest.clone();
        tokio::spawn(async move {
            worker.run_worker_loop(worker_id).await;
        });
    }
    info!(workers = config.workers, "started ingest workers");

    let streamer = Arc::new(StreamService::new(
        catalog.clone(),
        redis.clone(),
        blobs.clone(),
        Duration::from_secs(config.metadata_timeout_secs),
    ));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let state = AppState {
        catalog,
        streamer,
        queue: redis,
        blobs,
    };
    let app = http::router(state).layer(cors);

    let listener = tokio::net::TcpListener::bind(format!("{}:{}", config.addr, config.port))
        .await
        .expect("Failed to bind TCP listener");
    info!(addr = %config.addr, port = %config.port, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server failed to start");

    repo.close().await;
    info!("shut down");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "could not install the shutdown signal handler");
    }
}
