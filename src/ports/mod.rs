//! Trait seams between the application services and their collaborators.

pub mod cache;
pub mod metadata;
pub mod queue;
pub mod repository;
pub mod storage;

pub use cache::ByteCache;
pub use metadata::MetadataSource;
pub use queue::UploadQueue;
pub use repository::VideoRepository;
pub use storage::BlobStore;
