//! Concrete implementations of the port traits.

pub mod fs;
pub mod postgres;
pub mod redis;

pub use fs::FsBlobStore;
pub use postgres::PgVideoRepository;
pub use redis::RedisPool;
