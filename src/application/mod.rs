//! Application services composed from ports.

pub mod catalog;
pub mod ingest;
pub mod streaming;

pub use catalog::CatalogService;
pub use ingest::IngestService;
pub use streaming::StreamService;
