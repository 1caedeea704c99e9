//! Fellini - video catalog and range-streaming service
//!
//! Hexagonal architecture:
//! - domain/: pure types and logic (records, jobs, byte ranges)
//! - ports/: trait definitions
//! - adapters/: concrete implementations (PostgreSQL, Redis, filesystem)
//! - application/: the core services (cache-aside catalog, ingestion
//!   pipeline, streaming engine)
//! - http/: axum handlers
//! - config: environment configuration

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod http;
pub mod ports;

pub use config::Config;
pub use error::{Error, Result};
