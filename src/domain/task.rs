use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

use crate::domain::video::Video;

/// A queued upload waiting to be finalized: move the temp file into the
/// durable area, insert the catalog record, invalidate the list cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadJob {
    /// Task id, also exposed to clients for status polling.
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub duration: i32,
    /// Path of the unprocessed file in the temp area.
    pub temp_path: String,
    /// Original client filename; used only to preserve the extension.
    pub original_filename: String,
}

impl UploadJob {
    pub fn new(
        title: String,
        description: Option<String>,
        duration: i32,
        temp_path: String,
        original_filename: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title,
            description,
            duration,
            temp_path,
            original_filename,
        }
    }

    /// Durable filename for this job. Derived from the job id, never the
    /// title, so concurrent uploads cannot collide and a redelivered job
    /// targets the same path it targeted the first time.
    pub fn final_name(&self) -> String {
        format!("{}{}", self.id, file_extension(&self.original_filename))
    }
}

/// Extension of `name` including the leading dot, or empty when absent.
pub fn file_extension(name: &str) -> String {
    Path::new(name)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default()
}

/// State of an upload task, persisted against the task id until result
/// retention expires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "UPPERCASE")]
pub enum TaskStatus {
    Pending,
    Success { result: Video },
    Failure { detail: String },
}
