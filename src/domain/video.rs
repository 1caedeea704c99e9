use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Upper bound accepted for the `duration` field at the ingress boundary.
/// The store itself does not enforce it.
pub const MAX_DURATION: i32 = 9999;

/// A catalog record, as persisted in the `videos` table and as serialized
/// into the metadata cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Video {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub duration: i32,
    /// Absolute path of the durable file. Unique across all records.
    pub storage_path: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for a record insert. The id and timestamps are assigned by the
/// store.
#[derive(Debug, Clone)]
pub struct NewVideo {
    pub title: String,
    pub description: Option<String>,
    pub duration: i32,
    pub storage_path: String,
}

/// Fields for a record update. `storage_path` is only set when the backing
/// file was replaced.
#[derive(Debug, Clone)]
pub struct VideoUpdate {
    pub title: String,
    pub description: Option<String>,
    pub duration: i32,
    pub storage_path: Option<String>,
}

/// Validate the duration bound shared by upload and update ingress.
pub fn duration_in_bounds(duration: i32) -> bool {
    (0..=MAX_DURATION).contains(&duration)
}
