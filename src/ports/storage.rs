use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};

/// Filesystem-backed blob storage: a temp area for unprocessed uploads and
/// a flat durable area addressed by unique filename.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Path a fresh upload should be written to.
    fn temp_path(&self, file_name: &str) -> PathBuf;

    /// Path a finalized file lives at.
    fn durable_path(&self, file_name: &str) -> PathBuf;

    /// Atomically move a temp file into the durable area and return the
    /// final path.
    async fn promote(&self, from: &Path, file_name: &str) -> io::Result<PathBuf>;

    /// Size of the blob at `path`; fails when it does not exist.
    async fn len(&self, path: &Path) -> io::Result<u64>;

    /// Read up to `len` bytes starting at byte `start`.
    async fn read_range(&self, path: &Path, start: u64, len: u64) -> io::Result<Vec<u8>>;

    async fn remove(&self, path: &Path) -> io::Result<()>;
}
