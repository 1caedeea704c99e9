//! Filesystem blob store: `<upload_dir>/temp` for unprocessed uploads and
//! the flat `<upload_dir>` itself for finalized files.

use crate::ports::BlobStore;
use async_trait::async_trait;
use std::io;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

#[derive(Clone, Debug)]
pub struct FsBlobStore {
    durable_dir: PathBuf,
    temp_dir: PathBuf,
}

impl FsBlobStore {
    /// Open the store rooted at `upload_dir`, creating both directories.
    pub fn new(upload_dir: impl Into<PathBuf>) -> io::Result<Self> {
        let durable_dir = upload_dir.into();
        let temp_dir = durable_dir.join("temp");
        std::fs::create_dir_all(&temp_dir)?;
        Ok(Self {
            durable_dir,
            temp_dir,
        })
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    fn temp_path(&self, file_name: &str) -> PathBuf {
        self.temp_dir.join(file_name)
    }

    fn durable_path(&self, file_name: &str) -> PathBuf {
        self.durable_dir.join(file_name)
    }

    async fn promote(&self, from: &Path, file_name: &str) -> io::Result<PathBuf> {
        let dest = self.durable_path(file_name);
        match tokio::fs::rename(from, &dest).await {
            Ok(()) => Ok(dest),
            Err(_) => {
                // rename cannot cross filesystems; copy then unlink
                tokio::fs::copy(from, &dest).await?;
                tokio::fs::remove_file(from).await?;
                Ok(dest)
            }
        }
    }

    async fn len(&self, path: &Path) -> io::Result<u64> {
        Ok(tokio::fs::metadata(path).await?.len())
    }

    async fn read_range(&self, path: &Path, start: u64, len: u64) -> io::Result<Vec<u8>> {
        let mut file = File::open(path).await?;
        file.seek(SeekFrom::Start(start)).await?;
        let mut buf = Vec::with_capacity(len as usize);
        file.take(len).read_to_end(&mut buf).await?;
        Ok(buf)
    }

    async fn remove(&self, path: &Path) -> io::Result<()> {
        tokio::fs::remove_file(path).await
    }
}
