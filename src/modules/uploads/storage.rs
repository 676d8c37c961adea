//! Byte storage behind resumable uploads.
//!
//! The database row owns the offset; the store only writes bytes where it is
//! told to.

use std::io::SeekFrom;
use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;
use tokio::fs::{self, OpenOptions};
use tokio::io::{AsyncSeekExt, AsyncWriteExt};

use tapak_models::UploadId;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("upload storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait UploadStore: Send + Sync {
    /// Creates an empty object for a new session.
    async fn create(&self, id: UploadId) -> Result<(), StorageError>;
    /// Writes `chunk` starting at byte `offset`.
    async fn append(&self, id: UploadId, offset: u64, chunk: &[u8]) -> Result<(), StorageError>;
    /// Removes the object. Missing objects are not an error.
    async fn remove(&self, id: UploadId) -> Result<(), StorageError>;
}

/// One file per session under a root directory.
#[derive(Debug, Clone)]
pub struct LocalUploadStore {
    root: PathBuf,
}

impl LocalUploadStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path(&self, id: UploadId) -> PathBuf {
        self.root.join(id.to_string())
    }
}

#[async_trait]
impl UploadStore for LocalUploadStore {
    async fn create(&self, id: UploadId) -> Result<(), StorageError> {
        fs::create_dir_all(&self.root).await?;
        fs::File::create(self.path(id)).await?;
        Ok(())
    }

    async fn append(&self, id: UploadId, offset: u64, chunk: &[u8]) -> Result<(), StorageError> {
        let mut file = OpenOptions::new().write(true).open(self.path(id)).await?;
        file.seek(SeekFrom::Start(offset)).await?;
        file.write_all(chunk).await?;
        file.sync_data().await?;
        Ok(())
    }

    async fn remove(&self, id: UploadId) -> Result<(), StorageError> {
        match fs::remove_file(self.path(id)).await {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}
