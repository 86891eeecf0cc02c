//! Sound-file storage
//!
//! Files are keyed by storage name (`<sound id><ext>`), never by the
//! uploader's filename.

use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Byte store for sound files
#[async_trait]
pub trait SoundFileStore: Send + Sync {
    /// Write a new file; fails with `AlreadyExists` if the name is taken
    ///
    /// A failed write may leave a partial file behind; callers remove it.
    async fn write(&self, storage_name: &str, bytes: &[u8]) -> io::Result<()>;

    async fn read(&self, storage_name: &str) -> io::Result<Vec<u8>>;

    async fn remove(&self, storage_name: &str) -> io::Result<()>;
}

/// Store backed by a local directory
#[derive(Debug, Clone)]
pub struct LocalSoundStore {
    root: PathBuf,
}

impl LocalSoundStore {
    /// Open the store, creating the directory if needed
    pub async fn open(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).await?;
        tracing::debug!(path = %root.display(), "Opened sound store");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, storage_name: &str) -> io::Result<PathBuf> {
        let is_plain = !storage_name.is_empty()
            && storage_name != "."
            && storage_name != ".."
            && !storage_name.contains(['/', '\\']);

        if !is_plain {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid storage name: {:?}", storage_name),
            ));
        }

        Ok(self.root.join(storage_name))
    }
}

#[async_trait]
impl SoundFileStore for LocalSoundStore {
    async fn write(&self, storage_name: &str, bytes: &[u8]) -> io::Result<()> {
        let path = self.path_for(storage_name)?;
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;

        file.write_all(bytes).await?;
        file.sync_all().await
    }

    async fn read(&self, storage_name: &str) -> io::Result<Vec<u8>> {
        fs::read(self.path_for(storage_name)?).await
    }

    async fn remove(&self, storage_name: &str) -> io::Result<()> {
        fs::remove_file(self.path_for(storage_name)?).await
    }
}
