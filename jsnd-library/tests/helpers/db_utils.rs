//! Temporary library fixtures

use async_trait::async_trait;
use jsnd_common::config::Limits;
use jsnd_common::db::{init_database, Sound};
use jsnd_library::db::{IdentityResolver, NewSound, SettingsRepository, SoundRepository};
use jsnd_library::{LocalSoundStore, SoundFileStore, SoundLibrary};
use sqlx::SqlitePool;
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

/// Database and sound directory under one temp dir
///
/// Keep the value alive for the whole test; dropping it removes both.
pub struct TestEnv {
    pub temp_dir: TempDir,
    pub pool: SqlitePool,
    pub store: Arc<LocalSoundStore>,
}

impl TestEnv {
    pub async fn new() -> anyhow::Result<Self> {
        let temp_dir = TempDir::new()?;
        let pool = init_database(&temp_dir.path().join("main.db")).await?;
        let store = Arc::new(LocalSoundStore::open(temp_dir.path().join("sounds")).await?);

        Ok(Self {
            temp_dir,
            pool,
            store,
        })
    }

    pub fn identities(&self) -> IdentityResolver {
        IdentityResolver::new(self.pool.clone())
    }

    pub fn sounds(&self) -> SoundRepository {
        SoundRepository::new(self.pool.clone())
    }

    pub fn settings(&self) -> SettingsRepository {
        SettingsRepository::new(self.pool.clone())
    }

    pub fn library(&self, limits: Limits) -> SoundLibrary {
        SoundLibrary::new(self.pool.clone(), self.store.clone(), limits)
    }

    pub fn sounds_dir(&self) -> &Path {
        self.store.root()
    }

    /// Files currently in the sound directory
    pub fn stored_files(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.sounds_dir())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

/// Insert a sound row and its backing file
pub async fn seed_sound(env: &TestEnv, identity_id: &str, name: &str) -> Sound {
    let new_sound = NewSound::new(identity_id, name, "audio/mpeg").unwrap();
    env.store.write(&new_sound.storage_name, b"seed").await.unwrap();
    env.sounds().create(&new_sound).await.unwrap()
}

/// Store whose writes or removals can be made to fail
pub struct FlakyStore {
    inner: LocalSoundStore,
    fail_write: AtomicBool,
    fail_remove: AtomicBool,
}

impl FlakyStore {
    pub fn new(inner: LocalSoundStore) -> Self {
        Self {
            inner,
            fail_write: AtomicBool::new(false),
            fail_remove: AtomicBool::new(false),
        }
    }

    /// Writes store half the bytes, then fail
    pub fn fail_writes(&self) {
        self.fail_write.store(true, Ordering::SeqCst);
    }

    pub fn fail_removals(&self) {
        self.fail_remove.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl SoundFileStore for FlakyStore {
    async fn write(&self, storage_name: &str, bytes: &[u8]) -> io::Result<()> {
        if self.fail_write.load(Ordering::SeqCst) {
            self.inner.write(storage_name, &bytes[..bytes.len() / 2]).await?;
            return Err(io::Error::new(io::ErrorKind::Other, "disk full"));
        }
        self.inner.write(storage_name, bytes).await
    }

    async fn read(&self, storage_name: &str) -> io::Result<Vec<u8>> {
        self.inner.read(storage_name).await
    }

    async fn remove(&self, storage_name: &str) -> io::Result<()> {
        if self.fail_remove.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "removal disabled"));
        }
        self.inner.remove(storage_name).await
    }
}
