//! Sound library surfaces
//!
//! Public reads need no caller. Private writes take a [`VerifiedCaller`] and
//! check it against the addressed member or sound before touching storage.

use crate::db::{IdentityResolver, SettingsRepository, SoundDeletion, SoundRepository};
use crate::error::{LibraryError, LibraryResult};
use crate::models::{BulkUploadReport, SettingsPatch, SettingsUpdateRequest, SoundFile, UploadCandidate};
use crate::ownership::VerifiedCaller;
use crate::store::{LocalSoundStore, SoundFileStore};
use crate::upload::BulkUploader;
use crate::validation::UploadValidator;
use jsnd_common::config::{Limits, ServiceConfig};
use jsnd_common::db::{init_database, Settings, Sound};
use sqlx::SqlitePool;
use std::sync::Arc;

/// Entry point for sound library operations
#[derive(Clone)]
pub struct SoundLibrary {
    identities: IdentityResolver,
    sounds: SoundRepository,
    settings: SettingsRepository,
    store: Arc<dyn SoundFileStore>,
    limits: Limits,
}

impl SoundLibrary {
    pub fn new(db: SqlitePool, store: Arc<dyn SoundFileStore>, limits: Limits) -> Self {
        Self {
            identities: IdentityResolver::new(db.clone()),
            sounds: SoundRepository::new(db.clone()),
            settings: SettingsRepository::new(db),
            store,
            limits,
        }
    }

    /// Open the database and sound directory named by `config`
    pub async fn open(config: &ServiceConfig) -> LibraryResult<Self> {
        let db = init_database(&config.database_path).await?;
        let store = LocalSoundStore::open(&config.sounds_path).await?;

        tracing::info!(
            database = %config.database_path.display(),
            sounds = %config.sounds_path.display(),
            "Sound library ready"
        );

        Ok(Self::new(db, Arc::new(store), config.limits))
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    // ---- public reads ----

    /// Bytes and metadata of one sound
    pub async fn sound_file(&self, sound_id: &str) -> LibraryResult<SoundFile> {
        if sound_id.is_empty() {
            return Err(LibraryError::BadRequest("Sound ID is required".to_string()));
        }

        let sound = self.sounds.get_by_id(sound_id).await?;
        let bytes = self.store.read(&sound.storage_name).await?;

        Ok(SoundFile {
            bytes,
            content_type: sound.content_type,
            original_name: sound.original_name,
        })
    }

    /// Member's sounds in a guild, newest first
    pub async fn list_sounds(&self, guild_id: i64, member_id: i64) -> LibraryResult<Vec<Sound>> {
        let identity = self.identities.resolve(guild_id, member_id).await?;
        Ok(self.sounds.list_by_identity(&identity.id).await?)
    }

    /// Member's playback settings in a guild
    pub async fn settings(&self, guild_id: i64, member_id: i64) -> LibraryResult<Settings> {
        let identity = self.identities.resolve(guild_id, member_id).await?;
        Ok(self.settings.get_or_create(&identity.id).await?)
    }

    // ---- private writes ----

    /// Upload a batch of files for the caller
    pub async fn upload_sounds(
        &self,
        caller: &VerifiedCaller,
        guild_id: i64,
        member_id: i64,
        files: Vec<UploadCandidate>,
    ) -> LibraryResult<BulkUploadReport> {
        caller.authorize_member(member_id)?;

        if files.is_empty() {
            return Err(LibraryError::BadRequest("No files uploaded".to_string()));
        }
        if files.len() > self.limits.max_files_per_batch {
            return Err(LibraryError::BadRequest(format!(
                "Too many files: {} (max {} per upload)",
                files.len(),
                self.limits.max_files_per_batch
            )));
        }

        let identity = self.identities.resolve(guild_id, member_id).await?;
        let existing = self.sounds.count_by_identity(&identity.id).await?;

        let uploader = BulkUploader::new(
            self.sounds.clone(),
            Arc::clone(&self.store),
            UploadValidator::new(self.limits),
        );

        Ok(uploader.run(&identity.id, existing, files).await)
    }

    /// Delete one of the caller's sounds
    ///
    /// The metadata delete and settings repair commit first. If the backing
    /// file then cannot be removed the error is `FileRemoval`: the sound is
    /// gone from the library but its file is still on disk.
    pub async fn delete_sound(&self, caller: &VerifiedCaller, sound_id: &str) -> LibraryResult<SoundDeletion> {
        if sound_id.is_empty() {
            return Err(LibraryError::BadRequest("Sound ID is required".to_string()));
        }

        caller.owned_sound(&self.sounds, &self.identities, sound_id).await?;

        let deletion = self.sounds.delete(sound_id).await?;

        if let Err(e) = self.store.remove(&deletion.deleted.storage_name).await {
            tracing::error!(
                sound_id,
                storage_name = %deletion.deleted.storage_name,
                error = %e,
                "Sound deleted but its file could not be removed"
            );
            return Err(LibraryError::FileRemoval {
                sound_id: sound_id.to_string(),
                storage_name: deletion.deleted.storage_name,
                source: e,
            });
        }

        Ok(deletion)
    }

    /// Partially update the caller's settings in a guild
    pub async fn update_settings(
        &self,
        caller: &VerifiedCaller,
        guild_id: i64,
        member_id: i64,
        request: SettingsUpdateRequest,
    ) -> LibraryResult<Settings> {
        caller.authorize_member(member_id)?;
        let patch = SettingsPatch::try_from(request)?;

        let identity = self.identities.resolve(guild_id, member_id).await?;

        if let Some(sound_id) = patch.active_sound_id.as_deref() {
            let sound = caller.owned_sound(&self.sounds, &self.identities, sound_id).await?;
            if sound.identity_id != identity.id {
                tracing::warn!(
                    sound_id,
                    identity_id = %identity.id,
                    "Rejected active sound from another guild"
                );
                return Err(LibraryError::Forbidden(
                    "Sound does not belong to this guild member".to_string(),
                ));
            }
        }

        Ok(self.settings.update(&identity.id, &patch).await?)
    }
}
