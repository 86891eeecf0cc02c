//! Bulk upload orchestration
//!
//! Files are processed one at a time in submission order. A rejected file is
//! recorded and the batch moves on; nothing is rolled back for earlier
//! successes.

use crate::db::{NewSound, SoundRepository};
use crate::error::{LibraryError, LibraryResult};
use crate::models::{BulkUploadReport, FileFailure, UploadCandidate, UploadedSound};
use crate::store::SoundFileStore;
use crate::validation::UploadValidator;
use std::io::{self, Cursor};
use std::sync::Arc;

/// Runs a batch of uploads for one identity
///
/// The sound count is read once by the caller and tracked in memory for the
/// rest of the batch. Two batches for the same identity running at once can
/// therefore both pass the ceiling check and overshoot it.
pub struct BulkUploader {
    sounds: SoundRepository,
    store: Arc<dyn SoundFileStore>,
    validator: UploadValidator,
}

impl BulkUploader {
    pub fn new(sounds: SoundRepository, store: Arc<dyn SoundFileStore>, validator: UploadValidator) -> Self {
        Self {
            sounds,
            store,
            validator,
        }
    }

    /// Process every file and report per-file outcomes
    ///
    /// `existing_count` is the identity's stored sound count before the batch.
    pub async fn run(
        &self,
        identity_id: &str,
        existing_count: usize,
        files: Vec<UploadCandidate>,
    ) -> BulkUploadReport {
        let total_files = files.len();
        let max_sounds = self.validator.limits().max_sounds_per_identity;

        let mut current_count = existing_count;
        let mut successful_files = Vec::new();
        let mut failed_files = Vec::new();

        for (index, file) in files.into_iter().enumerate() {
            let filename = file.filename.clone();

            let outcome = if current_count >= max_sounds {
                Err(LibraryError::LimitReached { max: max_sounds })
            } else {
                self.upload_one(identity_id, index, file).await
            };

            match outcome {
                Ok(uploaded) => {
                    current_count += 1;
                    successful_files.push(uploaded);
                }
                Err(e) => {
                    tracing::warn!(identity_id, index, filename = %filename, error = %e, "Upload rejected");
                    failed_files.push(FileFailure {
                        filename,
                        error: e.to_string(),
                        index,
                    });
                }
            }
        }

        let report = BulkUploadReport::build(total_files, successful_files, failed_files);

        tracing::info!(
            identity_id,
            total = report.total_files,
            succeeded = report.success_count,
            failed = report.failure_count,
            "Bulk upload finished"
        );

        report
    }

    /// Validate, write and record one file
    async fn upload_one(
        &self,
        identity_id: &str,
        index: usize,
        file: UploadCandidate,
    ) -> LibraryResult<UploadedSound> {
        let content: Arc<[u8]> = file.content.into();
        let validator = self.validator;
        let filename = file.filename;
        let declared_size = file.declared_size;

        // Sniffing and decoding are CPU-bound
        let reader = Cursor::new(Arc::clone(&content));
        let validated = tokio::task::spawn_blocking(move || {
            validator.validate(&filename, declared_size, reader)
        })
        .await
        .map_err(|e| LibraryError::Internal(format!("validation task failed: {}", e)))??;

        let new_sound = NewSound::new(identity_id, &validated.filename, validated.content_type)?;

        if let Err(e) = self.store.write(&new_sound.storage_name, &content).await {
            // AlreadyExists means the name belongs to another file
            if e.kind() != io::ErrorKind::AlreadyExists {
                self.discard(&new_sound.storage_name).await;
            }
            return Err(e.into());
        }

        let sound = match self.sounds.create(&new_sound).await {
            Ok(sound) => sound,
            Err(e) => {
                self.discard(&new_sound.storage_name).await;
                return Err(e.into());
            }
        };

        tracing::debug!(
            sound_id = %sound.id,
            index,
            duration_ms = validated.duration.as_millis() as u64,
            "Stored upload"
        );

        Ok(UploadedSound {
            id: sound.id,
            original_name: sound.original_name,
            size: content.len() as u64,
            content_type: sound.content_type,
            index,
        })
    }

    /// Remove a file that has no sound row
    async fn discard(&self, storage_name: &str) {
        match self.store.remove(storage_name).await {
            Ok(()) => tracing::debug!(storage_name, "Removed orphaned sound file"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::error!(
                storage_name,
                error = %e,
                "Failed to remove orphaned sound file"
            ),
        }
    }
}
