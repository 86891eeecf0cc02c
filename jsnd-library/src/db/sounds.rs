//! Sound persistence
//!
//! Deleting a sound also repairs the owner's settings in the same
//! transaction: if the sound was active, the owner's next most recent sound
//! becomes active, or the active reference is cleared when none remain.

use crate::media_types;
use chrono::Utc;
use jsnd_common::db::{encode_timestamp, Sound};
use jsnd_common::{Error, Result};
use serde::Serialize;
use sqlx::{Sqlite, SqlitePool, Transaction};
use uuid::Uuid;

const SOUND_COLUMNS: &str = "id, identity_id, original_name, storage_name, content_type, created_at";

/// Sound about to be stored
///
/// The id is minted here so the storage filename can be derived from it
/// before the row exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSound {
    pub id: String,
    pub identity_id: String,
    pub original_name: String,
    pub storage_name: String,
    pub content_type: String,
}

impl NewSound {
    /// Mint an id and derive the storage filename
    ///
    /// Fails for content types outside the allow-list.
    pub fn new(identity_id: &str, original_name: &str, content_type: &str) -> Result<Self> {
        let id = Uuid::new_v4().to_string();
        let storage_name = media_types::storage_filename(&id, content_type).ok_or_else(|| {
            Error::InvalidInput(format!("content type {} is not allowed", content_type))
        })?;

        Ok(Self {
            id,
            identity_id: identity_id.to_string(),
            original_name: original_name.to_string(),
            storage_name,
            content_type: content_type.to_string(),
        })
    }
}

/// Outcome of a sound deletion
#[derive(Debug, Clone, Serialize)]
pub struct SoundDeletion {
    #[serde(rename = "deleted_sound")]
    pub deleted: Sound,
    /// New active sound when the deleted one was active and another remains
    #[serde(rename = "new_sound")]
    pub replacement: Option<Sound>,
}

/// Repository for `sounds`
#[derive(Clone)]
pub struct SoundRepository {
    pool: SqlitePool,
}

impl SoundRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a sound row stamped with the current time
    pub async fn create(&self, new_sound: &NewSound) -> Result<Sound> {
        let sound = Sound {
            id: new_sound.id.clone(),
            identity_id: new_sound.identity_id.clone(),
            original_name: new_sound.original_name.clone(),
            storage_name: new_sound.storage_name.clone(),
            content_type: new_sound.content_type.clone(),
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO sounds (id, identity_id, original_name, storage_name, content_type, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&sound.id)
        .bind(&sound.identity_id)
        .bind(&sound.original_name)
        .bind(&sound.storage_name)
        .bind(&sound.content_type)
        .bind(encode_timestamp(&sound.created_at))
        .execute(&self.pool)
        .await?;

        tracing::debug!(
            sound_id = %sound.id,
            identity_id = %sound.identity_id,
            content_type = %sound.content_type,
            "Created sound"
        );

        Ok(sound)
    }

    /// Load by id, `NotFound` if absent
    pub async fn get_by_id(&self, id: &str) -> Result<Sound> {
        let row = sqlx::query(&format!("SELECT {} FROM sounds WHERE id = ?", SOUND_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Sound::from_row(&row),
            None => Err(Error::not_found("sound", id)),
        }
    }

    /// All sounds of an identity, newest first
    pub async fn list_by_identity(&self, identity_id: &str) -> Result<Vec<Sound>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM sounds WHERE identity_id = ? ORDER BY created_at DESC, rowid DESC",
            SOUND_COLUMNS
        ))
        .bind(identity_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Sound::from_row).collect()
    }

    pub async fn count_by_identity(&self, identity_id: &str) -> Result<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sounds WHERE identity_id = ?")
            .bind(identity_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count as usize)
    }

    /// Delete a sound and repair settings that point at it
    ///
    /// **Steps (one transaction):**
    /// 1. Detach every settings row whose active sound is this one
    /// 2. Load the sound (`NotFound` if absent)
    /// 3. Pick the owner's most recent remaining sound, if any
    /// 4. Point the owner's settings at it
    /// 5. Delete the sound row
    /// 6. Commit
    ///
    /// The detach is a write so the transaction takes the write lock before
    /// it reads anything. Any failure rolls the whole transaction back.
    /// Removing the backing file is the caller's job, after this returns.
    pub async fn delete(&self, id: &str) -> Result<SoundDeletion> {
        let mut tx = self.pool.begin().await?;

        let dependents: Vec<String> = sqlx::query_scalar(
            "UPDATE sound_settings SET active_sound_id = NULL WHERE active_sound_id = ? RETURNING identity_id",
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;

        let row = sqlx::query(&format!("SELECT {} FROM sounds WHERE id = ?", SOUND_COLUMNS))
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

        let deleted = match row {
            Some(row) => Sound::from_row(&row)?,
            None => return Err(Error::not_found("sound", id)),
        };

        if let Some(other) = dependents.iter().find(|owner| **owner != deleted.identity_id) {
            return Err(Error::Internal(format!(
                "sound {} is active for identity {} which does not own it",
                id, other
            )));
        }

        let replacement = if dependents.is_empty() {
            None
        } else {
            let replacement = next_most_recent(&mut tx, &deleted).await?;

            if let Some(next) = &replacement {
                sqlx::query("UPDATE sound_settings SET active_sound_id = ? WHERE identity_id = ?")
                    .bind(&next.id)
                    .bind(&deleted.identity_id)
                    .execute(&mut *tx)
                    .await?;
            }

            replacement
        };

        sqlx::query("DELETE FROM sounds WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(
            sound_id = %deleted.id,
            identity_id = %deleted.identity_id,
            was_active = !dependents.is_empty(),
            replacement_id = ?replacement.as_ref().map(|s| s.id.as_str()),
            "Deleted sound"
        );

        Ok(SoundDeletion {
            deleted,
            replacement,
        })
    }
}

/// Owner's most recently created sound other than `excluded`
async fn next_most_recent(
    tx: &mut Transaction<'_, Sqlite>,
    excluded: &Sound,
) -> Result<Option<Sound>> {
    let row = sqlx::query(&format!(
        r#"
        SELECT {} FROM sounds
        WHERE identity_id = ? AND id <> ?
        ORDER BY created_at DESC, rowid DESC
        LIMIT 1
        "#,
        SOUND_COLUMNS
    ))
    .bind(&excluded.identity_id)
    .bind(&excluded.id)
    .fetch_optional(&mut **tx)
    .await?;

    row.as_ref().map(Sound::from_row).transpose()
}
