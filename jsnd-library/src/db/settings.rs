//! Per-identity playback settings
//!
//! Rows are created lazily with mode `single` and no active sound.
//!
//! Every transaction here opens with a write. A deferred transaction that
//! reads first and writes later cannot be retried by SQLite's busy handler
//! once another writer commits in between, so the insert comes before any
//! select.

use crate::models::SettingsPatch;
use jsnd_common::db::Settings;
use jsnd_common::{Error, Result};
use sqlx::{Sqlite, SqlitePool, Transaction};

/// Repository for `sound_settings`
#[derive(Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Load the identity's settings, creating the default row on first access
    pub async fn get_or_create(&self, identity_id: &str) -> Result<Settings> {
        let mut tx = self.pool.begin().await?;
        ensure_row(&mut tx, identity_id).await?;
        let settings = select(&mut tx, identity_id).await?;
        tx.commit().await?;
        Ok(settings)
    }

    /// Apply a partial update
    ///
    /// Ownership of `patch.active_sound_id` is the caller's responsibility;
    /// only the foreign key to `sounds` is enforced here.
    pub async fn update(&self, identity_id: &str, patch: &SettingsPatch) -> Result<Settings> {
        if patch.is_empty() {
            return Err(Error::InvalidInput("No fields to update".to_string()));
        }

        let mut tx = self.pool.begin().await?;
        ensure_row(&mut tx, identity_id).await?;

        sqlx::query(
            r#"
            UPDATE sound_settings
            SET active_sound_id = COALESCE(?, active_sound_id),
                mode = COALESCE(?, mode)
            WHERE identity_id = ?
            "#,
        )
        .bind(patch.active_sound_id.as_deref())
        .bind(patch.mode.map(|m| m.as_str()))
        .bind(identity_id)
        .execute(&mut *tx)
        .await?;

        let settings = select(&mut tx, identity_id).await?;
        tx.commit().await?;

        tracing::info!(
            identity_id,
            active_sound_id = ?settings.active_sound_id,
            mode = %settings.mode,
            "Updated settings"
        );

        Ok(settings)
    }
}

/// Insert the default row unless one exists
///
/// A concurrent creator wins on the primary key and this insert does nothing.
async fn ensure_row(tx: &mut Transaction<'_, Sqlite>, identity_id: &str) -> Result<()> {
    let inserted = sqlx::query(
        r#"
        INSERT INTO sound_settings (identity_id, active_sound_id, mode)
        VALUES (?, NULL, 'single')
        ON CONFLICT (identity_id) DO NOTHING
        "#,
    )
    .bind(identity_id)
    .execute(&mut **tx)
    .await?;

    if inserted.rows_affected() == 1 {
        tracing::debug!(identity_id, "Created default settings");
    }

    Ok(())
}

async fn select(tx: &mut Transaction<'_, Sqlite>, identity_id: &str) -> Result<Settings> {
    let row = sqlx::query(
        "SELECT identity_id, active_sound_id, mode FROM sound_settings WHERE identity_id = ?",
    )
    .bind(identity_id)
    .fetch_optional(&mut **tx)
    .await?;

    match row {
        Some(row) => Settings::from_row(&row),
        None => Err(Error::Internal(format!("settings for {} missing after insert", identity_id))),
    }
}
