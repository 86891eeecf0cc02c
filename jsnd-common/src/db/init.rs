//! Database initialization
//!
//! Creates the database file and schema on first run; safe to call on an
//! existing database.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Open (creating if needed) the database and ensure the schema exists
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    // Foreign keys are a per-connection setting, so they go on the options
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_schema(&pool).await?;

    Ok(pool)
}

/// Create all tables and indexes (idempotent)
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_identities_table(pool).await?;
    create_sounds_table(pool).await?;
    create_sound_settings_table(pool).await?;
    Ok(())
}

pub async fn create_identities_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS identities (
            id TEXT PRIMARY KEY NOT NULL,
            guild_id INTEGER NOT NULL,
            member_id INTEGER NOT NULL,
            UNIQUE (guild_id, member_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn create_sounds_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sounds (
            id TEXT PRIMARY KEY NOT NULL,
            identity_id TEXT NOT NULL REFERENCES identities(id),
            original_name TEXT NOT NULL,
            storage_name TEXT NOT NULL UNIQUE,
            content_type TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_sounds_identity_created ON sounds(identity_id, created_at)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn create_sound_settings_table(pool: &SqlitePool) -> Result<()> {
    // active_sound_id FK: a sound cannot be deleted while still active
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sound_settings (
            identity_id TEXT PRIMARY KEY NOT NULL REFERENCES identities(id),
            active_sound_id TEXT REFERENCES sounds(id),
            mode TEXT NOT NULL DEFAULT 'single' CHECK (mode IN ('single', 'random'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_sound_settings_active_sound ON sound_settings(active_sound_id)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
