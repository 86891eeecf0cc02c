//! Database models
//!
//! Three relations: `identities` (one row per guild member), `sounds`
//! (one row per stored clip) and `sound_settings` (at most one row per
//! identity).

use crate::{Error, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::fmt;
use std::str::FromStr;

/// Internal identity for one (guild, member) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub guild_id: i64,
    pub member_id: i64,
}

impl Identity {
    pub fn from_row(row: &SqliteRow) -> Result<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            guild_id: row.try_get("guild_id")?,
            member_id: row.try_get("member_id")?,
        })
    }
}

/// Stored audio clip
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sound {
    pub id: String,
    pub identity_id: String,
    /// Sanitized name supplied by the uploader
    pub original_name: String,
    /// Key in the sound-file store, never exposed to API consumers
    #[serde(skip_serializing)]
    pub storage_name: String,
    pub content_type: String,
    pub created_at: DateTime<Utc>,
}

impl Sound {
    pub fn from_row(row: &SqliteRow) -> Result<Self> {
        let created_at: String = row.try_get("created_at")?;

        Ok(Self {
            id: row.try_get("id")?,
            identity_id: row.try_get("identity_id")?,
            original_name: row.try_get("original_name")?,
            storage_name: row.try_get("storage_name")?,
            content_type: row.try_get("content_type")?,
            created_at: decode_timestamp(&created_at)?,
        })
    }
}

/// Playback mode for a member's join sound
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackMode {
    /// Always play the active sound
    #[default]
    Single,
    /// Player picks from the member's library
    Random,
}

impl PlaybackMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaybackMode::Single => "single",
            PlaybackMode::Random => "random",
        }
    }
}

impl fmt::Display for PlaybackMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlaybackMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "single" => Ok(PlaybackMode::Single),
            "random" => Ok(PlaybackMode::Random),
            other => Err(Error::InvalidInput(format!(
                "invalid mode '{}' (expected 'single' or 'random')",
                other
            ))),
        }
    }
}

/// Per-identity playback settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub identity_id: String,
    pub active_sound_id: Option<String>,
    pub mode: PlaybackMode,
}

impl Settings {
    pub fn from_row(row: &SqliteRow) -> Result<Self> {
        let mode: String = row.try_get("mode")?;
        let mode = mode
            .parse::<PlaybackMode>()
            .map_err(|_| Error::Internal(format!("stored mode '{}' is not recognised", mode)))?;

        Ok(Self {
            identity_id: row.try_get("identity_id")?,
            active_sound_id: row.try_get("active_sound_id")?,
            mode,
        })
    }
}

/// Encode a timestamp as fixed-width RFC 3339 UTC text
///
/// Fixed width keeps lexical order equal to chronological order in SQL.
pub fn encode_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Decode a timestamp written by [`encode_timestamp`]
pub fn decode_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Internal(format!("invalid timestamp '{}': {}", s, e)))
}
