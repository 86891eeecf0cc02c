//! Identity resolution
//!
//! Maps an external (guild, member) pair to a stable internal identity,
//! creating one on first sight.

use jsnd_common::db::Identity;
use jsnd_common::{Error, Result};
use sqlx::SqlitePool;
use uuid::Uuid;

/// Get-or-create resolver for identities
#[derive(Clone)]
pub struct IdentityResolver {
    pool: SqlitePool,
}

impl IdentityResolver {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Return the identity for (guild, member), creating it if absent
    ///
    /// Concurrent first calls for the same pair race on the
    /// `UNIQUE (guild_id, member_id)` constraint; the loser's insert is a
    /// no-op and both read back the winning row.
    pub async fn resolve(&self, guild_id: i64, member_id: i64) -> Result<Identity> {
        if let Some(identity) = self.find(guild_id, member_id).await? {
            return Ok(identity);
        }

        let id = Uuid::new_v4().to_string();
        let inserted = sqlx::query(
            r#"
            INSERT INTO identities (id, guild_id, member_id)
            VALUES (?, ?, ?)
            ON CONFLICT (guild_id, member_id) DO NOTHING
            "#,
        )
        .bind(&id)
        .bind(guild_id)
        .bind(member_id)
        .execute(&self.pool)
        .await?;

        if inserted.rows_affected() == 1 {
            tracing::info!(identity_id = %id, guild_id, member_id, "Created identity");
        }

        self.find(guild_id, member_id).await?.ok_or_else(|| {
            Error::Internal(format!(
                "identity for guild {} member {} vanished after insert",
                guild_id, member_id
            ))
        })
    }

    /// Look up without creating
    pub async fn find(&self, guild_id: i64, member_id: i64) -> Result<Option<Identity>> {
        let row = sqlx::query(
            "SELECT id, guild_id, member_id FROM identities WHERE guild_id = ? AND member_id = ?",
        )
        .bind(guild_id)
        .bind(member_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Identity::from_row).transpose()
    }

    /// Load by internal id
    pub async fn get(&self, id: &str) -> Result<Identity> {
        let row = sqlx::query("SELECT id, guild_id, member_id FROM identities WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Identity::from_row(&row),
            None => Err(Error::not_found("identity", id)),
        }
    }
}
