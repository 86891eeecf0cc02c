//! Caller identity and ownership checks
//!
//! Token verification happens upstream; this module only receives the
//! verified subject and decides whether the caller may touch a resource.

use crate::db::{IdentityResolver, SoundRepository};
use crate::error::{LibraryError, LibraryResult};
use jsnd_common::db::Sound;

const FORBIDDEN_MESSAGE: &str = "You can only access your own resources";

/// Authenticated Discord member making a private request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifiedCaller {
    pub member_id: i64,
}

impl VerifiedCaller {
    pub fn new(member_id: i64) -> Self {
        Self { member_id }
    }

    /// Parse a verified token subject of the form `provider|...|<member id>`
    ///
    /// The subject needs at least three `|`-separated parts; the last one
    /// is the member id.
    pub fn from_subject(subject: &str) -> LibraryResult<Self> {
        let parts: Vec<&str> = subject.split('|').collect();
        if parts.len() < 3 {
            return Err(LibraryError::Unauthenticated("invalid token subject format".to_string()));
        }

        let raw = parts[parts.len() - 1];
        let member_id = raw
            .parse::<i64>()
            .map_err(|e| LibraryError::Unauthenticated(format!("invalid member id in token: {}", e)))?;

        Ok(Self { member_id })
    }

    /// Reject requests addressed to another member's path
    pub fn authorize_member(&self, path_member_id: i64) -> LibraryResult<()> {
        if self.member_id != path_member_id {
            tracing::warn!(
                caller = self.member_id,
                requested = path_member_id,
                "Rejected access to another member's resources"
            );
            return Err(LibraryError::Forbidden(FORBIDDEN_MESSAGE.to_string()));
        }
        Ok(())
    }

    /// Load a sound the caller owns
    ///
    /// `NotFound` when the sound is absent, `Forbidden` when it belongs to
    /// another member. Guild does not matter: a member owns their sounds in
    /// every guild.
    pub async fn owned_sound(
        &self,
        sounds: &SoundRepository,
        identities: &IdentityResolver,
        sound_id: &str,
    ) -> LibraryResult<Sound> {
        let sound = sounds
            .get_by_id(sound_id)
            .await
            .map_err(|e| {
                if e.is_not_found() {
                    LibraryError::NotFound("Sound not found".to_string())
                } else {
                    e.into()
                }
            })?;

        let owner = identities.get(&sound.identity_id).await.map_err(|e| {
            LibraryError::Internal(format!("failed to verify ownership of sound {}: {}", sound_id, e))
        })?;

        if owner.member_id != self.member_id {
            tracing::warn!(
                caller = self.member_id,
                sound_id,
                "Rejected access to another member's sound"
            );
            return Err(LibraryError::Forbidden(FORBIDDEN_MESSAGE.to_string()));
        }

        Ok(sound)
    }
}
