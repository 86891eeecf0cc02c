//! Settings update payloads

use crate::error::{LibraryError, LibraryResult};
use jsnd_common::db::PlaybackMode;
use serde::Deserialize;

/// Raw settings update as received from a client
///
/// Empty strings count as absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsUpdateRequest {
    #[serde(default)]
    pub active_sound_id: Option<String>,
    #[serde(default)]
    pub mode: Option<String>,
}

/// Validated partial update; only `Some` fields are applied
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsPatch {
    pub active_sound_id: Option<String>,
    pub mode: Option<PlaybackMode>,
}

impl SettingsPatch {
    pub fn is_empty(&self) -> bool {
        self.active_sound_id.is_none() && self.mode.is_none()
    }
}

impl TryFrom<SettingsUpdateRequest> for SettingsPatch {
    type Error = LibraryError;

    fn try_from(request: SettingsUpdateRequest) -> LibraryResult<Self> {
        let active_sound_id = request.active_sound_id.filter(|id| !id.trim().is_empty());

        let mode = match request.mode.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(mode) => Some(mode.parse::<PlaybackMode>()?),
        };

        let patch = SettingsPatch {
            active_sound_id,
            mode,
        };

        if patch.is_empty() {
            return Err(LibraryError::BadRequest("No fields to update".to_string()));
        }

        Ok(patch)
    }
}
