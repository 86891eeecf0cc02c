//! Request and response types of the library surfaces

pub mod settings;
pub mod upload;

pub use settings::{SettingsPatch, SettingsUpdateRequest};
pub use upload::{BatchStatus, BulkUploadReport, FileFailure, SoundFile, UploadCandidate, UploadedSound};
