//! Join-sound library engine
//!
//! Stores members' join sounds, keeps playback settings consistent with the
//! sounds they reference, and validates uploaded audio.

pub mod audio_duration;
pub mod db;
pub mod error;
pub mod media_types;
pub mod models;
pub mod ownership;
pub mod service;
pub mod store;
pub mod upload;
pub mod validation;

pub use error::{ErrorBody, LibraryError, LibraryResult, ValidationError};
pub use ownership::VerifiedCaller;
pub use service::SoundLibrary;
pub use store::{LocalSoundStore, SoundFileStore};
pub use upload::BulkUploader;
pub use validation::{UploadValidator, ValidatedUpload};
