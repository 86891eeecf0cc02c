//! Repositories over the shared SQLite pool

pub mod identities;
pub mod settings;
pub mod sounds;

pub use identities::IdentityResolver;
pub use settings::SettingsRepository;
pub use sounds::{NewSound, SoundDeletion, SoundRepository};
