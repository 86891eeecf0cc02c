//! Storage and configuration errors
//!
//! Repositories and the config loader return [`Error`]. Callers above the
//! storage layer map it onto their own taxonomy; `NotFound` and
//! `InvalidInput` are the two variants they are expected to tell apart.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Filesystem failure outside the sound store (database directory, config file)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Unreadable config file, bad TOML or a zero limit
    #[error("Configuration error: {0}")]
    Config(String),

    /// No row with the given key; the message names the kind and key
    #[error("Not found: {0}")]
    NotFound(String),

    /// Value rejected before it reached storage (unknown mode, disallowed type)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Stored data violates an invariant the schema cannot express
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// `NotFound` for a row of `kind` keyed by `key`, e.g. `sound 1f3c...`
    pub fn not_found(kind: &str, key: impl std::fmt::Display) -> Self {
        Error::NotFound(format!("{} {}", kind, key))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}
