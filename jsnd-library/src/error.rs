//! Error types for the sound library
//!
//! `ValidationError` covers the per-file upload gates; `LibraryError` is what
//! callers of the library surfaces see. Every error renders a human-readable
//! reason and maps to a stable machine code.

use serde::Serialize;
use thiserror::Error;

/// Rejection reason from the upload validation pipeline
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("empty file: {filename}")]
    EmptyFile { filename: String },

    #[error("file too large: {filename} ({size} bytes, max {max} bytes)")]
    TooLarge { filename: String, size: u64, max: u64 },

    #[error("file size mismatch: {filename} (declared {declared} bytes, received {actual} bytes)")]
    SizeMismatch { filename: String, declared: u64, actual: u64 },

    #[error("filename cannot be empty")]
    EmptyName,

    #[error("filename too long: {len} characters (max {max})")]
    NameTooLong { len: usize, max: usize },

    #[error("cannot read file content: {0}")]
    Unreadable(String),

    #[error("unknown or unsupported file type")]
    UnknownType,

    #[error("unsupported file type: {extension} (detected: {detected})")]
    UnsupportedType { extension: String, detected: String },

    #[error("file type mismatch: {extension} (expected: {expected}, detected: {detected})")]
    TypeMismatch {
        extension: String,
        expected: String,
        detected: String,
    },

    #[error("cannot decode audio file: {0}")]
    Undecodable(String),

    #[error("audio too long: {seconds:.2}s (max {max_seconds}s)")]
    TooLong { seconds: f64, max_seconds: f64 },
}

/// Library error type
#[derive(Debug, Error)]
pub enum LibraryError {
    /// Upload rejected by a validation gate
    #[error("file validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Malformed or empty request
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Caller identity could not be established
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// Unknown sound or identity
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Resource exists but belongs to someone else
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Per-identity sound ceiling reached
    #[error("maximum of {max} sounds reached for this member")]
    LimitReached { max: usize },

    /// Metadata delete committed, backing file still on disk
    #[error("sound {sound_id} deleted but file {storage_name} could not be removed: {source}")]
    FileRemoval {
        sound_id: String,
        storage_name: String,
        #[source]
        source: std::io::Error,
    },

    /// Database or configuration failure
    #[error("Storage error: {0}")]
    Storage(jsnd_common::Error),

    /// Sound-file store failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl LibraryError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            LibraryError::Validation(_) => "VALIDATION_FAILED",
            LibraryError::BadRequest(_) => "BAD_REQUEST",
            LibraryError::Unauthenticated(_) => "UNAUTHENTICATED",
            LibraryError::NotFound(_) => "NOT_FOUND",
            LibraryError::Forbidden(_) => "FORBIDDEN",
            LibraryError::LimitReached { .. } => "LIMIT_REACHED",
            LibraryError::FileRemoval { .. } => "FILE_REMOVAL_FAILED",
            LibraryError::Storage(_) => "STORAGE_ERROR",
            LibraryError::Io(_) => "IO_ERROR",
            LibraryError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Structured body for transport layers
    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            error: ErrorDetail {
                code: self.code(),
                message: self.to_string(),
            },
        }
    }
}

impl From<jsnd_common::Error> for LibraryError {
    fn from(err: jsnd_common::Error) -> Self {
        match err {
            jsnd_common::Error::NotFound(msg) => LibraryError::NotFound(msg),
            jsnd_common::Error::InvalidInput(msg) => LibraryError::BadRequest(msg),
            jsnd_common::Error::Io(e) => LibraryError::Io(e),
            other => LibraryError::Storage(other),
        }
    }
}

impl From<sqlx::Error> for LibraryError {
    fn from(err: sqlx::Error) -> Self {
        LibraryError::Storage(jsnd_common::Error::Database(err))
    }
}

/// `{"error": {"code": ..., "message": ...}}`
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

/// Result type for library operations
pub type LibraryResult<T> = Result<T, LibraryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_not_found_stays_distinct() {
        let err: LibraryError = jsnd_common::Error::NotFound("sound x".to_string()).into();
        assert!(matches!(err, LibraryError::NotFound(_)));
        assert_eq!(err.code(), "NOT_FOUND");
    }

    #[test]
    fn test_common_config_error_is_storage() {
        let err: LibraryError = jsnd_common::Error::Config("bad".to_string()).into();
        assert_eq!(err.code(), "STORAGE_ERROR");
    }

    #[test]
    fn test_error_body_shape() {
        let err = LibraryError::Forbidden("sound does not belong to this member".to_string());
        let json = serde_json::to_value(err.to_body()).unwrap();

        assert_eq!(json["error"]["code"], "FORBIDDEN");
        assert!(json["error"]["message"]
            .as_str()
            .unwrap()
            .contains("does not belong"));
    }

    #[test]
    fn test_validation_reason_is_readable() {
        let err = LibraryError::from(ValidationError::TooLong {
            seconds: 5.12,
            max_seconds: 5.0,
        });
        assert_eq!(err.to_string(), "file validation failed: audio too long: 5.12s (max 5s)");
    }
}
