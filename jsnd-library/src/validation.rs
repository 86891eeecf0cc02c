//! Upload validation pipeline
//!
//! Gates, in order (first failure wins):
//! 1. Size: declared and actual size must be non-zero, within the per-file
//!    maximum and equal to each other
//! 2. Name: trimmed name must be non-empty and within the length limit;
//!    it is reduced to its base component before further use
//! 3. Sniff: magic-byte detection on a bounded prefix of the content
//! 4. Allow-list: detected type must be allowed and match the extension
//! 5. Duration: decoded audio must not exceed the duration ceiling
//!
//! Client-supplied content-type headers are never consulted.

use crate::audio_duration::decoded_duration;
use crate::error::ValidationError;
use crate::media_types;
use jsnd_common::config::Limits;
use std::io::{Read, Seek, SeekFrom};
use std::time::Duration;

/// Accepted upload
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedUpload {
    /// Base component of the uploaded name
    pub filename: String,
    /// Canonical content type from the allow-list
    pub content_type: &'static str,
    pub duration: Duration,
}

/// Stateless validator parameterised by [`Limits`]
#[derive(Debug, Clone, Copy)]
pub struct UploadValidator {
    limits: Limits,
}

impl UploadValidator {
    pub fn new(limits: Limits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Run every gate against one file
    ///
    /// `content` is measured, read from the start for sniffing and then
    /// rewound again for decoding.
    pub fn validate<R>(
        &self,
        filename: &str,
        declared_size: u64,
        mut content: R,
    ) -> Result<ValidatedUpload, ValidationError>
    where
        R: Read + Seek + Send + Sync + 'static,
    {
        let actual_size = content
            .seek(SeekFrom::End(0))
            .map_err(|e| ValidationError::Unreadable(format!("cannot measure content: {}", e)))?;
        content
            .seek(SeekFrom::Start(0))
            .map_err(|e| ValidationError::Unreadable(format!("cannot measure content: {}", e)))?;

        self.check_size(filename, declared_size, actual_size)?;
        let filename = self.check_name(filename)?;
        let content_type = self.detect_content_type(&mut content, &filename)?;

        content
            .seek(SeekFrom::Start(0))
            .map_err(|e| ValidationError::Unreadable(format!("cannot rewind for duration check: {}", e)))?;

        let duration = self.check_duration(content, content_type)?;

        Ok(ValidatedUpload {
            filename,
            content_type,
            duration,
        })
    }

    /// Declared size is checked first so an honest oversized upload reports
    /// the size the client sent
    fn check_size(&self, filename: &str, declared_size: u64, actual_size: u64) -> Result<(), ValidationError> {
        let max = self.limits.max_file_size_bytes;

        for size in [declared_size, actual_size] {
            if size > max {
                return Err(ValidationError::TooLarge {
                    filename: filename.to_string(),
                    size,
                    max,
                });
            }
        }

        if declared_size == 0 || actual_size == 0 {
            return Err(ValidationError::EmptyFile {
                filename: filename.to_string(),
            });
        }

        if declared_size != actual_size {
            return Err(ValidationError::SizeMismatch {
                filename: filename.to_string(),
                declared: declared_size,
                actual: actual_size,
            });
        }

        Ok(())
    }

    fn check_name(&self, filename: &str) -> Result<String, ValidationError> {
        let trimmed = filename.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyName);
        }

        let len = trimmed.chars().count();
        if len > self.limits.max_filename_len {
            return Err(ValidationError::NameTooLong {
                len,
                max: self.limits.max_filename_len,
            });
        }

        sanitize_filename(trimmed).ok_or(ValidationError::EmptyName)
    }

    fn detect_content_type<R: Read>(
        &self,
        content: &mut R,
        filename: &str,
    ) -> Result<&'static str, ValidationError> {
        let mut prefix = Vec::with_capacity(self.limits.sniff_len);
        content
            .by_ref()
            .take(self.limits.sniff_len as u64)
            .read_to_end(&mut prefix)
            .map_err(|e| ValidationError::Unreadable(e.to_string()))?;

        let kind = infer::get(&prefix).ok_or(ValidationError::UnknownType)?;
        let detected = kind.mime_type();
        let extension = file_extension(filename);

        let expected = media_types::extension_for(detected).ok_or_else(|| {
            ValidationError::UnsupportedType {
                extension: extension.clone(),
                detected: detected.to_string(),
            }
        })?;

        if expected != extension {
            return Err(ValidationError::TypeMismatch {
                extension,
                expected: expected.to_string(),
                detected: detected.to_string(),
            });
        }

        Ok(detected)
    }

    fn check_duration<R>(&self, content: R, content_type: &str) -> Result<Duration, ValidationError>
    where
        R: Read + Send + Sync + 'static,
    {
        let max = self.limits.max_duration();
        let hint = media_types::extension_for(content_type)
            .map(|ext| ext.trim_start_matches('.'))
            .unwrap_or_default();

        let duration = decoded_duration(content, hint, max).map_err(ValidationError::Undecodable)?;

        if duration > max {
            return Err(ValidationError::TooLong {
                seconds: duration.as_secs_f64(),
                max_seconds: max.as_secs_f64(),
            });
        }

        Ok(duration)
    }
}

/// Reduce a client-supplied name to its last path component
///
/// Both `/` and `\` count as separators. Returns `None` when nothing usable
/// remains (`"dir/"`, `".."`).
pub fn sanitize_filename(name: &str) -> Option<String> {
    let base = name
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or_default()
        .trim();

    match base {
        "" | "." | ".." => None,
        base => Some(base.to_string()),
    }
}

/// Lowercased extension including the dot, or empty
fn file_extension(filename: &str) -> String {
    filename
        .rfind('.')
        .map(|idx| filename[idx..].to_lowercase())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn validator() -> UploadValidator {
        UploadValidator::new(Limits::default())
    }

    fn png_bytes() -> Vec<u8> {
        let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
        bytes.extend_from_slice(&[0u8; 64]);
        bytes
    }

    #[test]
    fn test_sanitize_strips_directories() {
        assert_eq!(sanitize_filename("../../etc/passwd").as_deref(), Some("passwd"));
        assert_eq!(sanitize_filename("C:\\Users\\me\\hi.mp3").as_deref(), Some("hi.mp3"));
        assert_eq!(sanitize_filename("plain.wav").as_deref(), Some("plain.wav"));
    }

    #[test]
    fn test_sanitize_rejects_empty_components() {
        assert_eq!(sanitize_filename("sounds/"), None);
        assert_eq!(sanitize_filename(".."), None);
        assert_eq!(sanitize_filename("a/."), None);
    }

    #[test]
    fn test_extension_is_lowercased() {
        assert_eq!(file_extension("Clip.MP3"), ".mp3");
        assert_eq!(file_extension("noext"), "");
        assert_eq!(file_extension("archive.tar.wav"), ".wav");
    }

    #[test]
    fn test_zero_size_rejected() {
        let result = validator().validate("a.mp3", 0, Cursor::new(Vec::new()));
        assert!(matches!(result, Err(ValidationError::EmptyFile { .. })));
    }

    #[test]
    fn test_one_byte_over_size_rejected() {
        let limit = Limits::default().max_file_size_bytes;
        let result = validator().validate("a.mp3", limit + 1, Cursor::new(vec![0u8; 16]));
        assert!(matches!(result, Err(ValidationError::TooLarge { size, .. }) if size == limit + 1));
    }

    #[test]
    fn test_content_over_limit_rejected_despite_small_declared_size() {
        let validator = UploadValidator::new(Limits {
            max_file_size_bytes: 64,
            ..Limits::default()
        });

        let result = validator.validate("a.wav", 10, Cursor::new(vec![0u8; 65]));
        assert!(matches!(result, Err(ValidationError::TooLarge { size: 65, max: 64, .. })));
    }

    #[test]
    fn test_declared_size_must_match_content() {
        let result = validator().validate("a.wav", 10, Cursor::new(vec![0u8; 12]));
        assert!(matches!(
            result,
            Err(ValidationError::SizeMismatch { declared: 10, actual: 12, .. })
        ));
    }

    #[test]
    fn test_empty_content_rejected() {
        let result = validator().validate("a.wav", 10, Cursor::new(Vec::new()));
        assert!(matches!(result, Err(ValidationError::EmptyFile { .. })));
    }

    #[test]
    fn test_blank_name_rejected() {
        let result = validator().validate("   ", 10, Cursor::new(vec![0u8; 10]));
        assert!(matches!(result, Err(ValidationError::EmptyName)));
    }

    #[test]
    fn test_long_name_rejected() {
        let name = format!("{}.mp3", "a".repeat(252));
        let result = validator().validate(&name, 10, Cursor::new(vec![0u8; 10]));
        assert!(matches!(result, Err(ValidationError::NameTooLong { len: 256, max: 255 })));
    }

    #[test]
    fn test_unknown_bytes_rejected() {
        let bytes = b"definitely not an audio stream".to_vec();
        let size = bytes.len() as u64;
        let result = validator().validate("noise.mp3", size, Cursor::new(bytes));
        assert!(matches!(result, Err(ValidationError::UnknownType)));
    }

    #[test]
    fn test_non_audio_type_rejected() {
        let bytes = png_bytes();
        let size = bytes.len() as u64;
        let result = validator().validate("picture.mp3", size, Cursor::new(bytes));
        assert!(matches!(
            result,
            Err(ValidationError::UnsupportedType { ref detected, .. }) if detected == "image/png"
        ));
    }
}
