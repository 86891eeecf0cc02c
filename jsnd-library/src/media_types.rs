//! Allowed content types and their file extensions
//!
//! The validator and the storage-filename generator both read this table,
//! so an accepted upload always maps to exactly one extension.

/// Sniffed MIME type → canonical extension (with leading dot)
pub const ALLOWED_TYPES: &[(&str, &str)] = &[
    ("audio/mpeg", ".mp3"),
    ("audio/x-wav", ".wav"),
    ("audio/wav", ".wav"),
];

/// Extension expected for an allowed content type
pub fn extension_for(content_type: &str) -> Option<&'static str> {
    ALLOWED_TYPES
        .iter()
        .find(|(mime, _)| *mime == content_type)
        .map(|(_, ext)| *ext)
}

/// Whether the content type is on the allow-list
pub fn is_allowed(content_type: &str) -> bool {
    extension_for(content_type).is_some()
}

/// Storage key for a sound: `<id><ext>`
///
/// Returns `None` for content types outside the allow-list.
pub fn storage_filename(id: &str, content_type: &str) -> Option<String> {
    extension_for(content_type).map(|ext| format!("{}{}", id, ext))
}
