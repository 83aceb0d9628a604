//! Object naming helpers shared by uploads, listings and downloads.
//!
//! Object names are single path components (a file's base name). The full
//! object key is the location's directory prefix joined with the name.

use std::path::Path;

use crate::traits::{StorageError, StorageResult};

/// Content type used when the extension is not a known audio format.
pub const DEFAULT_CONTENT_TYPE: &str = "audio/wav";

/// Object name for a local file: its base name.
pub fn object_name_for_path(path: &Path) -> StorageResult<String> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            StorageError::InvalidKey(format!("{} has no usable file name", path.display()))
        })?;
    validate_object_name(name)?;
    Ok(name.to_string())
}

/// Reject names that would escape the destination directory or the key prefix.
pub fn validate_object_name(name: &str) -> StorageResult<()> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(StorageError::InvalidKey(format!(
            "'{}' is not a single path component",
            name
        )));
    }
    Ok(())
}

/// Last `/`-separated component of an object key.
pub fn leaf_name(key: &str) -> Option<&str> {
    key.rsplit('/').next().filter(|name| !name.is_empty())
}

/// MIME type for an audio file name, by extension.
pub fn content_type_for(name: &str) -> &'static str {
    let extension = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match extension.as_deref() {
        Some("wav") => "audio/wav",
        Some("mp3") => "audio/mpeg",
        Some("flac") => "audio/flac",
        Some("ogg") | Some("opus") => "audio/ogg",
        Some("m4a") | Some("mp4") => "audio/mp4",
        Some("aac") => "audio/aac",
        Some("webm") => "audio/webm",
        _ => DEFAULT_CONTENT_TYPE,
    }
}
