//! Helpers for the file upload tool.

use serde_json::Value;
use std::path::Path;

/// MIME type for files whose type cannot be guessed.
pub const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

const VIDEO_EXTENSIONS: [&str; 4] = ["mp4", "mov", "avi", "mkv"];
const AUDIO_EXTENSIONS: [&str; 4] = ["mp3", "wav", "aac", "m4a"];

/// Guess the MIME type of `path` from its extension.
///
/// Known media extensions not covered by the MIME table fall back to
/// `video/mp4` or `audio/mpeg`; everything else is `application/octet-stream`.
pub fn guess_mime_type(path: &Path) -> String {
    if let Some(mime) = mime_guess::from_path(path).first_raw() {
        return mime.to_string();
    }

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    if VIDEO_EXTENSIONS.contains(&extension.as_str()) {
        "video/mp4".to_string()
    } else if AUDIO_EXTENSIONS.contains(&extension.as_str()) {
        "audio/mpeg".to_string()
    } else {
        FALLBACK_MIME_TYPE.to_string()
    }
}

/// File name sent with the multipart upload.
pub fn upload_file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "file".to_string())
}

/// Replace a list-valued `data.file_path` with its first element.
///
/// Returns whether the envelope was changed.
pub fn unwrap_file_path(envelope: &mut Value) -> bool {
    let Some(file_path) = envelope
        .get_mut("data")
        .and_then(|data| data.get_mut("file_path"))
    else {
        return false;
    };

    let first = match file_path {
        Value::Array(items) if !items.is_empty() => items.swap_remove(0),
        _ => return false,
    };
    *file_path = first;
    true
}
