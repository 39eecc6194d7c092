//! File-type and scratch-directory helpers for uploaded media.

use std::{io::ErrorKind, path::Path};

use tracing::{debug, warn};

const FILE_TYPE_MAPPINGS: &[(&str, &str)] = &[
    ("glb", "model/gltf-binary"),
    ("mp4", "video/mp4"),
    ("webm", "video/webm"),
];

pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Extension for a MIME type, ignoring parameters such as `;codecs=...`.
pub fn extension_for_mime(content_type: &str) -> Option<&'static str> {
    let base = content_type.split(';').next().unwrap_or_default().trim().to_lowercase();
    FILE_TYPE_MAPPINGS
        .iter()
        .find(|(_, mime)| *mime == base)
        .map(|(ext, _)| *ext)
}

pub fn mime_from_extension(extension: &str) -> &'static str {
    let extension = extension.trim_start_matches('.').to_lowercase();
    FILE_TYPE_MAPPINGS
        .iter()
        .find(|(ext, _)| *ext == extension)
        .map(|(_, mime)| *mime)
        .unwrap_or(DEFAULT_MIME_TYPE)
}

pub fn mime_from_filename(filename: &str) -> &'static str {
    match filename.rsplit_once('.') {
        Some((_, extension)) => mime_from_extension(extension),
        None => DEFAULT_MIME_TYPE,
    }
}

pub fn is_under_size_limit(size: u64, max_size: u64) -> bool {
    size <= max_size
}

/// Removes a scratch directory tree. A missing directory is not an error; other
/// failures are logged and swallowed because cleanup never fails a request.
pub async fn clean_directory(path: &Path) {
    match tokio::fs::remove_dir_all(path).await {
        Ok(()) => debug!("Cleaned and removed {}", path.display()),
        Err(err) if err.kind() == ErrorKind::NotFound => {
            debug!("Directory {} does not exist, skipping cleanup", path.display())
        }
        Err(err) => warn!("Failed to clean directory {}: {err}", path.display()),
    }
}
