//! Generated output listings and safe media path resolution.

use rp_protocol::Outputs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// URL prefix under which output files are served.
pub const MEDIA_PREFIX: &str = "/media";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MediaError {
    #[error("Forbidden")]
    Forbidden,

    #[error("Not found")]
    NotFound,
}

/// List the files in `<output_dir>/audio` and `<output_dir>/video`.
pub fn list_outputs(output_dir: &Path) -> Outputs {
    Outputs {
        audio: list_media_urls(output_dir, "audio"),
        video: list_media_urls(output_dir, "video"),
    }
}

/// Sorted `/media/<sub>/<file>` URLs for the regular files directly inside
/// `<output_dir>/<sub>`. A missing directory yields an empty list.
fn list_media_urls(output_dir: &Path, sub: &str) -> Vec<String> {
    let dir = output_dir.join(sub);
    if !dir.is_dir() {
        return Vec::new();
    }

    let mut urls: Vec<String> = WalkDir::new(&dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| {
            entry
                .file_name()
                .to_str()
                .map(|name| format!("{MEDIA_PREFIX}/{sub}/{name}"))
        })
        .collect();
    urls.sort();
    urls
}

/// Resolve a request path relative to the output root.
///
/// # Errors
///
/// - `MediaError::Forbidden` if the path has `..`, root or prefix
///   components, or resolves (through symlinks) outside the output root
/// - `MediaError::NotFound` if the file does not exist
pub async fn resolve_media(output_dir: &Path, relative: &str) -> Result<PathBuf, MediaError> {
    let relative = Path::new(relative);
    let escapes = relative
        .components()
        .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)));
    if escapes {
        return Err(MediaError::Forbidden);
    }

    let root = tokio::fs::canonicalize(output_dir)
        .await
        .map_err(|_| MediaError::NotFound)?;
    let resolved = tokio::fs::canonicalize(root.join(relative))
        .await
        .map_err(|_| MediaError::NotFound)?;

    if !resolved.starts_with(&root) {
        return Err(MediaError::Forbidden);
    }

    let metadata = tokio::fs::metadata(&resolved)
        .await
        .map_err(|_| MediaError::NotFound)?;
    if !metadata.is_file() {
        return Err(MediaError::NotFound);
    }
    Ok(resolved)
}

/// Content type for a served file, inferred from its extension.
pub fn content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "ogg" => "audio/ogg",
        "m4a" => "audio/mp4",
        "aac" => "audio/aac",
        "flac" => "audio/flac",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "mkv" => "video/x-matroska",
        "srt" => "application/x-subrip",
        "vtt" => "text/vtt",
        "txt" | "log" => "text/plain; charset=utf-8",
        "json" => "application/json",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        _ => "application/octet-stream",
    }
}
