//! Source folder enumeration

use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::error::{TrimError, TrimResult};

/// Video extensions picked up when none are configured
pub const DEFAULT_EXTENSIONS: &[&str] = &["mp4", "avi", "mkv"];

/// Check whether `path` has one of `extensions` (case-insensitive)
pub fn has_video_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .map(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext)))
        .unwrap_or(false)
}

/// List the video files directly inside `dir`, sorted by file name
pub fn list_videos(dir: &Path, extensions: &[String]) -> TrimResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(TrimError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Source folder not found: {}", dir.display()),
        )));
    }

    let mut videos = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| TrimError::Io(e.into()))?;
        if entry.file_type().is_file() && has_video_extension(entry.path(), extensions) {
            videos.push(entry.into_path());
        } else {
            debug!("Ignoring non-video entry: {}", entry.path().display());
        }
    }

    videos.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(videos)
}

/// File name for display, falling back to the full path
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn default_extensions() -> Vec<String> {
        DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect()
    }

    #[test]
    fn test_list_videos_filters_and_sorts() {
        let dir = TempDir::new().unwrap();
        for name in ["b.mkv", "a.mp4", "c.AVI", "notes.txt", "d.mov"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        fs::create_dir(dir.path().join("nested.mp4")).unwrap();

        let videos = list_videos(dir.path(), &default_extensions()).unwrap();
        let names: Vec<String> = videos.iter().map(|p| display_name(p)).collect();
        assert_eq!(names, vec!["a.mp4", "b.mkv", "c.AVI"]);
    }

    #[test]
    fn test_list_videos_does_not_recurse() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub").join("inner.mp4"), b"x").unwrap();

        assert!(list_videos(dir.path(), &default_extensions()).unwrap().is_empty());
    }

    #[test]
    fn test_list_videos_missing_folder() {
        let dir = TempDir::new().unwrap();
        assert!(list_videos(&dir.path().join("missing"), &default_extensions()).is_err());
    }

    #[test]
    fn test_has_video_extension() {
        let exts = default_extensions();
        assert!(has_video_extension(Path::new("x/clip.MP4"), &exts));
        assert!(!has_video_extension(Path::new("x/clip"), &exts));
        assert!(!has_video_extension(Path::new("x/clip.mp4.txt"), &exts));
    }
}
