use sanitize_filename::sanitize;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::Config;

pub const VIDEO_EXTENSIONS: [&str; 4] = ["mkv", "mp4", "avi", "mov"];

/// A video file counted as a real episode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoFile {
    pub path: PathBuf,
    pub size: u64,
    /// Lowercase, without the leading dot.
    pub extension: String,
}

impl VideoFile {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

pub fn episode_id(season: u32, episode: u32) -> String {
    format!("S{:02}E{:02}", season, episode)
}

/// Return the lowercase extension if the path names a supported video file.
pub fn parse_extension(path: &Path) -> Option<String> {
    if path.is_dir() {
        return None;
    }

    let ext = path.extension()?.to_str()?.to_lowercase();
    VIDEO_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

/// Check a single path against the extension and size filters.
pub fn qualifying_video(path: &Path, size: u64, config: &Config) -> Option<VideoFile> {
    if size <= config.min_file_size {
        return None;
    }
    let extension = parse_extension(path)?;
    Some(VideoFile {
        path: path.to_path_buf(),
        size,
        extension,
    })
}

/// List the qualifying video files directly inside `dir`.
///
/// Files are returned in ascending file name order, which is taken to be
/// episode order. An unreadable or missing directory yields an empty list.
pub fn list_video_files(dir: &Path, config: &Config) -> Vec<VideoFile> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| {
            let size = entry.metadata().ok()?.len();
            qualifying_video(entry.path(), size, config)
        })
        .collect()
}

/// Strip characters that are illegal in file names and trim the result.
pub fn clean_series_name(name: &str) -> String {
    sanitize(name).trim().to_string()
}

/// Jellyfin style file name, e.g. `Show Name S01E04.mkv`.
pub fn episode_file_name(series_name: &str, season: u32, episode: u32, extension: &str) -> String {
    format!(
        "{} {}.{}",
        clean_series_name(series_name),
        episode_id(season, episode),
        extension.trim_start_matches('.')
    )
}
