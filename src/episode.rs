use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::Config;
use crate::disc::ShowIdentity;
use crate::video::{VideoFile, list_video_files};

/// Where a disc's episode numbering begins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscStart {
    pub start: u32,
    /// Previous discs that were missing or had no qualifying files and so
    /// contributed nothing to `start`.
    pub missing_discs: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeAssignment {
    pub file: VideoFile,
    pub season_number: u32,
    pub episode_number: u32,
    pub title: Option<String>,
}

/// Compute the first episode number of `identity`'s disc.
///
/// Disc 1 always starts at episode 1. Later discs start after every episode
/// found on discs `1..disc_number` of the same series and season, looked up as
/// siblings under `parent`.
pub fn disc_start(identity: &ShowIdentity, parent: &Path, config: &Config) -> DiscStart {
    let mut start: u32 = 1;
    let mut missing_discs = Vec::new();

    for disc in 1..identity.disc_number {
        let count = find_disc_dir(identity, parent, disc)
            .map(|dir| list_video_files(&dir, config).len())
            .unwrap_or(0);

        if count == 0 {
            missing_discs.push(disc);
        }
        start = start.saturating_add(u32::try_from(count).unwrap_or(u32::MAX));
    }

    DiscStart {
        start,
        missing_discs,
    }
}

/// Locate disc `disc` of the same series and season under `parent`.
///
/// The canonical directory name is tried first. Siblings whose names parse to
/// the same identity, such as `Show_S01_D01`, are accepted as a fallback.
pub fn find_disc_dir(identity: &ShowIdentity, parent: &Path, disc: u32) -> Option<PathBuf> {
    let canonical = parent.join(identity.sibling_dir_name(disc));
    if canonical.is_dir() {
        return Some(canonical);
    }

    WalkDir::new(parent)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_dir())
        .find(|entry| {
            ShowIdentity::parse(&entry.file_name().to_string_lossy())
                .is_some_and(|other| identity.is_disc_of_same_season(&other, disc))
        })
        .map(|entry| entry.into_path())
}

/// Number `files` consecutively from `start`, in the order given.
pub fn assign_episodes(
    season_number: u32,
    start: u32,
    files: Vec<VideoFile>,
) -> Vec<EpisodeAssignment> {
    files
        .into_iter()
        .zip(start..)
        .map(|(file, episode_number)| EpisodeAssignment {
            file,
            season_number,
            episode_number,
            title: None,
        })
        .collect()
}
