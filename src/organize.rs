use anyhow::{Context, Result, bail};
use colored::Colorize;
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};
use tabled::{Table, Tabled, settings::Style};
use walkdir::WalkDir;

use crate::{
    config::Config,
    disc::ShowIdentity,
    episode::{EpisodeAssignment, assign_episodes, disc_start},
    print_error, print_info, print_warning,
    rename::{Batch, Plan, PlannedAction, Report, Tally},
    tmdb::{RemoteEpisode, TmdbClient, episode_title},
    video::{clean_series_name, episode_file_name, list_video_files, qualifying_video},
};

pub struct Options {
    pub config: Config,
    pub dry_run: bool,
    /// Present when TMDB lookups are enabled.
    pub tmdb: Option<TmdbClient>,
}

/// Result of processing one disc directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectorySummary {
    pub directory: PathBuf,
    pub series_name: String,
    pub season_number: u32,
    pub disc_number: u32,
    pub first_episode: u32,
    pub files: usize,
    pub tally: Tally,
    /// Renames applied, or previewed in a dry run.
    pub actions: Vec<PlannedAction>,
    /// Set when the directory failed as a whole.
    pub error: Option<String>,
}

impl DirectorySummary {
    fn failed(directory: &Path, identity: &ShowIdentity, error: &anyhow::Error) -> Self {
        Self {
            directory: directory.to_path_buf(),
            series_name: identity.series_name.clone(),
            season_number: identity.season_number,
            disc_number: identity.disc_number,
            first_episode: 0,
            files: 0,
            tally: Tally::default(),
            actions: Vec::new(),
            error: Some(format!("{error:#}")),
        }
    }
}

/// Disc directories directly under `base`, in name order.
pub fn discover_disc_dirs(base: &Path) -> Vec<(PathBuf, ShowIdentity)> {
    WalkDir::new(base)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_dir())
        .filter_map(|entry| {
            let name = entry.file_name().to_string_lossy().to_string();
            match ShowIdentity::parse(&name) {
                Some(identity) => Some((entry.into_path(), identity)),
                None => {
                    print_info!("{} {}: not a disc directory", "Skip".dimmed(), name);
                    None
                }
            }
        })
        .collect()
}

/// Rename the episodes of every disc directory under `base`.
///
/// A directory that fails is recorded with its error and the run moves on to
/// the next one.
pub async fn organize(base: &Path, options: &Options) -> Vec<DirectorySummary> {
    let mut summaries = Vec::new();

    for (dir, identity) in discover_disc_dirs(base) {
        print_info!("\n{}", format!("== {} ({})", identity.original_dir_name, identity).bold());
        match process_directory(&dir, &identity, base, options).await {
            Ok(Some(summary)) => summaries.push(summary),
            Ok(None) => {}
            Err(error) => {
                print_error!("{}: {:#}", identity.original_dir_name, error);
                summaries.push(DirectorySummary::failed(&dir, &identity, &error));
            }
        }
    }

    if summaries.is_empty() {
        print_info!("No disc directories processed in {}", base.display());
    }
    summaries
}

/// Rename the episodes of a single disc directory.
///
/// Returns `None` when the directory holds no qualifying video files.
pub async fn process_directory(
    dir: &Path,
    identity: &ShowIdentity,
    parent: &Path,
    options: &Options,
) -> Result<Option<DirectorySummary>> {
    let files = list_video_files(dir, &options.config);
    if files.is_empty() {
        print_warning!(
            "Skip {}: no qualifying video files",
            identity.original_dir_name
        );
        return Ok(None);
    }
    let file_count = files.len();

    let start = disc_start(identity, parent, &options.config);
    for disc in &start.missing_discs {
        print_warning!(
            "{} not found or empty, counting it as 0 episodes",
            identity.sibling_dir_name(*disc)
        );
    }
    let last_episode = u32::try_from(file_count - 1)
        .ok()
        .and_then(|offset| start.start.checked_add(offset))
        .context("Episode numbers overflow")?;

    let mut series_name = identity.series_name.clone();
    let mut remote_episodes = None;
    if let Some(tmdb) = &options.tmdb {
        if let Some(series) = tmdb.search_series(&identity.series_name).await {
            print_info!("TMDB match: {} (id {})", series.name, series.id);
            remote_episodes = tmdb
                .season_episodes(series.id, identity.season_number)
                .await;
            series_name = series.name;
        }
    }
    if clean_series_name(&series_name).is_empty() {
        bail!("Series name {:?} is empty after removing illegal characters", series_name);
    }

    let mut assignments = assign_episodes(identity.season_number, start.start, files);
    if let Some(episodes) = &remote_episodes {
        attach_titles(&mut assignments, episodes);
        warn_on_count_mismatch(identity, last_episode, episodes);
    }

    // Plan everything before touching the disk so dry and live runs agree.
    let mut batch = Batch::new();
    let plans: Vec<(Plan, Option<String>)> = assignments
        .into_iter()
        .map(|assignment| {
            let new_name = episode_file_name(
                &series_name,
                assignment.season_number,
                assignment.episode_number,
                &assignment.file.extension,
            );
            (
                batch.plan_rename(&assignment.file.path, &new_name),
                assignment.title,
            )
        })
        .collect();

    let mut report = Report::default();
    for (plan, title) in &plans {
        report.run(plan, options.dry_run, title.as_deref());
    }

    Ok(Some(DirectorySummary {
        directory: dir.to_path_buf(),
        series_name,
        season_number: identity.season_number,
        disc_number: identity.disc_number,
        first_episode: start.start,
        files: file_count,
        tally: report.tally,
        actions: report.actions,
        error: None,
    }))
}

fn attach_titles(assignments: &mut [EpisodeAssignment], episodes: &[RemoteEpisode]) {
    for assignment in assignments {
        assignment.title = episode_title(episodes, assignment.episode_number).map(str::to_string);
    }
}

fn warn_on_count_mismatch(identity: &ShowIdentity, last_episode: u32, episodes: &[RemoteEpisode]) {
    let remote_last = episodes
        .iter()
        .map(|episode| episode.episode_number)
        .max()
        .unwrap_or(0);
    if last_episode > remote_last {
        print_warning!(
            "{} ends at episode {} but TMDB lists only {} episodes for season {}",
            identity.original_dir_name,
            last_episode,
            remote_last,
            identity.season_number
        );
    }
}

/// Renames reported by `summaries`, keyed by their source path.
///
/// A dry run leaves files under their old names; relocation uses this map to
/// plan against the names a live run would have produced.
pub fn pending_renames(summaries: &[DirectorySummary]) -> HashMap<PathBuf, PathBuf> {
    summaries
        .iter()
        .flat_map(|summary| &summary.actions)
        .map(|action| (action.source.clone(), action.destination.clone()))
        .collect()
}

/// Move every qualifying video file under `base` into `destination`.
///
/// Files keep their names, after applying `renames` to paths that have not
/// been renamed on disk yet. Files already inside `destination` are left
/// alone. The destination directory is only created for a live run.
pub fn relocate(
    base: &Path,
    destination: &Path,
    renames: &HashMap<PathBuf, PathBuf>,
    config: &Config,
    dry_run: bool,
) -> Result<Report> {
    let mut files: Vec<_> = WalkDir::new(base)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !entry.path().starts_with(destination))
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| {
            let size = entry.metadata().ok()?.len();
            let path = renames.get(entry.path()).map_or(entry.path(), PathBuf::as_path);
            qualifying_video(path, size, config)
        })
        .collect();
    // Renamed paths can sort differently from the names on disk.
    files.sort_by(|a, b| a.path.cmp(&b.path));

    let mut report = Report::default();
    if files.is_empty() {
        print_info!("No video files to move into {}", destination.display());
        return Ok(report);
    }

    if !dry_run {
        fs::create_dir_all(destination)
            .with_context(|| format!("Failed to create {}", destination.display()))?;
    }

    let mut batch = Batch::new();
    let plans: Vec<Plan> = files
        .iter()
        .map(|file| batch.plan(&file.path, destination.join(file.file_name())))
        .collect();
    for plan in &plans {
        report.run(plan, dry_run, None);
    }
    Ok(report)
}

#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "Directory")]
    directory: String,
    #[tabled(rename = "Series")]
    series: String,
    #[tabled(rename = "Season")]
    season: u32,
    #[tabled(rename = "Disc")]
    disc: u32,
    #[tabled(rename = "Episodes")]
    episodes: String,
    #[tabled(rename = "Renamed")]
    renamed: usize,
    #[tabled(rename = "Unchanged")]
    unchanged: usize,
    #[tabled(rename = "Skipped")]
    skipped: usize,
    #[tabled(rename = "Failed")]
    failed: usize,
}

/// Render the per-directory results as a table.
pub fn summary_table(summaries: &[DirectorySummary]) -> String {
    let width = (textwrap::termwidth() / 4).max(20);
    let rows = summaries.iter().map(|summary| {
        let name = summary
            .directory
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();
        let episodes = match (&summary.error, summary.files) {
            (Some(error), _) => textwrap::fill(&format!("error: {error}"), width),
            (None, 0) => "-".to_string(),
            (None, files) => format!(
                "E{:02}-E{:02}",
                summary.first_episode,
                summary.first_episode as usize + files - 1
            ),
        };
        SummaryRow {
            directory: textwrap::fill(&name, width),
            series: summary.series_name.clone(),
            season: summary.season_number,
            disc: summary.disc_number,
            episodes,
            renamed: summary.tally.applied,
            unchanged: summary.tally.unchanged,
            skipped: summary.tally.skipped,
            failed: summary.tally.failed + usize::from(summary.error.is_some()),
        }
    });
    Table::new(rows).with(Style::rounded()).to_string()
}
