use anyhow::{Context, Result, bail};
use clap::Parser;
use discrename::{
    config::Config,
    organize::{Options, organize, pending_renames, relocate, summary_table},
    print_info, print_warning,
    tmdb::TmdbClient,
};
use inquire::{Confirm, InquireError};
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

/// Rename disc rips such as `Show_Name_S1_D2/title_03.mkv` to `Show Name S01E06.mkv`
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Directory containing the `<Series>_S<N>_D<M>` disc folders
    base_path: PathBuf,
    /// Use TMDB for the series name and episode titles
    #[arg(long)]
    tmdb: bool,
    /// Show what would be renamed without changing anything
    #[arg(long)]
    dry_run: bool,
    /// Move every video file into this folder after renaming
    #[arg(long)]
    destination: Option<PathBuf>,
    /// Ignore video files of this size or smaller (samples, trailers)
    #[arg(long, default_value_t = 50)]
    min_size_mb: u64,
    /// Do not ask for confirmation before making changes
    #[arg(short, long)]
    yes: bool,
}

fn resolve_base_path(path: &Path) -> Result<PathBuf> {
    if !path.is_dir() {
        bail!("Base path {:?} is not a directory", path);
    }
    path.canonicalize()
        .with_context(|| format!("Failed to resolve {:?}", path))
}

fn resolve_destination(path: &Path) -> Result<PathBuf> {
    if path.exists() {
        if !path.is_dir() {
            bail!("Destination {:?} is not a directory", path);
        }
        return path
            .canonicalize()
            .with_context(|| format!("Failed to resolve {:?}", path));
    }
    std::path::absolute(path).with_context(|| format!("Failed to resolve {:?}", path))
}

fn confirm(base: &Path, destination: Option<&Path>) -> Result<bool> {
    let message = match destination {
        Some(destination) => format!(
            "Rename episodes in {} and move them to {}?",
            base.display(),
            destination.display()
        ),
        None => format!("Rename episodes in {}?", base.display()),
    };
    match Confirm::new(&message).with_default(false).prompt() {
        Ok(answer) => Ok(answer),
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(false),
        Err(error) => Err(error).context("Confirmation failed, pass --yes to skip the prompt"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    let base = resolve_base_path(&args.base_path)?;
    let destination = args
        .destination
        .as_deref()
        .map(resolve_destination)
        .transpose()?;
    let config = Config::from_env().with_min_file_size_mb(args.min_size_mb);

    if !args.dry_run && !args.yes && !confirm(&base, destination.as_deref())? {
        print_info!("Aborted, no changes made");
        return Ok(());
    }

    let tmdb = if args.tmdb {
        match TmdbClient::new(&config) {
            Ok(client) => Some(client),
            Err(error) => {
                print_warning!("{:#}, continuing without TMDB", error);
                None
            }
        }
    } else {
        None
    };

    let options = Options {
        config,
        dry_run: args.dry_run,
        tmdb,
    };

    let summaries = organize(&base, &options).await;
    if !summaries.is_empty() {
        println!("\n{}", summary_table(&summaries));
    }

    if let Some(destination) = destination {
        print_info!("\nMoving video files to {}", destination.display());
        // A dry run left the files under their old names.
        let renames = if options.dry_run {
            pending_renames(&summaries)
        } else {
            HashMap::new()
        };
        let report = relocate(
            &base,
            &destination,
            &renames,
            &options.config,
            options.dry_run,
        )?;
        print_info!(
            "Moved {}, skipped {}, failed {}",
            report.tally.applied,
            report.tally.skipped,
            report.tally.failed
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use tempfile::TempDir;

    #[test]
    fn test_args_are_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_args() {
        let args = Args::try_parse_from([
            "discrename",
            "/media/rips",
            "--tmdb",
            "--dry-run",
            "--destination",
            "/media/library",
        ])
        .unwrap();
        assert_eq!(args.base_path, PathBuf::from("/media/rips"));
        assert!(args.tmdb);
        assert!(args.dry_run);
        assert_eq!(args.destination, Some(PathBuf::from("/media/library")));
        assert_eq!(args.min_size_mb, 50);
        assert!(!args.yes);
    }

    #[test]
    fn test_base_path_is_required() {
        assert!(Args::try_parse_from(["discrename"]).is_err());
    }

    #[test]
    fn test_resolve_base_path() {
        let temp_dir = TempDir::new().unwrap();
        assert!(resolve_base_path(temp_dir.path()).is_ok());
        assert!(resolve_base_path(&temp_dir.path().join("missing")).is_err());

        let file = temp_dir.path().join("file.mkv");
        std::fs::write(&file, "video").unwrap();
        assert!(resolve_base_path(&file).is_err());
    }

    #[test]
    fn test_resolve_destination() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("library");
        assert!(resolve_destination(&missing).unwrap().ends_with("library"));

        let file = temp_dir.path().join("file.mkv");
        std::fs::write(&file, "video").unwrap();
        assert!(resolve_destination(&file).is_err());
    }
}
