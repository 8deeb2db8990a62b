use anyhow::{Context, Result};
use colored::Colorize;
use std::{
    collections::HashSet,
    fs::{self, File, OpenOptions},
    io,
    path::{Path, PathBuf},
};

use crate::{print_error, print_info, print_warning};

/// A rename or move that has been checked but not yet performed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedAction {
    pub source: PathBuf,
    pub destination: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
    Ready(PlannedAction),
    /// The source already has the wanted name.
    Unchanged(PathBuf),
    /// The destination already exists on disk.
    Collision(PlannedAction),
    /// An earlier plan in the same batch already targets the destination.
    Claimed(PlannedAction),
}

#[derive(Debug)]
pub enum Outcome {
    Applied,
    Previewed,
    Unchanged,
    CollisionSkipped,
    Failed(anyhow::Error),
}

/// Plans a group of actions so that no two of them claim the same destination.
///
/// Planning looks only at the filesystem as it was before any action ran, so a
/// dry run and a live run of the same batch produce the same plans.
#[derive(Debug, Default)]
pub struct Batch {
    claimed: HashSet<PathBuf>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn plan(&mut self, source: &Path, destination: PathBuf) -> Plan {
        if source == destination {
            return Plan::Unchanged(destination);
        }

        let action = PlannedAction {
            source: source.to_path_buf(),
            destination,
        };
        if is_occupied(&action.destination) {
            Plan::Collision(action)
        } else if !self.claimed.insert(action.destination.clone()) {
            Plan::Claimed(action)
        } else {
            Plan::Ready(action)
        }
    }

    /// Plan renaming `source` to `new_name` inside its own directory.
    pub fn plan_rename(&mut self, source: &Path, new_name: &str) -> Plan {
        let destination = source
            .parent()
            .map(|parent| parent.join(new_name))
            .unwrap_or_else(|| PathBuf::from(new_name));
        self.plan(source, destination)
    }
}

impl PlannedAction {
    /// Perform the action. Never overwrites an existing file, even one that
    /// appears after planning.
    pub fn apply(&self) -> Result<()> {
        move_file(&self.source, &self.destination)
    }
}

/// Report a plan and, unless `dry_run` is set, carry it out.
///
/// `note` is appended to the report line, e.g. an episode title.
pub fn execute(plan: &Plan, dry_run: bool, note: Option<&str>) -> Outcome {
    match plan {
        Plan::Unchanged(path) => {
            print_info!("{} {}", "Unchanged".dimmed(), file_name(path));
            Outcome::Unchanged
        }
        Plan::Collision(action) => {
            print_warning!(
                "Skip {}: {} already exists",
                file_name(&action.source),
                action.destination.display()
            );
            Outcome::CollisionSkipped
        }
        Plan::Claimed(action) => {
            print_warning!(
                "Skip {}: {} is already taken by another file in this run",
                file_name(&action.source),
                file_name(&action.destination)
            );
            Outcome::CollisionSkipped
        }
        Plan::Ready(action) => {
            let line = match note {
                Some(note) => format!("{} ({note})", describe(action)),
                None => describe(action),
            };
            if dry_run {
                print_info!("{} {}", "[dry-run]".cyan(), line);
                return Outcome::Previewed;
            }
            match action.apply() {
                Ok(()) => {
                    print_info!("{}", line.green());
                    Outcome::Applied
                }
                Err(error) if is_already_exists(&error) => {
                    print_warning!(
                        "Skip {}: {} appeared during the run",
                        file_name(&action.source),
                        action.destination.display()
                    );
                    Outcome::CollisionSkipped
                }
                Err(error) => {
                    print_error!("{}: {:#}", line, error);
                    Outcome::Failed(error)
                }
            }
        }
    }
}

/// Outcomes of a batch, with the actions that were applied or previewed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    pub tally: Tally,
    pub actions: Vec<PlannedAction>,
}

impl Report {
    /// Execute `plan` and record its outcome.
    pub fn run(&mut self, plan: &Plan, dry_run: bool, note: Option<&str>) {
        let outcome = execute(plan, dry_run, note);
        if let (Plan::Ready(action), Outcome::Applied | Outcome::Previewed) = (plan, &outcome) {
            self.actions.push(action.clone());
        }
        self.tally.record(&outcome);
    }
}

/// Per-batch counts of outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub applied: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl Tally {
    pub fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Applied | Outcome::Previewed => self.applied += 1,
            Outcome::Unchanged => self.unchanged += 1,
            Outcome::CollisionSkipped => self.skipped += 1,
            Outcome::Failed(_) => self.failed += 1,
        }
    }
}

fn describe(action: &PlannedAction) -> String {
    if action.source.parent() == action.destination.parent() {
        format!(
            "{} -> {}",
            file_name(&action.source),
            file_name(&action.destination)
        )
    } else {
        format!(
            "{} -> {}",
            action.source.display(),
            action.destination.display()
        )
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

fn is_occupied(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

fn is_already_exists(error: &anyhow::Error) -> bool {
    error
        .downcast_ref::<io::Error>()
        .is_some_and(|error| error.kind() == io::ErrorKind::AlreadyExists)
}

/// Move `source` to `destination`, failing with `AlreadyExists` if the
/// destination is present at the moment of the move.
///
/// A hard link claims the destination atomically. Filesystems without hard
/// links, and moves across devices, fall back to copying into a newly
/// created file.
fn move_file(source: &Path, destination: &Path) -> Result<()> {
    match fs::hard_link(source, destination) {
        Ok(()) => fs::remove_file(source)
            .with_context(|| format!("Failed to remove {:?} after linking", source)),
        Err(error) if error.kind() == io::ErrorKind::AlreadyExists => Err(error)
            .with_context(|| format!("Failed to move {:?} to {:?}", source, destination)),
        Err(_) => copy_then_remove(source, destination),
    }
}

fn copy_then_remove(source: &Path, destination: &Path) -> Result<()> {
    let mut reader =
        File::open(source).with_context(|| format!("Failed to open {:?}", source))?;
    let mut writer = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(destination)
        .with_context(|| format!("Failed to create {:?}", destination))?;

    if let Err(error) = io::copy(&mut reader, &mut writer) {
        drop(writer);
        let _ = fs::remove_file(destination);
        return Err(error)
            .with_context(|| format!("Failed to copy {:?} to {:?}", source, destination));
    }
    fs::remove_file(source).with_context(|| format!("Failed to remove {:?} after copying", source))
}
