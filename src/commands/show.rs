//! List the paths a commit touches.

use crate::errors::ArkError;
use crate::history::History;
use crate::output::{Event, Reporter};
use crate::refs::resolver::RefResolver;
use crate::refs::RefManager;
use crate::snapshot::SnapshotManager;
use crate::store::Store;
use crate::utils::formatters::{format_timestamp, short_id};
use anyhow::Result;

/// Shows one commit: its record and the paths its archive touches.
///
/// Defaults to HEAD's commit.
///
/// # Errors
///
/// Fails with `NoCommitsYet` when HEAD has no commit, and the resolver's
/// errors for an explicit reference.
pub fn execute(store: &Store, reporter: &dyn Reporter, target: Option<&str>) -> Result<()> {
    let commit_id = match target {
        Some(reference) => RefResolver::new(store).resolve(reference)?,
        None => RefManager::new(store)
            .head_commit()?
            .ok_or(ArkError::NoCommitsYet)?,
    };

    let commit = History::new(store).load(&commit_id)?;
    let snapshots = SnapshotManager::new(store)?;
    let paths = snapshots.list_paths(&commit_id)?;

    reporter.info(&format!("commit {}", commit.id));
    if let Some(parent) = &commit.parent {
        reporter.info(&format!("parent {}", short_id(parent)));
    }
    reporter.info(&format!("date   {}", format_timestamp(commit.timestamp)));
    reporter.info(&format!("\n    {}\n", commit.message));

    let count = paths.len();
    for path in paths {
        reporter.emit(Event::PathRow(path));
    }
    reporter.info(&format!("{count} paths"));
    Ok(())
}
