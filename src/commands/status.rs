//! Report changed paths since HEAD's commit.

use crate::output::{Event, Reporter};
use crate::refs::{Head, RefManager};
use crate::snapshot::SnapshotManager;
use crate::store::Store;
use crate::utils::formatters::short_id;
use crate::worktree::WorkTree;
use anyhow::Result;

/// Reports the current position and the paths a capture would record.
///
/// The probe is exactly the commit mechanism run without publishing, so the
/// listing is whatever the archive tool would put into the next snapshot.
/// Immediately after a checkout the listing can contain spurious paths (the
/// tool's snapshot state is invalidated by extraction); a restore-point
/// commit settles it.
///
/// # Errors
///
/// Propagates snapshot-engine and reference errors.
pub fn execute(store: &Store, reporter: &dyn Reporter) -> Result<()> {
    let refs = RefManager::new(store);
    match refs.head()? {
        Head::Attached(name) => reporter.info(&format!("On branch {name}")),
        Head::Detached(id) => reporter.info(&format!("HEAD detached at {}", short_id(&id))),
    }

    let snapshots = SnapshotManager::new(store)?;
    let paths = WorkTree::new(store).changed_paths(&snapshots)?;

    if paths.is_empty() {
        reporter.info("working tree clean");
    } else {
        reporter.info(&format!("changed since last snapshot ({}):", paths.len()));
        for path in paths {
            reporter.emit(Event::PathRow(path));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::Recording;
    use tempfile::tempdir;

    fn infos(rec: &Recording) -> Vec<String> {
        rec.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Info(msg) => Some(msg),
                _ => None,
            })
            .collect()
    }

    fn path_rows(rec: &Recording) -> Vec<String> {
        rec.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::PathRow(path) => Some(path),
                _ => None,
            })
            .collect()
    }

    #[cfg(unix)]
    #[test]
    fn test_fresh_store_is_clean() -> Result<()> {
        let temp = tempdir()?;
        let store = Store::init(temp.path().to_path_buf())?;
        let reporter = Recording::new();

        execute(&store, &reporter)?;

        let msgs = infos(&reporter);
        assert!(msgs.iter().any(|m| m == "On branch main"));
        assert!(msgs.iter().any(|m| m == "working tree clean"));
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_new_file_shows_up() -> Result<()> {
        let temp = tempdir()?;
        let store = Store::init(temp.path().to_path_buf())?;
        let reporter = Recording::new();

        std::fs::write(temp.path().join("a"), "alpha")?;
        crate::commands::commit::execute(&store, &reporter, "first")?;
        std::fs::write(temp.path().join("b"), "beta")?;

        let status = Recording::new();
        execute(&store, &status)?;

        assert_eq!(path_rows(&status), vec!["b"]);
        assert!(!infos(&status).iter().any(|m| m == "working tree clean"));
        Ok(())
    }
}
