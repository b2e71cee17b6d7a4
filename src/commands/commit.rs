//! Record the tree as a new commit.

use crate::errors::ArkError;
use crate::history;
use crate::output::Reporter;
use crate::snapshot::SnapshotManager;
use crate::store::Store;
use crate::utils::formatters::short_id;
use anyhow::Result;

/// Captures the incremental delta since HEAD and records it as a commit.
///
/// On a fresh store this creates the root commit and the branch HEAD is
/// attached to. An empty delta is allowed: a commit with no touched paths
/// is exactly the restore-point commit recommended after a checkout.
///
/// # Errors
///
/// Fails with `Usage` for an empty message; otherwise propagates snapshot
/// and store errors.
pub fn execute(store: &Store, reporter: &dyn Reporter, message: &str) -> Result<()> {
    if message.trim().is_empty() {
        return Err(ArkError::Usage("commit message must not be empty".to_string()).into());
    }

    let snapshots = SnapshotManager::new(store)?;
    let (commit, touched) = history::create_commit(store, &snapshots, message)?;

    reporter.info(&format!(
        "Committed {} ({} paths)",
        short_id(&commit.id),
        touched.len()
    ));
    Ok(())
}
