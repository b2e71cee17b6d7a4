//! Retarget HEAD, optionally reconstructing the tree.

use crate::output::Reporter;
use crate::refs::resolver::RefResolver;
use crate::refs::{Head, RefManager};
use crate::snapshot::SnapshotManager;
use crate::store::Store;
use crate::utils::formatters::short_id;
use crate::worktree::WorkTree;
use anyhow::Result;

/// Moves the current position to the resolved reference.
///
/// Without `hard`, only the pointer moves: an attached HEAD retargets its
/// branch, a detached HEAD moves itself, and the filesystem is untouched
/// (the tree may become dirty as a result). With `hard`, the retarget is
/// followed by a destructive reconstruction of the new target; passing
/// `--hard` is itself the consent to lose uncommitted changes, so no force
/// flag exists here.
///
/// # Errors
///
/// Propagates resolver, history, and snapshot-engine errors.
pub fn execute(store: &Store, reporter: &dyn Reporter, target: &str, hard: bool) -> Result<()> {
    let resolver = RefResolver::new(store);
    let commit_id = resolver.resolve(target)?;

    let refs = RefManager::new(store);
    match refs.head()? {
        Head::Attached(name) => refs.write_branch(&name, &commit_id)?,
        Head::Detached(_) => refs.set_head_commit(&commit_id)?,
    }

    if hard {
        let snapshots = SnapshotManager::new(store)?;
        WorkTree::new(store).restore(&snapshots, &commit_id, reporter)?;
        reporter.info(&format!("Hard reset to {}", short_id(&commit_id)));
    } else {
        reporter.info(&format!("Reset to {}", short_id(&commit_id)));
    }
    Ok(())
}
