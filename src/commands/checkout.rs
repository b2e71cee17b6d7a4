//! Reconstruct the tree at a commit or branch.

use crate::errors::ArkError;
use crate::output::Reporter;
use crate::refs::resolver::RefResolver;
use crate::refs::{Head, RefManager};
use crate::snapshot::SnapshotManager;
use crate::store::Store;
use crate::utils::formatters::short_id;
use crate::utils::ident;
use crate::worktree::WorkTree;
use anyhow::Result;

/// Switches HEAD to a target, reconstructing the working tree.
///
/// With `orphan`, creates a fresh attached HEAD on a new branch name with no
/// commit and leaves the filesystem alone. Otherwise the target is resolved,
/// the tree is cleared, and the ancestor chain of archives is replayed in
/// order. Untracked files are not preserved: the caller either has a clean
/// tree or accepted the loss with `force`.
///
/// # Errors
///
/// Fails with `MissingRef` when no target is given, `DirtyWorkingTree`
/// without `force` on a dirty tree, and the resolver's errors otherwise.
pub fn execute(
    store: &Store,
    reporter: &dyn Reporter,
    target: Option<&str>,
    force: bool,
    orphan: bool,
) -> Result<()> {
    if orphan {
        return orphan_checkout(store, reporter, target);
    }

    let Some(target) = target else {
        return Err(ArkError::MissingRef.into());
    };

    let refs = RefManager::new(store);
    let resolver = RefResolver::new(store);
    let commit_id = match resolver.resolve(target) {
        Ok(id) => id,
        Err(err) => {
            // A branch HEAD is attached to but that has no commit yet (a
            // fresh init or an orphan checkout) has no branches file; by
            // name it is an unknown branch, not an unknown ref.
            if matches!(err.downcast_ref::<ArkError>(), Some(ArkError::UnknownRef(_)))
                && matches!(refs.head()?, Head::Attached(ref name) if name.as_str() == target)
            {
                return Err(ArkError::UnknownBranch(target.to_string()).into());
            }
            return Err(err);
        }
    };

    let is_branch = refs.branch_exists(target);

    // Already on this commit: at most the pointer form changes.
    if refs.head_commit()?.as_deref() == Some(commit_id.as_str()) {
        match refs.head()? {
            Head::Attached(ref name) if is_branch && name.as_str() == target => {
                reporter.info(&format!("Already on '{target}'"));
            }
            _ if is_branch => {
                refs.set_head_branch(target)?;
                reporter.info(&format!("Switched to branch '{target}'"));
            }
            Head::Detached(_) => {
                reporter.info(&format!("Already at {}", short_id(&commit_id)));
            }
            Head::Attached(_) => {
                refs.set_head_commit(&commit_id)?;
                reporter.info(&format!("HEAD detached at {}", short_id(&commit_id)));
            }
        }
        return Ok(());
    }

    let snapshots = SnapshotManager::new(store)?;
    let tree = WorkTree::new(store);
    tree.require_clean(&snapshots, force)?;
    tree.restore(&snapshots, &commit_id, reporter)?;

    if is_branch {
        refs.set_head_branch(target)?;
        reporter.info(&format!(
            "Switched to branch '{target}' at {}",
            short_id(&commit_id)
        ));
    } else {
        refs.set_head_commit(&commit_id)?;
        reporter.info(&format!("HEAD detached at {}", short_id(&commit_id)));
    }
    Ok(())
}

/// Creates a fresh attached HEAD on a new branch with no commit.
fn orphan_checkout(store: &Store, reporter: &dyn Reporter, name: Option<&str>) -> Result<()> {
    let Some(name) = name else {
        return Err(ArkError::MissingRef.into());
    };
    if !ident::is_valid_branch_name(name) {
        return Err(ArkError::InvalidBranchName(name.to_string()).into());
    }

    let refs = RefManager::new(store);
    if refs.branch_exists(name) {
        return Err(ArkError::BranchExists(name.to_string()).into());
    }

    refs.set_head_branch(name)?;
    reporter.info(&format!("Switched to a new orphan branch '{name}'"));
    Ok(())
}
