//! Working-tree gating and reconstruction sequencing.
//!
//! A tree is dirty when the next capture against HEAD's commit would record
//! a non-empty touched-paths list. Destructive operations require a clean
//! tree or an explicit force flag. Reconstruction always follows the same
//! sequence: clear the tree, then replay the ancestor chain of archives in
//! order.

use crate::errors::ArkError;
use crate::history::History;
use crate::output::Reporter;
use crate::refs::RefManager;
use crate::snapshot::SnapshotManager;
use crate::store::Store;
use crate::utils::formatters::short_id;
use crate::CONTROL_DIR;
use anyhow::{Context, Result};
use std::fs;
use tracing::debug;

/// Controller for the user files of one tracked root.
pub struct WorkTree<'a> {
    store: &'a Store,
}

impl<'a> WorkTree<'a> {
    /// Creates a working-tree controller for an opened store.
    #[must_use]
    pub const fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Returns the paths the next capture against HEAD would record.
    ///
    /// An empty list means the tree is clean. Right after a checkout the
    /// list may contain spurious paths: extraction invalidates the archive
    /// tool's snapshot state, so the first probe sees touched metadata. A
    /// restore-point commit settles it.
    ///
    /// # Errors
    ///
    /// Propagates snapshot-engine and reference errors.
    pub fn changed_paths(&self, snapshots: &SnapshotManager) -> Result<Vec<String>> {
        let refs = RefManager::new(self.store);
        let head = refs.head_commit()?;
        snapshots.probe(head.as_deref())
    }

    /// Gates a destructive operation on a clean tree unless forced.
    ///
    /// # Errors
    ///
    /// Fails with [`ArkError::DirtyWorkingTree`] carrying the offending
    /// paths.
    pub fn require_clean(&self, snapshots: &SnapshotManager, force: bool) -> Result<()> {
        if force {
            return Ok(());
        }
        let paths = self.changed_paths(snapshots)?;
        if paths.is_empty() {
            Ok(())
        } else {
            Err(ArkError::DirtyWorkingTree { paths }.into())
        }
    }

    /// Reconstructs the tree as of `target`: clear, then replay the chain.
    ///
    /// Emits one info event per extracted snapshot so the operation is
    /// observable.
    ///
    /// # Errors
    ///
    /// Propagates history and snapshot-engine errors.
    pub fn restore(
        &self,
        snapshots: &SnapshotManager,
        target: &str,
        reporter: &dyn Reporter,
    ) -> Result<()> {
        let history = History::new(self.store);
        let chain = history.ancestors(target)?;

        self.clear()?;
        for commit in &chain {
            snapshots.extract(&commit.id)?;
            reporter.info(&format!("Restored snapshot {}", short_id(&commit.id)));
        }
        debug!(target = %target, depth = chain.len(), "reconstructed working tree");
        Ok(())
    }

    /// Removes every entry of the tracked root except the control directory.
    ///
    /// # Errors
    ///
    /// Returns an error if an entry cannot be removed.
    pub fn clear(&self) -> Result<()> {
        for entry in fs::read_dir(self.store.root())? {
            let entry = entry?;
            if entry.file_name() == CONTROL_DIR {
                continue;
            }
            let path = entry.path();
            if entry.file_type()?.is_dir() {
                fs::remove_dir_all(&path)
                    .with_context(|| format!("failed to remove {}", path.display()))?;
            } else {
                fs::remove_file(&path)
                    .with_context(|| format!("failed to remove {}", path.display()))?;
            }
        }
        Ok(())
    }
}
