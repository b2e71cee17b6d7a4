//! HEAD and branch management.
//!
//! HEAD is a tagged pointer with two shapes: attached to a branch name, or
//! detached on a commit id. Branches are plain files under the control
//! directory's `branches/` child, one line each: the target commit id.

use crate::errors::ArkError;
use crate::store::Store;
use crate::utils::ident;
use anyhow::{Context, Result};
use std::fs;

/// Reference resolution (branch names, ids, prefixes, HEAD)
pub mod resolver;

/// The two shapes of the HEAD pointer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Head {
    /// HEAD names a branch; the branch (if it has a commit) names the id.
    Attached(String),
    /// HEAD names a commit id directly.
    Detached(String),
}

/// Manages the HEAD pointer and the branch map of one store.
pub struct RefManager<'a> {
    store: &'a Store,
}

impl<'a> RefManager<'a> {
    /// Creates a reference manager for an opened store.
    #[must_use]
    pub const fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Reads the HEAD pointer.
    ///
    /// # Errors
    ///
    /// Fails with [`ArkError::NotTrackedRoot`] if the HEAD file is missing
    /// or malformed.
    pub fn head(&self) -> Result<Head> {
        let content = fs::read_to_string(self.store.head_path())
            .map_err(|_| ArkError::NotTrackedRoot(self.store.root().to_path_buf()))?;
        let line = content.trim();

        if let Some(name) = line.strip_prefix("branch:") {
            return Ok(Head::Attached(name.to_string()));
        }
        if let Some(id) = line.strip_prefix("commit:") {
            return Ok(Head::Detached(id.to_string()));
        }
        Err(ArkError::NotTrackedRoot(self.store.root().to_path_buf()).into())
    }

    /// Attaches HEAD to a branch name.
    ///
    /// # Errors
    ///
    /// Returns an error if the HEAD file cannot be written.
    pub fn set_head_branch(&self, name: &str) -> Result<()> {
        self.store
            .write_atomic(&self.store.head_path(), &format!("branch:{name}\n"))
    }

    /// Detaches HEAD onto a commit id.
    ///
    /// # Errors
    ///
    /// Returns an error if the HEAD file cannot be written.
    pub fn set_head_commit(&self, id: &str) -> Result<()> {
        self.store
            .write_atomic(&self.store.head_path(), &format!("commit:{id}\n"))
    }

    /// The commit HEAD currently resolves to, if any.
    ///
    /// `None` is the freshly-initialized state: attached to a branch that
    /// has no commit yet.
    ///
    /// # Errors
    ///
    /// Returns an error if HEAD or the attached branch file cannot be read.
    pub fn head_commit(&self) -> Result<Option<String>> {
        match self.head()? {
            Head::Detached(id) => Ok(Some(id)),
            Head::Attached(name) => {
                if self.branch_exists(&name) {
                    Ok(Some(self.branch_target(&name)?))
                } else {
                    Ok(None)
                }
            }
        }
    }

    /// Checks if a branch exists.
    #[must_use]
    pub fn branch_exists(&self, name: &str) -> bool {
        self.store.branch_path(name).is_file()
    }

    /// Reads the target commit id of a branch.
    ///
    /// # Errors
    ///
    /// Fails with [`ArkError::UnknownBranch`] if no such branch exists.
    pub fn branch_target(&self, name: &str) -> Result<String> {
        if !self.branch_exists(name) {
            return Err(ArkError::UnknownBranch(name.to_string()).into());
        }
        let content = fs::read_to_string(self.store.branch_path(name))
            .with_context(|| format!("failed to read branch '{name}'"))?;
        Ok(content.trim().to_string())
    }

    /// Creates or moves a branch to a target commit id.
    ///
    /// Creating over an existing name requires `force`. Moving the branch
    /// HEAD is attached to is always permitted.
    ///
    /// # Errors
    ///
    /// Fails with [`ArkError::InvalidBranchName`] for names outside the
    /// grammar, or [`ArkError::BranchExists`] without `force`.
    pub fn set_branch(&self, name: &str, target: &str, force: bool) -> Result<()> {
        if !ident::is_valid_branch_name(name) {
            return Err(ArkError::InvalidBranchName(name.to_string()).into());
        }
        if !force && self.branch_exists(name) {
            return Err(ArkError::BranchExists(name.to_string()).into());
        }
        self.write_branch(name, target)
    }

    /// Writes a branch target without existence or grammar checks.
    ///
    /// This is the advance path used by `commit` and `reset`, where the
    /// branch is known-good (or being created as a side effect).
    ///
    /// # Errors
    ///
    /// Returns an error if the branch file cannot be written.
    pub fn write_branch(&self, name: &str, target: &str) -> Result<()> {
        self.store
            .write_atomic(&self.store.branch_path(name), &format!("{target}\n"))
    }

    /// Deletes a branch.
    ///
    /// # Errors
    ///
    /// Fails with [`ArkError::BranchInUse`] for the branch HEAD is attached
    /// to, or [`ArkError::UnknownBranch`] for unknown names.
    pub fn delete_branch(&self, name: &str) -> Result<()> {
        if let Head::Attached(current) = self.head()?
            && current == name
        {
            return Err(ArkError::BranchInUse(name.to_string()).into());
        }
        if !self.branch_exists(name) {
            return Err(ArkError::UnknownBranch(name.to_string()).into());
        }
        fs::remove_file(self.store.branch_path(name))
            .with_context(|| format!("failed to delete branch '{name}'"))?;
        Ok(())
    }

    /// Lists all branches as `(name, target)` pairs, sorted by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the branches directory cannot be read.
    pub fn list_branches(&self) -> Result<Vec<(String, String)>> {
        let dir = self.store.branches_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut branches = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file()
                && let Some(name) = entry.file_name().to_str()
            {
                let target = self.branch_target(name)?;
                branches.push((name.to_string(), target));
            }
        }

        branches.sort();
        Ok(branches)
    }
}
