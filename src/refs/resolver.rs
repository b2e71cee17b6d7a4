//! Reference resolution.
//!
//! Turns a user-supplied string into a commit id. Resolution order:
//!
//! 1. exact branch name → that branch's target
//! 2. full 40-hex id of an existing commit → that id
//! 3. unique hex prefix (≥ 4 chars) of exactly one commit id → that id
//! 4. otherwise [`ArkError::UnknownRef`]
//!
//! The token `HEAD` is a synonym for the current HEAD target; on a fresh
//! store it resolves to [`ArkError::NoCommitsYet`].

use crate::errors::ArkError;
use crate::refs::RefManager;
use crate::store::Store;
use crate::utils::ident;
use anyhow::Result;
use std::fs;

/// Resolves reference strings against one store.
pub struct RefResolver<'a> {
    store: &'a Store,
    refs: RefManager<'a>,
}

impl<'a> RefResolver<'a> {
    /// Creates a resolver for an opened store.
    #[must_use]
    pub const fn new(store: &'a Store) -> Self {
        Self {
            store,
            refs: RefManager::new(store),
        }
    }

    /// Resolves a reference string to a full commit id.
    ///
    /// # Errors
    ///
    /// Fails with [`ArkError::NoCommitsYet`] for `HEAD` on a fresh store,
    /// [`ArkError::AmbiguousRef`] for a prefix matching several commits, and
    /// [`ArkError::UnknownRef`] when nothing matches.
    pub fn resolve(&self, reference: &str) -> Result<String> {
        if reference == "HEAD" {
            return self
                .refs
                .head_commit()?
                .ok_or_else(|| ArkError::NoCommitsYet.into());
        }

        if self.refs.branch_exists(reference) {
            return self.refs.branch_target(reference);
        }

        if ident::is_commit_id(reference) {
            let id = reference.to_ascii_lowercase();
            if self.commit_exists(&id) {
                return Ok(id);
            }
        }

        if ident::is_id_prefix(reference)
            && let Some(id) = self.find_by_prefix(&reference.to_ascii_lowercase())?
        {
            return Ok(id);
        }

        Err(ArkError::UnknownRef(reference.to_string()).into())
    }

    /// Checks whether a commit record exists on disk.
    #[must_use]
    pub fn commit_exists(&self, id: &str) -> bool {
        self.store.meta_path(id).is_file()
    }

    /// Finds the unique commit id starting with `prefix`.
    ///
    /// The metadata directory holds one file per commit, named by the id, so
    /// a linear scan of filenames is all prefix matching needs.
    fn find_by_prefix(&self, prefix: &str) -> Result<Option<String>> {
        let meta_dir = self.store.meta_dir();
        if !meta_dir.exists() {
            return Ok(None);
        }

        let mut matches = Vec::new();
        for entry in fs::read_dir(&meta_dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            if name_str.starts_with(prefix) {
                matches.push(name_str.to_string());
            }
        }

        match matches.len() {
            0 => Ok(None),
            1 => Ok(Some(matches.remove(0))),
            _ => {
                matches.sort();
                Err(ArkError::AmbiguousRef {
                    prefix: prefix.to_string(),
                    candidates: matches,
                }
                .into())
            }
        }
    }
}
