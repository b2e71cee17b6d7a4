//! Commit records, ancestor chains, and reachability.
//!
//! Commits form a forest: each has at most one parent, and ids are derived
//! from the parent id, so cycles cannot be constructed. The metadata record
//! for a commit lives in `commit-meta/<id>` as a small TOML document with
//! the fields `parent` (id, empty for root commits), `msg`, and `ts`.

use crate::errors::ArkError;
use crate::refs::{Head, RefManager};
use crate::snapshot::SnapshotManager;
use crate::store::Store;
use crate::utils::{ident, precise_timestamp};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use tracing::debug;

/// An immutable commit record.
#[derive(Debug, Clone, PartialEq)]
pub struct Commit {
    /// 40-hex-digit identifier.
    pub id: String,
    /// Parent commit id; `None` only for root commits.
    pub parent: Option<String>,
    /// Author-supplied message.
    pub message: String,
    /// Creation time, fractional seconds since the Unix epoch.
    pub timestamp: f64,
}

/// On-disk shape of a commit record.
#[derive(Serialize, Deserialize)]
struct MetaRecord {
    parent: String,
    msg: String,
    ts: f64,
}

/// Commit map and graph queries for one store.
pub struct History<'a> {
    store: &'a Store,
}

impl<'a> History<'a> {
    /// Creates a history view over an opened store.
    #[must_use]
    pub const fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Checks whether a commit record exists.
    #[must_use]
    pub fn exists(&self, id: &str) -> bool {
        self.store.meta_path(id).is_file()
    }

    /// Loads one commit record.
    ///
    /// # Errors
    ///
    /// Returns an error if the record is missing or unparsable.
    pub fn load(&self, id: &str) -> Result<Commit> {
        let path = self.store.meta_path(id);
        let content = fs::read_to_string(&path)
            .with_context(|| format!("failed to read commit record: {}", path.display()))?;
        let record: MetaRecord = toml::from_str(&content)
            .with_context(|| format!("failed to parse commit record: {}", path.display()))?;

        Ok(Commit {
            id: id.to_string(),
            parent: if record.parent.is_empty() {
                None
            } else {
                Some(record.parent)
            },
            message: record.msg,
            timestamp: record.ts,
        })
    }

    /// Persists one commit record atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn write(&self, commit: &Commit) -> Result<()> {
        let record = MetaRecord {
            parent: commit.parent.clone().unwrap_or_default(),
            msg: commit.message.clone(),
            ts: commit.timestamp,
        };
        let content = toml::to_string(&record).context("failed to serialize commit record")?;
        self.store
            .write_atomic(&self.store.meta_path(&commit.id), &content)
    }

    /// Lists every commit id present in the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the metadata directory cannot be read.
    pub fn list_ids(&self) -> Result<Vec<String>> {
        let dir = self.store.meta_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut ids = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file()
                && let Some(name) = entry.file_name().to_str()
            {
                ids.push(name.to_string());
            }
        }
        ids.sort();
        Ok(ids)
    }

    /// Returns the ancestor chain of `id`, ordered root first, `id` last.
    ///
    /// # Errors
    ///
    /// Fails with [`ArkError::CorruptHistory`] if a parent reference is
    /// dangling or the chain revisits a commit.
    pub fn ancestors(&self, id: &str) -> Result<Vec<Commit>> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut current = Some(id.to_string());

        while let Some(cur) = current {
            if !self.exists(&cur) || !seen.insert(cur.clone()) {
                let child = chain
                    .last()
                    .map_or_else(|| cur.clone(), |c: &Commit| c.id.clone());
                return Err(ArkError::CorruptHistory(child).into());
            }
            let commit = self.load(&cur)?;
            current = commit.parent.clone();
            chain.push(commit);
        }

        chain.reverse();
        Ok(chain)
    }

    /// Computes the set of commits reachable from all branches and HEAD.
    ///
    /// # Errors
    ///
    /// Fails with [`ArkError::CorruptHistory`] if a reachable chain is
    /// broken.
    pub fn reachable(&self) -> Result<HashSet<String>> {
        let refs = RefManager::new(self.store);
        let mut starts: Vec<String> = refs
            .list_branches()?
            .into_iter()
            .map(|(_, target)| target)
            .collect();
        if let Some(head) = refs.head_commit()? {
            starts.push(head);
        }

        let mut reachable = HashSet::new();
        for start in starts {
            if reachable.contains(&start) {
                continue;
            }
            for commit in self.ancestors(&start)? {
                reachable.insert(commit.id);
            }
        }
        Ok(reachable)
    }
}

/// Creates a commit from the current working tree.
///
/// Reads HEAD for the parent, captures the incremental archive, persists the
/// record, and advances the attached branch (creating it for the very first
/// commit) or the detached HEAD. Returns the new commit and the paths the
/// archive tool reported as changed.
///
/// # Errors
///
/// Propagates snapshot-engine and store errors; the commit record is only
/// written after the archive is published.
pub fn create_commit(
    store: &Store,
    snapshots: &SnapshotManager,
    message: &str,
) -> Result<(Commit, Vec<String>)> {
    let refs = RefManager::new(store);
    let history = History::new(store);

    let head = refs.head()?;
    let parent = refs.head_commit()?;
    let timestamp = precise_timestamp();
    let id = ident::generate_commit_id(parent.as_deref(), message, timestamp);

    let touched = snapshots.capture(parent.as_deref(), &id)?;

    let commit = Commit {
        id: id.clone(),
        parent,
        message: message.to_string(),
        timestamp,
    };
    history.write(&commit)?;

    match head {
        Head::Attached(name) => refs.write_branch(&name, &id)?,
        Head::Detached(_) => refs.set_head_commit(&id)?,
    }
    debug!(id = %id, "created commit");

    Ok((commit, touched))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn test_store() -> (tempfile::TempDir, Store) {
        let temp = tempdir().unwrap();
        let store = Store::init(temp.path().to_path_buf()).unwrap();
        (temp, store)
    }

    fn write_commit(history: &History, id: &str, parent: Option<&str>, ts: f64) {
        history
            .write(&Commit {
                id: id.to_string(),
                parent: parent.map(String::from),
                message: format!("commit {id}"),
                timestamp: ts,
            })
            .unwrap();
    }

    #[test]
    fn test_record_round_trip() -> Result<()> {
        let (_temp, store) = test_store();
        let history = History::new(&store);

        let commit = Commit {
            id: "a".repeat(40),
            parent: None,
            message: "line one\nline two".to_string(),
            timestamp: 1_700_000_000.25,
        };
        history.write(&commit)?;

        let loaded = history.load(&commit.id)?;
        assert_eq!(loaded, commit);

        // The record stays a single-line-per-field text file
        let raw = fs::read_to_string(store.meta_path(&commit.id))?;
        assert!(raw.contains("msg"));
        assert!(!raw.contains("line one\nline two"));
        Ok(())
    }

    #[test]
    fn test_ancestors_order_and_termination() -> Result<()> {
        let (_temp, store) = test_store();
        let history = History::new(&store);

        let (root, mid, tip) = ("a".repeat(40), "b".repeat(40), "c".repeat(40));
        write_commit(&history, &root, None, 1.0);
        write_commit(&history, &mid, Some(&root), 2.0);
        write_commit(&history, &tip, Some(&mid), 3.0);

        let chain = history.ancestors(&tip)?;
        let ids: Vec<_> = chain.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec![root.as_str(), mid.as_str(), tip.as_str()]);
        assert!(chain.first().unwrap().parent.is_none());

        // No duplicates
        let unique: HashSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), ids.len());
        Ok(())
    }

    #[test]
    fn test_ancestors_dangling_parent() {
        let (_temp, store) = test_store();
        let history = History::new(&store);

        let tip = "c".repeat(40);
        write_commit(&history, &tip, Some(&"d".repeat(40)), 1.0);

        let err = history.ancestors(&tip).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ArkError>(),
            Some(ArkError::CorruptHistory(_))
        ));
    }

    #[test]
    fn test_reachable_covers_branches_and_head() -> Result<()> {
        let (_temp, store) = test_store();
        let history = History::new(&store);
        let refs = RefManager::new(&store);

        let (root, on_branch, orphan) = ("a".repeat(40), "b".repeat(40), "e".repeat(40));
        write_commit(&history, &root, None, 1.0);
        write_commit(&history, &on_branch, Some(&root), 2.0);
        write_commit(&history, &orphan, None, 3.0);

        refs.write_branch("main", &on_branch)?;

        let reachable = history.reachable()?;
        assert!(reachable.contains(&root));
        assert!(reachable.contains(&on_branch));
        assert!(!reachable.contains(&orphan));
        Ok(())
    }

    #[test]
    fn test_list_ids() -> Result<()> {
        let (_temp, store) = test_store();
        let history = History::new(&store);

        write_commit(&history, &"b".repeat(40), None, 1.0);
        write_commit(&history, &"a".repeat(40), None, 2.0);

        assert_eq!(history.list_ids()?, vec!["a".repeat(40), "b".repeat(40)]);
        Ok(())
    }
}
