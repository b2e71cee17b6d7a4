//! Error kinds surfaced by the backup engine.
//!
//! Every failure a command can report maps to one variant here. Commands
//! propagate errors with `?` and never recover; the binary renders the first
//! error encountered as a single line, plus a bulleted item list for the
//! variants that carry one ([`ArkError::DirtyWorkingTree`],
//! [`ArkError::AmbiguousRef`]).

use std::path::PathBuf;
use thiserror::Error;

/// Error kinds for every operation against a tracked root.
#[derive(Error, Debug)]
pub enum ArkError {
    /// The directory has no (or a malformed) control directory.
    #[error("not a tracked root: {}", .0.display())]
    NotTrackedRoot(PathBuf),

    /// `init` was run inside an already-tracked root.
    #[error("already a tracked root: {}", .0.display())]
    AlreadyTrackedRoot(PathBuf),

    /// A branch name failed the `[A-Za-z_][A-Za-z0-9_]*` grammar.
    #[error("invalid branch name: '{0}'")]
    InvalidBranchName(String),

    /// Branch creation would overwrite an existing branch without force.
    #[error("branch '{0}' already exists")]
    BranchExists(String),

    /// The named branch does not exist.
    #[error("unknown branch: '{0}'")]
    UnknownBranch(String),

    /// The branch HEAD is attached to cannot be deleted.
    #[error("branch '{0}' is checked out and cannot be deleted")]
    BranchInUse(String),

    /// The reference string matched no branch, commit id, or prefix.
    #[error("unknown reference: '{0}'")]
    UnknownRef(String),

    /// A hex prefix matched more than one commit id.
    #[error("ambiguous reference '{prefix}' matches {} commits", .candidates.len())]
    AmbiguousRef {
        /// The prefix as supplied by the user.
        prefix: String,
        /// Every commit id the prefix matched.
        candidates: Vec<String>,
    },

    /// A command that requires a reference was given none.
    #[error("a reference is required")]
    MissingRef,

    /// HEAD is attached to a branch that has no commit yet.
    #[error("no commits yet")]
    NoCommitsYet,

    /// A destructive operation was attempted on a dirty tree without force.
    #[error("working tree has uncommitted changes ({} paths)", .paths.len())]
    DirtyWorkingTree {
        /// Paths the next capture would record as changed.
        paths: Vec<String>,
    },

    /// A parent reference points at a commit that is not on disk.
    #[error("corrupt history: commit '{0}' references a missing parent")]
    CorruptHistory(String),

    /// The external archive tool exited abnormally.
    #[error("snapshot tool failed ({status}): {stderr}")]
    SnapshotToolFailed {
        /// How the subprocess ended, e.g. `exit code 2` or `killed by signal`.
        status: String,
        /// Captured standard error of the subprocess, trimmed.
        stderr: String,
    },

    /// Another process holds the store lock.
    #[error("store is busy: another ark process holds the lock")]
    StoreBusy,

    /// An invalid flag or argument combination.
    #[error("usage: {0}")]
    Usage(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dirty_tree_message_counts_paths() {
        let err = ArkError::DirtyWorkingTree {
            paths: vec!["a".to_string(), "b".to_string()],
        };
        assert!(err.to_string().contains("2 paths"));
    }

    #[test]
    fn test_tool_failure_message_includes_exit_info() {
        let err = ArkError::SnapshotToolFailed {
            status: "exit code 2".to_string(),
            stderr: "tar: something broke".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("exit code 2"));
        assert!(msg.contains("something broke"));
    }
}
