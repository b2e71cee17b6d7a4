//! Remove unreachable commits and their blobs.

use crate::history::History;
use crate::output::Reporter;
use crate::store::Store;
use crate::utils::formatters::short_id;
use crate::utils::ident;
use anyhow::Result;
use std::collections::BTreeSet;
use std::fs;

/// Deletes every commit record and blob not reachable from a branch or HEAD.
///
/// Reachability walks complete ancestor chains, so an ancestor of a live
/// commit can never be collected and every surviving chain stays
/// constructible. Blobs left behind by an interrupted commit (no metadata
/// record) are collected too.
///
/// # Errors
///
/// Fails with `CorruptHistory` if a reachable chain is broken; removal
/// errors propagate.
pub fn execute(store: &Store, reporter: &dyn Reporter) -> Result<()> {
    let history = History::new(store);
    let reachable = history.reachable()?;

    // Candidates: every id with a record, plus blob-only ids from a crashed
    // commit that never published its record.
    let mut candidates: BTreeSet<String> = history.list_ids()?.into_iter().collect();
    for entry in fs::read_dir(store.commits_dir())? {
        let entry = entry?;
        let name = entry.file_name();
        if let Some(id) = name.to_string_lossy().split('.').next()
            && ident::is_commit_id(id)
        {
            candidates.insert(id.to_string());
        }
    }

    let mut removed = 0usize;
    for id in candidates {
        if reachable.contains(&id) {
            continue;
        }
        for path in [
            store.meta_path(&id),
            store.archive_path(&id),
            store.snapstate_path(&id),
        ] {
            if path.exists() {
                fs::remove_file(&path)?;
            }
        }
        reporter.info(&format!("Pruned {}", short_id(&id)));
        removed += 1;
    }

    if removed == 0 {
        reporter.info("Nothing to prune");
    } else {
        reporter.info(&format!("Pruned {removed} commit(s)"));
    }
    Ok(())
}
