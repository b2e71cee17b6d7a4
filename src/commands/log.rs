//! Walk commit chains newest-first.

use crate::errors::ArkError;
use crate::history::History;
use crate::output::{Event, Reporter};
use crate::refs::resolver::RefResolver;
use crate::refs::RefManager;
use crate::store::Store;
use crate::utils::formatters::{format_relative_time, format_timestamp, short_id, subject_line};
use anyhow::Result;
use std::collections::{HashMap, HashSet};

/// Emits commit rows for each starting reference, newest first.
///
/// Starting points are the given references, HEAD's commit by default, or
/// with `all` every branch target plus HEAD. Each distinct starting commit
/// gets one grouping header and its full chain; starting refs that resolve
/// to the same commit (HEAD and its branch) are collapsed into one group.
/// `full` switches rows from short ids and relative times to full ids and
/// absolute dates.
///
/// # Errors
///
/// Fails with `NoCommitsYet` when HEAD has no commit and no references were
/// given; resolver and history errors propagate.
pub fn execute(
    store: &Store,
    reporter: &dyn Reporter,
    references: &[String],
    all: bool,
    full: bool,
) -> Result<()> {
    let refs = RefManager::new(store);
    let history = History::new(store);

    let mut starts = Vec::new();
    if all {
        for (_, target) in refs.list_branches()? {
            starts.push(target);
        }
        if let Some(head) = refs.head_commit()? {
            starts.push(head);
        }
        if starts.is_empty() {
            return Err(ArkError::NoCommitsYet.into());
        }
    } else if references.is_empty() {
        starts.push(refs.head_commit()?.ok_or(ArkError::NoCommitsYet)?);
    } else {
        let resolver = RefResolver::new(store);
        for reference in references {
            starts.push(resolver.resolve(reference)?);
        }
    }

    // Decorations: branch names pointing at a commit, then HEAD
    let mut decorations: HashMap<String, Vec<String>> = HashMap::new();
    for (name, target) in refs.list_branches()? {
        decorations.entry(target).or_default().push(name);
    }
    if let Some(head) = refs.head_commit()? {
        decorations
            .entry(head)
            .or_default()
            .push("HEAD".to_string());
    }

    let limit = store.config().log.default_limit;
    let mut rows = 0usize;
    let mut start_seen: HashSet<String> = HashSet::new();

    for start in starts {
        if !start_seen.insert(start.clone()) {
            continue;
        }
        reporter.emit(Event::LogHeader(format!(
            "Log branch from {}",
            short_id(&start)
        )));

        let chain = history.ancestors(&start)?;
        for commit in chain.iter().rev() {
            if limit > 0 && rows >= limit {
                return Ok(());
            }

            let (display_id, when) = if full {
                (commit.id.clone(), format_timestamp(commit.timestamp))
            } else {
                (
                    short_id(&commit.id).to_string(),
                    format_relative_time(commit.timestamp),
                )
            };
            reporter.emit(Event::CommitRow {
                display_id,
                when,
                decorations: decorations.get(&commit.id).cloned().unwrap_or_default(),
                subject: subject_line(&commit.message).to_string(),
            });
            rows += 1;
        }
    }
    Ok(())
}
