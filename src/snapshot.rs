//! Incremental archive capture and extraction via the external tar tool.
//!
//! The engine treats the tool as a black box with two operations: create an
//! incremental archive against a prior snapshot-state file, and extract an
//! archive into the tracked root. Each call spawns a short-lived child in
//! its own process group; termination signals are forwarded to the group so
//! a cancelled command never leaves an orphan archive process.
//!
//! Outputs are written to temp files beside their targets and renamed into
//! place only on clean exit. A capture that cannot be fully published is
//! rolled back: both blobs removed, nothing recorded.

use crate::errors::ArkError;
use crate::store::Store;
use crate::CONTROL_DIR;
use anyhow::{Context, Result};
use command_group::CommandGroup;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Mutex;
use tempfile::NamedTempFile;
use tracing::debug;

/// Process group of the currently running tool child (0 when idle).
static ACTIVE_GROUP: AtomicI32 = AtomicI32::new(0);

/// Temp outputs of the in-flight capture.
///
/// A termination signal re-raises with the default disposition, which never
/// runs destructors, so the handler unlinks these paths itself instead of
/// relying on the temp files' `Drop`.
static LIVE_TEMPS: Mutex<Vec<PathBuf>> = Mutex::new(Vec::new());

/// Registers temp paths for signal teardown; deregisters on drop.
struct TempRegistration;

impl TempRegistration {
    fn new(paths: &[&Path]) -> Self {
        if let Ok(mut live) = LIVE_TEMPS.lock() {
            live.extend(paths.iter().map(|p| p.to_path_buf()));
        }
        Self
    }
}

impl Drop for TempRegistration {
    fn drop(&mut self) {
        if let Ok(mut live) = LIVE_TEMPS.lock() {
            live.clear();
        }
    }
}

/// Unlinks every registered temp path. Best effort: called from the signal
/// handler, so a held lock means skipping rather than blocking.
fn remove_live_temps() {
    if let Ok(live) = LIVE_TEMPS.try_lock() {
        unlink_all(&live);
    }
}

/// Removes each path, ignoring failures (a path may already be gone).
fn unlink_all(paths: &[PathBuf]) {
    for path in paths {
        let _ = fs::remove_file(path);
    }
}

/// Wraps the external archive tool for one store.
pub struct SnapshotManager<'a> {
    store: &'a Store,
    tool: PathBuf,
}

impl<'a> SnapshotManager<'a> {
    /// Creates a snapshot engine, locating the archive tool binary.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured tool cannot be found on `PATH`.
    pub fn new(store: &'a Store) -> Result<Self> {
        let configured = &store.config().snapshot.tool;
        let tool = if Path::new(configured).is_absolute() {
            PathBuf::from(configured)
        } else {
            which::which(configured)
                .with_context(|| format!("snapshot tool '{configured}' not found on PATH"))?
        };
        Ok(Self { store, tool })
    }

    /// Captures an incremental archive against `parent` and publishes both
    /// blobs under `id`.
    ///
    /// Returns the list of paths the tool reported as changed. The working
    /// tree is read but not modified.
    ///
    /// # Errors
    ///
    /// Fails with [`ArkError::SnapshotToolFailed`] on abnormal tool exit,
    /// or [`ArkError::CorruptHistory`] if the parent snapshot state is
    /// missing. A publish failure removes any already-published blob.
    pub fn capture(&self, parent: Option<&str>, id: &str) -> Result<Vec<String>> {
        let (archive_tmp, snapstate_tmp, touched) = self.run_capture(parent)?;

        let archive_dest = self.store.archive_path(id);
        let snapstate_dest = self.store.snapstate_path(id);

        archive_tmp
            .persist(&archive_dest)
            .map_err(|e| e.error)
            .with_context(|| format!("failed to publish {}", archive_dest.display()))?;
        if let Err(e) = snapstate_tmp.persist(&snapstate_dest) {
            let _ = fs::remove_file(&archive_dest);
            return Err(e.error)
                .with_context(|| format!("failed to publish {}", snapstate_dest.display()));
        }

        debug!(id = %id, paths = touched.len(), "published snapshot");
        Ok(touched)
    }

    /// Runs a capture and discards its outputs, returning only the touched
    /// paths. This is the dirty-tree probe behind `status`.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`SnapshotManager::capture`].
    pub fn probe(&self, parent: Option<&str>) -> Result<Vec<String>> {
        let (_archive, _snapstate, touched) = self.run_capture(parent)?;
        Ok(touched)
    }

    /// Extracts the archive blob of `id` into the tracked root.
    ///
    /// Incremental extraction replays the archive's dumpdir records, so
    /// files deleted in this commit are removed from the tree. No parent
    /// replay happens here; callers walk the chain themselves.
    ///
    /// # Errors
    ///
    /// Fails with [`ArkError::CorruptHistory`] if the archive blob is
    /// missing, or [`ArkError::SnapshotToolFailed`] on abnormal tool exit.
    pub fn extract(&self, id: &str) -> Result<()> {
        let archive = self.store.archive_path(id);
        if !archive.is_file() {
            return Err(ArkError::CorruptHistory(id.to_string()).into());
        }

        let mut cmd = Command::new(&self.tool);
        cmd.arg("--extract")
            .arg("--incremental")
            .arg("--file")
            .arg(&archive)
            .arg("--directory")
            .arg(self.store.root());
        run_tool(cmd)?;
        debug!(id = %id, "extracted snapshot");
        Ok(())
    }

    /// Returns the list of paths the archive blob of `id` touches.
    ///
    /// # Errors
    ///
    /// Fails with [`ArkError::CorruptHistory`] if the archive blob is
    /// missing, or [`ArkError::SnapshotToolFailed`] on abnormal tool exit.
    pub fn list_paths(&self, id: &str) -> Result<Vec<String>> {
        let archive = self.store.archive_path(id);
        if !archive.is_file() {
            return Err(ArkError::CorruptHistory(id.to_string()).into());
        }

        let mut cmd = Command::new(&self.tool);
        cmd.arg("--list")
            .arg("--incremental")
            .arg("--file")
            .arg(&archive);
        let output = run_tool(cmd)?;
        Ok(parse_listing(&output.stdout))
    }

    /// Runs the create step into temp files and parses the touched paths.
    fn run_capture(
        &self,
        parent: Option<&str>,
    ) -> Result<(NamedTempFile, NamedTempFile, Vec<String>)> {
        let commits_dir = self.store.commits_dir();
        let archive_tmp = NamedTempFile::new_in(&commits_dir)
            .context("failed to create temp archive file")?;
        let snapstate_tmp = NamedTempFile::new_in(&commits_dir)
            .context("failed to create temp snapshot-state file")?;

        // The tool mutates the state file in place, so it always gets a
        // private copy. For root captures the path must not exist at all:
        // the tool then starts a level-0 dump and creates it.
        match parent {
            Some(pid) => {
                let parent_state = self.store.snapstate_path(pid);
                if !parent_state.is_file() {
                    return Err(ArkError::CorruptHistory(pid.to_string()).into());
                }
                fs::copy(&parent_state, snapstate_tmp.path())
                    .context("failed to stage parent snapshot state")?;
            }
            None => {
                fs::remove_file(snapstate_tmp.path())
                    .context("failed to clear temp snapshot-state file")?;
            }
        }

        let mut cmd = Command::new(&self.tool);
        cmd.arg("--create")
            .arg("--file")
            .arg(archive_tmp.path())
            .arg("--listed-incremental")
            .arg(snapstate_tmp.path())
            .arg("--verbose")
            .arg("--no-check-device")
            .arg("--exclude")
            .arg(format!("./{CONTROL_DIR}"))
            .arg("--directory")
            .arg(self.store.root())
            .arg(".");

        let _live_temps = TempRegistration::new(&[archive_tmp.path(), snapstate_tmp.path()]);
        let output = run_tool(cmd)?;

        Ok((archive_tmp, snapstate_tmp, parse_listing(&output.stdout)))
    }
}

/// Captured streams of a finished tool run.
struct ToolOutput {
    stdout: String,
}

/// Spawns the tool in its own process group and waits for it.
fn run_tool(mut cmd: Command) -> Result<ToolOutput> {
    install_signal_forwarding();

    debug!(cmd = ?cmd, "running snapshot tool");
    let child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .group_spawn()
        .context("failed to spawn snapshot tool")?;

    #[allow(clippy::cast_possible_wrap)]
    ACTIVE_GROUP.store(child.id() as i32, Ordering::SeqCst);
    let result = child.wait_with_output();
    ACTIVE_GROUP.store(0, Ordering::SeqCst);

    let output = result.context("failed to wait for snapshot tool")?;
    if !output.status.success() {
        let status = output.status.code().map_or_else(
            || "killed by signal".to_string(),
            |code| format!("exit code {code}"),
        );
        return Err(ArkError::SnapshotToolFailed {
            status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }
        .into());
    }

    Ok(ToolOutput {
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
    })
}

/// Installs handlers that forward SIGINT/SIGTERM to the live tool group.
#[cfg(unix)]
fn install_signal_forwarding() {
    static INSTALL_HANDLERS: std::sync::Once = std::sync::Once::new();
    INSTALL_HANDLERS.call_once(|| unsafe {
        libc::signal(
            libc::SIGINT,
            forward_signal as extern "C" fn(libc::c_int) as libc::sighandler_t,
        );
        libc::signal(
            libc::SIGTERM,
            forward_signal as extern "C" fn(libc::c_int) as libc::sighandler_t,
        );
    });
}

#[cfg(not(unix))]
fn install_signal_forwarding() {}

/// Forwards a termination signal to the tool's process group, waits for the
/// group leader, removes partial temp outputs, then re-raises with the
/// default disposition.
#[cfg(unix)]
extern "C" fn forward_signal(sig: libc::c_int) {
    let pgid = ACTIVE_GROUP.load(Ordering::SeqCst);
    if pgid > 0 {
        unsafe {
            libc::killpg(pgid, sig);
            libc::waitpid(-pgid, std::ptr::null_mut(), 0);
        }
    }
    remove_live_temps();
    unsafe {
        libc::signal(sig, libc::SIG_DFL);
        libc::raise(sig);
    }
}

/// Parses a verbose create/list stream into touched paths.
///
/// Directory entries are dropped: the tool re-lists every directory on each
/// incremental run, so only file entries carry change information. The `./`
/// member prefix is stripped.
fn parse_listing(stdout: &str) -> Vec<String> {
    let mut paths = Vec::new();
    for line in stdout.lines() {
        let line = line.trim();
        if line.is_empty() || line == "." || line == "./" || line.ends_with('/') {
            continue;
        }
        let path = line.strip_prefix("./").unwrap_or(line);
        paths.push(path.to_string());
    }
    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Store;
    use tempfile::tempdir;

    #[test]
    fn test_parse_listing_filters_directories() {
        let stdout = "./\n./a\n./sub/\n./sub/b\n\n";
        assert_eq!(parse_listing(stdout), vec!["a", "sub/b"]);
    }

    #[test]
    fn test_parse_listing_empty_means_clean() {
        assert!(parse_listing("./\n./sub/\n").is_empty());
        assert!(parse_listing("").is_empty());
    }

    #[test]
    fn test_unlink_all_removes_partial_outputs() -> Result<()> {
        let temp = tempdir()?;
        let archive = temp.path().join("partial.archive");
        let snapstate = temp.path().join("partial.snapstate");
        std::fs::write(&archive, b"partial")?;
        std::fs::write(&snapstate, b"partial")?;

        unlink_all(&[archive.clone(), snapstate.clone()]);

        assert!(!archive.exists());
        assert!(!snapstate.exists());
        // already-gone paths are not an error
        unlink_all(&[archive]);
        Ok(())
    }

    #[test]
    fn test_tool_resolution_fails_for_missing_binary() -> Result<()> {
        let temp = tempdir()?;
        let store = Store::init(temp.path().to_path_buf())?;
        let mut config = store.config().clone();
        config.snapshot.tool = "ark-no-such-tool".to_string();
        config.save(&store.control().join(crate::CONFIG_FILE))?;
        drop(store);

        let store = Store::open(temp.path().to_path_buf())?;
        assert!(SnapshotManager::new(&store).is_err());
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_capture_and_list_round_trip() -> Result<()> {
        let temp = tempdir()?;
        let store = Store::init(temp.path().to_path_buf())?;
        std::fs::write(temp.path().join("a"), "alpha")?;

        let snapshots = SnapshotManager::new(&store)?;
        let id = "a".repeat(40);
        let touched = snapshots.capture(None, &id)?;
        assert_eq!(touched, vec!["a"]);
        assert!(store.archive_path(&id).is_file());
        assert!(store.snapstate_path(&id).is_file());

        assert_eq!(snapshots.list_paths(&id)?, vec!["a"]);
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_probe_publishes_nothing() -> Result<()> {
        let temp = tempdir()?;
        let store = Store::init(temp.path().to_path_buf())?;
        std::fs::write(temp.path().join("a"), "alpha")?;

        let snapshots = SnapshotManager::new(&store)?;
        let touched = snapshots.probe(None)?;
        assert_eq!(touched, vec!["a"]);

        // Only the lock and config live in the control dir; commits/ is empty
        let entries: Vec<_> = std::fs::read_dir(store.commits_dir())?.collect();
        assert!(entries.is_empty());
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_incremental_capture_reports_only_changes() -> Result<()> {
        let temp = tempdir()?;
        let store = Store::init(temp.path().to_path_buf())?;
        std::fs::write(temp.path().join("a"), "alpha")?;

        let snapshots = SnapshotManager::new(&store)?;
        let root_id = "a".repeat(40);
        snapshots.capture(None, &root_id)?;

        // Unchanged tree probes clean against the root snapshot
        assert!(snapshots.probe(Some(&root_id))?.is_empty());

        std::fs::write(temp.path().join("b"), "beta")?;
        assert_eq!(snapshots.probe(Some(&root_id))?, vec!["b"]);
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_extract_restores_files() -> Result<()> {
        let temp = tempdir()?;
        let store = Store::init(temp.path().to_path_buf())?;
        std::fs::write(temp.path().join("a"), "alpha")?;

        let snapshots = SnapshotManager::new(&store)?;
        let id = "a".repeat(40);
        snapshots.capture(None, &id)?;

        std::fs::remove_file(temp.path().join("a"))?;
        snapshots.extract(&id)?;
        assert_eq!(std::fs::read_to_string(temp.path().join("a"))?, "alpha");
        Ok(())
    }

    #[test]
    fn test_extract_missing_archive_is_corrupt() -> Result<()> {
        let temp = tempdir()?;
        let store = Store::init(temp.path().to_path_buf())?;
        let snapshots = SnapshotManager::new(&store)?;

        let err = snapshots.extract(&"f".repeat(40)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ArkError>(),
            Some(ArkError::CorruptHistory(_))
        ));
        Ok(())
    }
}
