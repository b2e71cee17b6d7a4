//! The tracked root and its control directory.
//!
//! A [`Store`] is the opened-store value threaded through every operation.
//! Opening takes a non-blocking advisory lock on the control directory, so
//! two simultaneous invocations against the same tracked root fail fast with
//! [`ArkError::StoreBusy`] instead of corrupting each other.

use crate::config::Config;
use crate::errors::ArkError;
use crate::{
    ARCHIVE_EXT, BRANCHES_DIR, COMMITS_DIR, CONFIG_FILE, CONTROL_DIR, DEFAULT_BRANCH, HEAD_FILE,
    LOCK_FILE, META_DIR, ROOT_ENV, SNAPSTATE_EXT,
};
use anyhow::{Context, Result};
use fs4::fs_std::FileExt;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::debug;

/// Returns the tracked root: `$ARK_ROOT` if set, the cwd otherwise.
///
/// # Errors
///
/// Returns an error if neither the environment variable nor the current
/// working directory is available.
pub fn discover_root() -> Result<PathBuf> {
    if let Ok(root) = std::env::var(ROOT_ENV) {
        return Ok(PathBuf::from(root));
    }
    std::env::current_dir().context("could not determine current directory")
}

/// An opened tracked root.
///
/// Holds the advisory lock for as long as the value lives; dropping the
/// store releases it.
#[derive(Debug)]
pub struct Store {
    root: PathBuf,
    control: PathBuf,
    config: Config,
    _lock: File,
}

impl Store {
    /// Creates the control directory and opens the new store.
    ///
    /// The fresh store has HEAD attached to `main` with no commit, which is
    /// the legal transient state until the first commit creates the branch.
    ///
    /// # Errors
    ///
    /// Fails with [`ArkError::AlreadyTrackedRoot`] if the root is already
    /// tracked, or [`ArkError::StoreBusy`] if another process holds the lock.
    pub fn init(root: PathBuf) -> Result<Self> {
        let control = root.join(CONTROL_DIR);
        if control.join(HEAD_FILE).exists() {
            return Err(ArkError::AlreadyTrackedRoot(root).into());
        }

        fs::create_dir_all(control.join(COMMITS_DIR))
            .with_context(|| format!("failed to create {}", control.display()))?;
        fs::create_dir_all(control.join(META_DIR))?;
        fs::create_dir_all(control.join(BRANCHES_DIR))?;

        let lock = acquire_lock(&control)?;

        let config = Config::default();
        config.save(&control.join(CONFIG_FILE))?;

        let store = Self {
            root,
            control,
            config,
            _lock: lock,
        };
        store.write_atomic(
            &store.head_path(),
            &format!("branch:{DEFAULT_BRANCH}\n"),
        )?;
        debug!(root = %store.root.display(), "initialized store");
        Ok(store)
    }

    /// Opens an existing store.
    ///
    /// # Errors
    ///
    /// Fails with [`ArkError::NotTrackedRoot`] if the control directory is
    /// absent or malformed, or [`ArkError::StoreBusy`] on lock contention.
    pub fn open(root: PathBuf) -> Result<Self> {
        let control = root.join(CONTROL_DIR);
        if !control.is_dir() || !control.join(HEAD_FILE).exists() {
            return Err(ArkError::NotTrackedRoot(root).into());
        }

        let lock = acquire_lock(&control)?;
        let config = Config::load(&control.join(CONFIG_FILE))?;
        debug!(root = %root.display(), "opened store");

        Ok(Self {
            root,
            control,
            config,
            _lock: lock,
        })
    }

    /// The tracked root (the directory under backup management).
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The control directory beneath the root.
    #[must_use]
    pub fn control(&self) -> &Path {
        &self.control
    }

    /// The store configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Path of the HEAD pointer file.
    #[must_use]
    pub fn head_path(&self) -> PathBuf {
        self.control.join(HEAD_FILE)
    }

    /// Directory of branch target files.
    #[must_use]
    pub fn branches_dir(&self) -> PathBuf {
        self.control.join(BRANCHES_DIR)
    }

    /// Path of one branch target file.
    #[must_use]
    pub fn branch_path(&self, name: &str) -> PathBuf {
        self.branches_dir().join(name)
    }

    /// Directory of archive and snapshot-state blobs.
    #[must_use]
    pub fn commits_dir(&self) -> PathBuf {
        self.control.join(COMMITS_DIR)
    }

    /// Directory of commit metadata records.
    #[must_use]
    pub fn meta_dir(&self) -> PathBuf {
        self.control.join(META_DIR)
    }

    /// Path of one commit metadata record.
    #[must_use]
    pub fn meta_path(&self, id: &str) -> PathBuf {
        self.meta_dir().join(id)
    }

    /// Path of one archive blob.
    #[must_use]
    pub fn archive_path(&self, id: &str) -> PathBuf {
        self.commits_dir().join(format!("{id}.{ARCHIVE_EXT}"))
    }

    /// Path of one snapshot-state blob.
    #[must_use]
    pub fn snapstate_path(&self, id: &str) -> PathBuf {
        self.commits_dir().join(format!("{id}.{SNAPSTATE_EXT}"))
    }

    /// Writes a text file atomically (temp file + rename).
    ///
    /// # Errors
    ///
    /// Returns an error if the temp file cannot be created, written, or
    /// renamed into place.
    pub fn write_atomic(&self, path: &Path, contents: &str) -> Result<()> {
        let dir = path
            .parent()
            .with_context(|| format!("no parent directory for {}", path.display()))?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)
            .with_context(|| format!("failed to create temp file in {}", dir.display()))?;
        tmp.write_all(contents.as_bytes())?;
        tmp.persist(path)
            .map_err(|e| e.error)
            .with_context(|| format!("failed to publish {}", path.display()))?;
        Ok(())
    }
}

/// Takes the non-blocking exclusive lock on `<control>/lock`.
fn acquire_lock(control: &Path) -> Result<File> {
    let lock_path = control.join(LOCK_FILE);
    let file = File::create(&lock_path)
        .with_context(|| format!("failed to create lock file: {}", lock_path.display()))?;

    match file.try_lock_exclusive() {
        Ok(true) => {
            let mut file_ref = &file;
            let _ = writeln!(
                file_ref,
                "pid={}\ntime={}",
                std::process::id(),
                humantime::format_rfc3339(SystemTime::now())
            );
            Ok(file)
        }
        Ok(false) | Err(_) => Err(ArkError::StoreBusy.into()),
    }
}
