#![allow(dead_code)]

use anyhow::Result;
use arkive::output::{Event, Recording};
use arkive::store::Store;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Test environment providing an isolated tracked root.
pub struct TestEnvironment {
    /// Temporary directory for the test (automatically cleaned up)
    temp_dir: TempDir,
    /// The tracked root
    pub root: PathBuf,
}

impl TestEnvironment {
    /// Create a new test environment with an isolated root directory
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path().to_path_buf();
        Ok(Self { temp_dir, root })
    }

    /// Initialize a store in this environment
    pub fn init_store(&self) -> Result<Store> {
        Store::init(self.root.clone())
    }

    /// Open the already-initialized store
    pub fn open_store(&self) -> Result<Store> {
        Store::open(self.root.clone())
    }

    /// Create a file in the root
    pub fn write_file(&self, relative_path: &str, content: &str) -> Result<PathBuf> {
        let file_path = self.root.join(relative_path);
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&file_path, content)?;
        Ok(file_path)
    }

    /// Remove a file from the root
    pub fn remove_file(&self, relative_path: &str) -> Result<()> {
        std::fs::remove_file(self.root.join(relative_path))?;
        Ok(())
    }

    /// Check if a file exists in the root
    pub fn file_exists(&self, relative_path: &str) -> bool {
        self.root.join(relative_path).exists()
    }

    /// Read a file from the root
    pub fn read_file(&self, relative_path: &str) -> Result<String> {
        Ok(std::fs::read_to_string(self.root.join(relative_path))?)
    }

    /// List every tracked filename in the root (control directory excluded),
    /// relative to the root and sorted
    pub fn tracked_files(&self) -> Result<Vec<String>> {
        let mut files = Vec::new();
        collect_files(&self.root, &self.root, &mut files)?;
        files.sort();
        Ok(files)
    }
}

fn collect_files(root: &Path, dir: &Path, files: &mut Vec<String>) -> Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if dir == root && entry.file_name() == arkive::CONTROL_DIR {
            continue;
        }
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            collect_files(root, &path, files)?;
        } else {
            files.push(
                path.strip_prefix(root)
                    .expect("entry under root")
                    .to_string_lossy()
                    .into_owned(),
            );
        }
    }
    Ok(())
}

/// Extract the info messages from a recording reporter
pub fn info_messages(reporter: &Recording) -> Vec<String> {
    reporter
        .events()
        .into_iter()
        .filter_map(|e| match e {
            Event::Info(msg) => Some(msg),
            _ => None,
        })
        .collect()
}

/// Extract the branch rows from a recording reporter
pub fn branch_rows(reporter: &Recording) -> Vec<(String, String, bool)> {
    reporter
        .events()
        .into_iter()
        .filter_map(|e| match e {
            Event::BranchRow {
                name,
                target,
                current,
            } => Some((name, target, current)),
            _ => None,
        })
        .collect()
}

/// Extract the commit-row subjects from a recording reporter
pub fn commit_subjects(reporter: &Recording) -> Vec<String> {
    reporter
        .events()
        .into_iter()
        .filter_map(|e| match e {
            Event::CommitRow { subject, .. } => Some(subject),
            _ => None,
        })
        .collect()
}
