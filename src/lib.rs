#![warn(missing_docs)]

//! # Arkive - Incremental Archive Backups with Git Semantics
//!
//! Arkive turns any directory into a tracked backup root. It speaks the git
//! vocabulary (commits, branches, HEAD, checkout, reset, log, show, status)
//! but persists history as a chain of incremental tar archives instead of a
//! content-addressed object store. Each commit captures the delta since its
//! parent; any historical state is reconstructed by replaying the ancestor
//! chain of archives in order.
//!
//! ## Architecture
//!
//! - [`store`]: the on-disk control directory and the opened-store handle
//! - [`refs`]: HEAD and branch pointers, reference resolution
//! - [`history`]: commit records, ancestor chains, reachability
//! - [`snapshot`]: the tar subprocess wrapper (capture, extract, list)
//! - [`worktree`]: clean/dirty gating and checkout sequencing
//! - [`commands`]: the command surface composed from the layers above
//! - [`output`]: the event stream consumed by the console formatter
//! - [`errors`]: the error kinds surfaced to the user
//!
//! ## Example
//!
//! ```no_run
//! use arkive::output::{Console, Verbosity};
//! use arkive::store::Store;
//!
//! # fn main() -> anyhow::Result<()> {
//! let reporter = Console::new(Verbosity::Normal);
//! let store = Store::init(std::env::current_dir()?)?;
//! arkive::commands::commit::execute(&store, &reporter, "first snapshot")?;
//! # Ok(())
//! # }
//! ```

/// Command implementations (init, commit, checkout, ...).
pub mod commands;

/// Store configuration parsing and defaults.
pub mod config;

/// Error kinds surfaced by every layer.
pub mod errors;

/// Commit records, ancestor chains, and reachability.
pub mod history;

/// Event stream and console formatting.
pub mod output;

/// HEAD and branch management, reference resolution.
pub mod refs;

/// Incremental archive capture and extraction via the external tar tool.
pub mod snapshot;

/// The tracked root and its control directory.
pub mod store;

/// Utility helpers (identifiers, formatting, timestamps).
pub mod utils;

/// Working-tree gating and reconstruction sequencing.
pub mod worktree;

/// Current version of the ark binary.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable naming the tracked root; falls back to the cwd.
pub const ROOT_ENV: &str = "ARK_ROOT";

/// Name of the hidden control directory beneath the tracked root.
pub const CONTROL_DIR: &str = ".ark";

/// Directory holding one archive blob and one snapshot-state blob per commit.
pub const COMMITS_DIR: &str = "commits";

/// Directory holding one structured metadata record per commit.
pub const META_DIR: &str = "commit-meta";

/// Directory holding one target file per branch.
pub const BRANCHES_DIR: &str = "branches";

/// Name of the HEAD pointer file.
pub const HEAD_FILE: &str = "HEAD";

/// Name of the store configuration file.
pub const CONFIG_FILE: &str = "config";

/// Name of the advisory lock file.
pub const LOCK_FILE: &str = "lock";

/// Branch that a freshly initialized store attaches HEAD to.
pub const DEFAULT_BRANCH: &str = "main";

/// File extension of archive blobs under [`COMMITS_DIR`].
pub const ARCHIVE_EXT: &str = "archive";

/// File extension of snapshot-state blobs under [`COMMITS_DIR`].
pub const SNAPSTATE_EXT: &str = "snapstate";
