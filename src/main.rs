use anyhow::Result;
use arkive::errors::ArkError;
use arkive::output::{Console, Verbosity};
use arkive::{commands, store};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Generator, Shell};
use colored::Colorize;
use std::io;
use std::process;

#[derive(Parser)]
#[command(
    name = "ark",
    version = arkive::VERSION,
    about = "Directory backups with git-like semantics",
    long_about = "A directory-scoped backup engine that records history as a chain of \
                  incremental archives and speaks the git vocabulary"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Show per-step detail
    #[arg(long, global = true)]
    verbose: bool,

    /// Suppress informational output
    #[arg(long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Turn the current directory into a tracked root
    Init,

    /// Record the working tree as a new commit
    Commit {
        /// Commit message
        msg: String,
    },

    /// Reconstruct the tree at a branch or commit
    Checkout {
        /// Branch name, commit id, or unique id prefix
        target: Option<String>,

        /// Proceed even with uncommitted changes
        #[arg(short, long)]
        force: bool,

        /// Create a fresh branch with no commit instead of switching
        #[arg(long)]
        orphan: bool,
    },

    /// Move the current position to another commit
    Reset {
        /// Branch name, commit id, or unique id prefix
        target: String,

        /// Also reconstruct the working tree at the target
        #[arg(long)]
        hard: bool,
    },

    /// List, create, move, or delete branches
    Branch {
        /// Branch name (omit to list branches)
        name: Option<String>,

        /// Reference the new branch should point at (defaults to HEAD)
        start: Option<String>,

        /// Overwrite an existing branch
        #[arg(short, long)]
        force: bool,

        /// Delete the named branch
        #[arg(short, long)]
        delete: bool,
    },

    /// Show a commit and the paths it touches
    Show {
        /// Branch name, commit id, or unique id prefix (defaults to HEAD)
        target: Option<String>,
    },

    /// Report changed paths since the last snapshot
    Status,

    /// Show commit chains newest-first
    Log {
        /// Starting references (defaults to HEAD)
        refs: Vec<String>,

        /// Start from every branch target and HEAD
        #[arg(long)]
        all: bool,

        /// Print full ids and absolute dates
        #[arg(long)]
        full: bool,
    },

    /// Delete commits unreachable from any branch or HEAD
    Prune,

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() {
    if let Err(e) = run() {
        render_error(&e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let verbosity = if cli.quiet {
        Verbosity::Quiet
    } else if cli.verbose {
        Verbosity::Verbose
    } else {
        Verbosity::Normal
    };
    let reporter = Console::new(verbosity);

    match cli.command {
        Commands::Init => commands::init::execute(store::discover_root()?, &reporter),
        Commands::Completion { shell } => {
            print_completions(shell, &mut Cli::command());
            Ok(())
        }
        command => {
            let store = store::Store::open(store::discover_root()?)?;
            match command {
                Commands::Commit { msg } => commands::commit::execute(&store, &reporter, &msg),
                Commands::Checkout {
                    target,
                    force,
                    orphan,
                } => commands::checkout::execute(
                    &store,
                    &reporter,
                    target.as_deref(),
                    force,
                    orphan,
                ),
                Commands::Reset { target, hard } => {
                    commands::reset::execute(&store, &reporter, &target, hard)
                }
                Commands::Branch {
                    name,
                    start,
                    force,
                    delete,
                } => commands::branch::execute(
                    &store,
                    &reporter,
                    name.as_deref(),
                    start.as_deref(),
                    force,
                    delete,
                ),
                Commands::Show { target } => {
                    commands::show::execute(&store, &reporter, target.as_deref())
                }
                Commands::Status => commands::status::execute(&store, &reporter),
                Commands::Log { refs, all, full } => {
                    commands::log::execute(&store, &reporter, &refs, all, full)
                }
                Commands::Prune => commands::prune::execute(&store, &reporter),
                Commands::Init | Commands::Completion { .. } => unreachable!(),
            }
        }
    }
}

/// Renders the failure as one error line plus a bulleted list for the kinds
/// that carry offending items.
fn render_error(error: &anyhow::Error) {
    eprintln!("{} {error}", "error:".red().bold());
    match error.downcast_ref::<ArkError>() {
        Some(ArkError::DirtyWorkingTree { paths }) => {
            for path in paths {
                eprintln!("  - {path}");
            }
        }
        Some(ArkError::AmbiguousRef { candidates, .. }) => {
            for candidate in candidates {
                eprintln!("  - {candidate}");
            }
        }
        _ => {}
    }
}

fn print_completions<G: Generator>(generator: G, cmd: &mut clap::Command) {
    generate(generator, cmd, cmd.get_name().to_string(), &mut io::stdout());
}
