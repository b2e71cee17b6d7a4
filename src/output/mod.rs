//! Event stream and console formatting.
//!
//! Commands never print directly: they emit [`Event`]s through a [`Reporter`],
//! and the formatter decides how (and whether) each event reaches the user.
//! Verbosity filters the stream but never changes command semantics.

use colored::Colorize;

/// Verbosity level applied by the console formatter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Suppress informational messages, show only warnings and errors.
    Quiet,
    /// Default level, show all standard messages.
    Normal,
    /// Show everything, including per-step detail.
    Verbose,
}

/// One entry in the event stream a command produces.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Routine progress information.
    Info(String),
    /// Something surprising but not fatal.
    Warn(String),
    /// A failure report (commands normally return errors instead).
    Error(String),
    /// One branch in a `branch` listing.
    BranchRow {
        /// Branch name.
        name: String,
        /// Target commit id.
        target: String,
        /// Whether HEAD is attached to this branch.
        current: bool,
    },
    /// One commit in a `log` listing.
    CommitRow {
        /// Commit id rendered for display (short or full).
        display_id: String,
        /// When the commit was created, rendered for display.
        when: String,
        /// Branch names pointing here, plus `HEAD` when applicable.
        decorations: Vec<String>,
        /// First line of the commit message.
        subject: String,
    },
    /// One touched path in a `status` or `show` listing.
    ///
    /// Rows are the result of an operation, not progress text: they print
    /// at every verbosity.
    PathRow(String),
    /// Grouping header preceding each chain in a `log` listing.
    LogHeader(String),
}

/// Consumer of the event stream.
///
/// The provided methods are conveniences over [`Reporter::emit`]; formatters
/// implement `emit` alone.
pub trait Reporter {
    /// Receives one event.
    fn emit(&self, event: Event);

    /// Emits an [`Event::Info`].
    fn info(&self, message: &str) {
        self.emit(Event::Info(message.to_string()));
    }

    /// Emits an [`Event::Warn`].
    fn warn(&self, message: &str) {
        self.emit(Event::Warn(message.to_string()));
    }

    /// Emits an [`Event::Error`].
    fn error(&self, message: &str) {
        self.emit(Event::Error(message.to_string()));
    }
}

/// Console formatter: rows to stdout, messages to stderr, colors via
/// [`colored`].
pub struct Console {
    verbosity: Verbosity,
}

impl Console {
    /// Creates a console reporter with the given verbosity.
    #[must_use]
    pub const fn new(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }

    /// The verbosity this reporter filters with.
    #[must_use]
    pub const fn verbosity(&self) -> Verbosity {
        self.verbosity
    }
}

impl Reporter for Console {
    fn emit(&self, event: Event) {
        match event {
            Event::Info(msg) => {
                if self.verbosity != Verbosity::Quiet {
                    eprintln!("{}", msg.dimmed());
                }
            }
            Event::Warn(msg) => eprintln!("{}", msg.yellow().bold()),
            Event::Error(msg) => eprintln!("{}", msg.red().bold()),
            Event::BranchRow {
                name,
                target,
                current,
            } => {
                let short = crate::utils::formatters::short_id(&target).to_string();
                if current {
                    println!("{} {name} {}", "*".green(), short.dimmed());
                } else {
                    println!("  {name} {}", short.dimmed());
                }
            }
            Event::CommitRow {
                display_id,
                when,
                decorations,
                subject,
            } => {
                let decor = if decorations.is_empty() {
                    String::new()
                } else {
                    format!(" ({})", decorations.join(", ").cyan())
                };
                println!("{} {}{decor} {subject}", display_id.yellow(), when.dimmed());
            }
            Event::PathRow(path) => println!("{path}"),
            Event::LogHeader(header) => println!("{}", header.bold()),
        }
    }
}

/// Test reporter that records every event it receives.
#[derive(Default)]
pub struct Recording {
    events: std::sync::Mutex<Vec<Event>>,
}

impl Recording {
    /// Creates an empty recording reporter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every event emitted so far.
    #[must_use]
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl Reporter for Recording {
    fn emit(&self, event: Event) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_captures_events() {
        let rec = Recording::new();
        rec.info("hello");
        rec.warn("careful");
        let events = rec.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], Event::Info("hello".to_string()));
    }

    #[test]
    fn test_console_verbosity_accessor() {
        let console = Console::new(Verbosity::Quiet);
        assert_eq!(console.verbosity(), Verbosity::Quiet);
    }
}
