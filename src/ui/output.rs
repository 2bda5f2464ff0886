//! ui::output
//!
//! Leveled, injectable logging.
//!
//! # Design
//!
//! There is no process-wide logger. Components that report progress
//! (the output guard, the result writer) take a [`Logger`] by reference,
//! and callers decide where messages go by choosing its [`LogSink`].
//! Each level has a gate (`do_warning`, `do_info`, `do_debug`) so callers
//! can skip building expensive messages that would be discarded.

use std::cell::RefCell;
use std::fmt::{self, Display};
use std::rc::Rc;

use serde::{Deserialize, Serialize};

/// How much the logger lets through.
///
/// Ordered: each level includes everything below it.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    /// Nothing at all
    Silent,
    /// Warnings only
    Warning,
    /// Warnings and informational messages
    #[default]
    Info,
    /// Everything, including debug detail
    Debug,
}

impl Verbosity {
    /// Create verbosity from flags.
    pub fn from_flags(quiet: bool, debug: bool) -> Self {
        if quiet {
            Verbosity::Warning
        } else if debug {
            Verbosity::Debug
        } else {
            Verbosity::Info
        }
    }
}

impl fmt::Display for Verbosity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Verbosity::Silent => "silent",
            Verbosity::Warning => "warning",
            Verbosity::Info => "info",
            Verbosity::Debug => "debug",
        };
        write!(f, "{}", name)
    }
}

impl std::str::FromStr for Verbosity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "silent" => Ok(Verbosity::Silent),
            "warning" => Ok(Verbosity::Warning),
            "info" => Ok(Verbosity::Info),
            "debug" => Ok(Verbosity::Debug),
            other => Err(format!(
                "unknown verbosity '{}' (expected silent, warning, info or debug)",
                other
            )),
        }
    }
}

/// Severity of a single message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Warning,
    Info,
    Debug,
}

impl Level {
    fn threshold(self) -> Verbosity {
        match self {
            Level::Warning => Verbosity::Warning,
            Level::Info => Verbosity::Info,
            Level::Debug => Verbosity::Debug,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Warning => write!(f, "warning"),
            Level::Info => write!(f, "info"),
            Level::Debug => write!(f, "debug"),
        }
    }
}

/// Destination for messages that passed the verbosity gate.
pub trait LogSink {
    fn emit(&self, level: Level, message: &str);
}

/// Writes to stderr, prefixed the same way as the CLI's other diagnostics.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrSink;

impl LogSink for StderrSink {
    fn emit(&self, level: Level, message: &str) {
        match level {
            Level::Warning => eprintln!("warning: {}", message),
            Level::Info => eprintln!("{}", message),
            Level::Debug => eprintln!("[debug] {}", message),
        }
    }
}

/// Collects messages in memory. Clones share the same buffer.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    records: Rc<RefCell<Vec<(Level, String)>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All messages recorded so far.
    pub fn records(&self) -> Vec<(Level, String)> {
        self.records.borrow().clone()
    }

    /// Messages recorded at one level.
    pub fn messages(&self, level: Level) -> Vec<String> {
        self.records
            .borrow()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.clone())
            .collect()
    }
}

impl LogSink for MemorySink {
    fn emit(&self, level: Level, message: &str) {
        self.records.borrow_mut().push((level, message.to_string()));
    }
}

/// A verbosity gate in front of a sink.
pub struct Logger {
    verbosity: Verbosity,
    sink: Box<dyn LogSink>,
}

impl Logger {
    pub fn new(verbosity: Verbosity, sink: impl LogSink + 'static) -> Self {
        Self {
            verbosity,
            sink: Box::new(sink),
        }
    }

    /// Logger writing to stderr.
    pub fn stderr(verbosity: Verbosity) -> Self {
        Self::new(verbosity, StderrSink)
    }

    /// Logger that drops everything.
    pub fn silent() -> Self {
        Self::new(Verbosity::Silent, StderrSink)
    }

    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    /// Whether a message at `level` would be emitted.
    pub fn enabled(&self, level: Level) -> bool {
        self.verbosity >= level.threshold()
    }

    pub fn do_warning(&self) -> bool {
        self.enabled(Level::Warning)
    }

    pub fn do_info(&self) -> bool {
        self.enabled(Level::Info)
    }

    pub fn do_debug(&self) -> bool {
        self.enabled(Level::Debug)
    }

    /// Emit `message` if `level` passes the gate.
    pub fn log(&self, level: Level, message: impl Display) {
        if self.enabled(level) {
            self.sink.emit(level, &message.to_string());
        }
    }

    pub fn warn(&self, message: impl Display) {
        self.log(Level::Warning, message);
    }

    pub fn info(&self, message: impl Display) {
        self.log(Level::Info, message);
    }

    pub fn debug(&self, message: impl Display) {
        self.log(Level::Debug, message);
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("verbosity", &self.verbosity)
            .finish_non_exhaustive()
    }
}

/// Print an error message (always shown).
pub fn error(message: impl Display) {
    eprintln!("error: {}", message);
}
