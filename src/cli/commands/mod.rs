//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Parses its location argument
//! 2. Calls into the store or the persistence layer
//! 3. Formats and displays output
//!
//! Read-only commands open stores with a shared lock and release them
//! before printing.

mod attrs;
mod check;
mod completion;
mod config_cmd;
mod ls;
mod put;

// Re-export command functions for testing and direct invocation
pub use attrs::attrs;
pub use check::check;
pub use completion::{completion, write_completion};
pub use config_cmd::{list as config_list, path as config_path, set as config_set};
pub use ls::{ls, render};
pub use put::{parse_values, put};

use crate::cli::args::{Command, ConfigAction};
use crate::cli::Context;
use anyhow::Result;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Ls { location } => ls::ls(ctx, &location),
        Command::Attrs { location } => attrs::attrs(ctx, &location),
        Command::Check {
            location,
            overwrite,
        } => check::check(ctx, &location, overwrite),
        Command::Put {
            location,
            values,
            args,
            overwrite,
        } => put::put(ctx, &location, &values, &args, overwrite),
        Command::Config { action } => match action {
            ConfigAction::Path => config_cmd::path(ctx),
            ConfigAction::List => config_cmd::list(ctx),
            ConfigAction::Set { key, value } => config_cmd::set(ctx, &key, &value),
        },
        Command::Completion { shell } => completion::completion(shell),
    }
}
