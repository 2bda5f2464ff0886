//! cli
//!
//! Command-line interface layer for rstore.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Merge flags over the loaded configuration
//! - Delegate to command handlers
//!
//! # Architecture
//!
//! The CLI layer is thin. Handlers call into [`crate::store`] and
//! [`crate::persist`] and only format what comes back.

pub mod args;
pub mod commands;

pub use args::{Cli, Shell};

use std::time::Duration;

use anyhow::{Context as _, Result};

use crate::core::config::Config;
use crate::store::retry::RetryPolicy;
use crate::ui::output::{Logger, Verbosity};

/// Settings shared by every command, resolved from flags and config.
#[derive(Debug)]
pub struct Context {
    pub config: Config,
    pub logger: Logger,
    pub policy: RetryPolicy,
}

impl Context {
    /// Resolve settings. Flags win over config values.
    pub fn resolve(cli: &Cli, config: Config) -> Result<Self> {
        let verbosity = if cli.quiet || cli.debug {
            Verbosity::from_flags(cli.quiet, cli.debug)
        } else {
            config.verbosity()
        };

        let attempts = cli.max_attempts.unwrap_or_else(|| config.max_attempts());
        let wait_seconds = cli.max_wait.unwrap_or_else(|| config.max_wait_seconds());
        let wait = Duration::try_from_secs_f64(wait_seconds)
            .with_context(|| format!("Invalid --max-wait value: {}", wait_seconds))?;
        let policy = RetryPolicy::new(attempts, wait).context("Invalid retry settings")?;

        Ok(Self {
            config,
            logger: Logger::stderr(verbosity),
            policy,
        })
    }
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();
    let config = Config::load().context("Failed to load config")?;
    let ctx = Context::resolve(&cli, config)?;

    commands::dispatch(cli.command, &ctx)
}
