//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--quiet` / `-q`: Warnings only
//! - `--debug`: Debug detail
//! - `--max-attempts <n>`: Store open attempts
//! - `--max-wait <seconds>`: Upper bound of the random wait between attempts

use clap::{Parser, Subcommand, ValueEnum};

/// rstore - inspect and fill hierarchical result stores
#[derive(Parser, Debug)]
#[command(name = "rstore")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Show debug detail
    #[arg(long, global = true)]
    pub debug: bool,

    /// Only show warnings
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Number of attempts when the store is busy [config: retry.max_attempts]
    #[arg(long, global = true, value_name = "N")]
    pub max_attempts: Option<u32>,

    /// Maximum random wait between attempts, in seconds [config: retry.max_wait_seconds]
    #[arg(long, global = true, value_name = "SECONDS")]
    pub max_wait: Option<f64>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the tree under a group
    #[command(
        name = "ls",
        after_help = "\
EXAMPLES:
    # Whole store
    rstore ls out.json

    # One group
    rstore ls out.json:/wpart/he"
    )]
    Ls {
        /// Target as <file>[:<group>]
        location: String,
    },

    /// Show the attributes of a group
    #[command(
        name = "attrs",
        after_help = "\
EXAMPLES:
    # Provenance of a result group
    rstore attrs out.json:/wpart/he"
    )]
    Attrs {
        /// Target as <file>[:<group>]
        location: String,
    },

    /// Decide whether a job writing to a group should skip
    #[command(
        name = "check",
        long_about = "Decide whether a job writing to a group should skip.\n\n\
            Prints 'skip' when the group already holds results and --overwrite \
            is not given, 'proceed' otherwise. Exits 0 in both cases.",
        after_help = "\
EXAMPLES:
    # In a batch script
    if [ \"$(rstore check -q out.json:/res)\" = proceed ]; then run_job; fi"
    )]
    Check {
        /// Target as <file>:<group>
        location: String,

        /// Replace existing results instead of skipping
        #[arg(long)]
        overwrite: bool,
    },

    /// Write results into a group
    #[command(
        name = "put",
        long_about = "Write results into a group.\n\n\
            Values come from a JSON object: numbers, strings and bools become \
            scalars, rectangular numeric arrays become arrays, and objects \
            become subgroups. Existing children of the group are replaced; \
            its attributes are kept and stamped with provenance.",
        after_help = "\
EXAMPLES:
    # Store two results with the arguments that produced them
    rstore put out.json:/res --values '{\"energy\": -1.23, \"charges\": [0.1, -0.1]}' \\
        --arg alpha=0.5 --arg beta=

    # Replace results that are already there
    rstore put out.json:/res --values '{\"energy\": -1.25}' --overwrite"
    )]
    Put {
        /// Target as <file>:<group>
        location: String,

        /// Results as a JSON object
        #[arg(long, value_name = "JSON")]
        values: String,

        /// Argument to record as arg_<name>; an empty value records nothing
        #[arg(long = "arg", value_name = "NAME=VALUE")]
        args: Vec<String>,

        /// Replace existing results instead of skipping [config: output.overwrite]
        #[arg(long)]
        overwrite: bool,
    },

    /// Show or change configuration
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completion scripts
    #[command(
        name = "completion",
        after_help = "\
EXAMPLES:
    # Bash
    rstore completion bash > ~/.local/share/bash-completion/completions/rstore

    # Zsh
    rstore completion zsh > \"${fpath[1]}/_rstore\""
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Configuration actions.
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the path of the active config file
    Path,
    /// Print the effective configuration
    List,
    /// Set a value and write the config file
    Set {
        /// Key, e.g. retry.max_attempts
        key: String,
        /// New value
        value: String,
    },
}

/// Supported shells for completion.
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    #[value(name = "powershell")]
    PowerShell,
}
