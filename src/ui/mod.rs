//! ui
//!
//! User-facing output.
//!
//! # Modules
//!
//! - [`output`] - Leveled logger and output helpers
//!
//! # Design
//!
//! All diagnostics go through this module so verbosity handling and
//! message prefixes stay consistent between the library and the CLI.

pub mod output;
