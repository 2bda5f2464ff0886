//! resultstore - persistence for batch computations
//!
//! Batch jobs write their results into a shared hierarchical store file:
//! named groups holding scalar and array datasets, stamped with the command
//! line that produced them. Many jobs may target one file at once, so every
//! open is locked and retried with jittered backoff, and a job can skip
//! itself when its output group already holds results.
//!
//! # Architecture
//!
//! - [`core`] - Domain types, paths, locking, configuration
//! - [`store`] - The store tree, its file format, and scoped handles
//! - [`persist`] - Output guard, provenance, result writer
//! - [`ui`] - Injected, verbosity-gated logging
//! - [`cli`] - The `rstore` command-line interface
//!
//! # Guarantees
//!
//! 1. A store file is only ever replaced whole, by rename
//! 2. Every open handle holds the sidecar lock until it is released
//! 3. Handles are released on every exit path
//! 4. Store-open failures are retried a bounded number of times

pub mod cli;
pub mod core;
pub mod persist;
pub mod store;
pub mod ui;
