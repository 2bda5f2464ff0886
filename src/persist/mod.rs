//! Persisting a job's results into a store.
//!
//! # Modules
//!
//! - [`args`] - Parsed-arguments record
//! - [`cache`] - Keyed intermediate results for the debug side-channel
//! - [`guard`] - Skip-or-overwrite decision for a target group
//! - [`provenance`] - Command line, directory and time attributes
//! - [`writer`] - Group replacement
//!
//! [`persist_results`] runs the guard and the writer in sequence, which is
//! what a batch job calls at the end of its run.

pub mod args;
pub mod cache;
pub mod guard;
pub mod provenance;
pub mod writer;

pub use args::{ArgsError, ArgsRecord};
pub use cache::{Cache, CacheError, CacheKey, KeyPart, MemoryCache};
pub use guard::{check_output, Decision, OutputGuard};
pub use provenance::ProvenanceRecorder;
pub use writer::{DebugSideChannel, ResultWriter, WriteError, WriteReport};

use crate::core::types::Location;
use crate::store::handle::{with_store, OpenMode};
use crate::store::retry::RetryPolicy;
use crate::store::value::Value;
use crate::ui::output::Logger;

/// Knobs for [`persist_results`].
#[derive(Debug, Clone)]
pub struct PersistOptions {
    pub overwrite: bool,
    pub policy: RetryPolicy,
    pub provenance: ProvenanceRecorder,
}

impl PersistOptions {
    /// No overwrite, default retry policy.
    pub fn new(provenance: ProvenanceRecorder) -> Self {
        Self {
            overwrite: false,
            policy: RetryPolicy::default(),
            provenance,
        }
    }

    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Non-empty results were already present.
    Skipped,
    Written(WriteReport),
}

/// Check the target, then write unless told to skip.
///
/// # Errors
///
/// Any [`WriteError`]; store access failures arrive as `WriteError::Store`.
pub fn persist_results(
    target: &Location,
    values: &[(String, Value)],
    args: &ArgsRecord,
    debug: Option<&DebugSideChannel<'_>>,
    options: &PersistOptions,
    logger: &Logger,
) -> Result<Outcome, WriteError> {
    let guard = OutputGuard::new(logger, options.policy);
    if guard.check_output(target, options.overwrite)? {
        return Ok(Outcome::Skipped);
    }

    let writer = ResultWriter::new(logger, options.provenance.clone());
    let report = with_store(&target.file, OpenMode::Append, options.policy, |handle| {
        writer.write(handle, &target.group, values, args, debug)
    })?;
    Ok(Outcome::Written(report))
}
