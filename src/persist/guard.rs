//! persist::guard
//!
//! Decides whether a job may write its results to a target group, so
//! re-running a batch skips work whose output is already present.
//!
//! | group state            | overwrite | decision  |
//! |------------------------|-----------|-----------|
//! | store or group missing | any       | Proceed   |
//! | group with no children | any       | Proceed   |
//! | non-empty              | true      | Overwrite |
//! | non-empty              | false     | Skip      |
//!
//! A dataset sitting at the target path counts as non-empty.

use crate::core::types::Location;
use crate::store::handle::{OpenMode, StoreError, StoreHandle};
use crate::store::retry::RetryPolicy;
use crate::ui::output::Logger;

/// What to do about a target group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Nothing there yet.
    Proceed,
    /// Existing results will be replaced.
    Overwrite,
    /// Existing results are kept; the caller should not write.
    Skip,
}

impl Decision {
    pub fn is_skip(self) -> bool {
        self == Decision::Skip
    }
}

/// Checks targets before a write, warning through the given logger.
#[derive(Debug)]
pub struct OutputGuard<'a> {
    logger: &'a Logger,
    policy: RetryPolicy,
}

impl<'a> OutputGuard<'a> {
    pub fn new(logger: &'a Logger, policy: RetryPolicy) -> Self {
        Self { logger, policy }
    }

    /// Inspect `target` read-only and decide.
    ///
    /// # Errors
    ///
    /// `StoreError::Unavailable` if an existing store cannot be opened
    /// within the retry budget.
    pub fn decide(&self, target: &Location, overwrite: bool) -> Result<Decision, StoreError> {
        if !target.file.exists() {
            return Ok(Decision::Proceed);
        }

        let occupied = {
            let handle = StoreHandle::acquire(&target.file, OpenMode::Read, self.policy)?;
            let occupied = if target.group.is_root() {
                !handle.root().is_empty()
            } else {
                handle.node(&target.group).is_some_and(|n| n.has_content())
            };
            handle.close()?;
            occupied
        };

        if !occupied {
            return Ok(Decision::Proceed);
        }

        if overwrite {
            if self.logger.do_warning() {
                self.logger.warn(format!(
                    "Overwriting the contents of \"{}\" in the file \"{}\".",
                    target.group,
                    target.file.display()
                ));
            }
            Ok(Decision::Overwrite)
        } else {
            if self.logger.do_warning() {
                self.logger.warn(format!(
                    "Skipping because the group \"{}\" is already present in the file \"{}\" and it is not empty.",
                    target.group,
                    target.file.display()
                ));
            }
            Ok(Decision::Skip)
        }
    }

    /// `true` when the caller should skip writing.
    pub fn check_output(&self, target: &Location, overwrite: bool) -> Result<bool, StoreError> {
        Ok(self.decide(target, overwrite)?.is_skip())
    }
}

/// One-shot form of [`OutputGuard::check_output`].
pub fn check_output(
    target: &Location,
    overwrite: bool,
    policy: RetryPolicy,
    logger: &Logger,
) -> Result<bool, StoreError> {
    OutputGuard::new(logger, policy).check_output(target, overwrite)
}
