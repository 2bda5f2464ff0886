//! store::handle
//!
//! Exclusive, scoped access to an open store file.
//!
//! # Lifecycle
//!
//! 1. [`StoreHandle::acquire`] takes the sidecar lock and loads the tree,
//!    retrying transient failures (lock contention, I/O, a file caught
//!    mid-replacement) under a [`RetryPolicy`].
//! 2. The caller reads or mutates the tree in memory.
//! 3. [`StoreHandle::close`] writes the tree back atomically (temp file,
//!    fsync, rename) if it was modified, then releases the lock. Dropping
//!    an open handle does the same on a best-effort basis, so the lock is
//!    released on every path, panics included.
//!
//! Mutations are not rolled back. Whatever the tree holds when the handle
//! is released is what lands on disk.
//!
//! # Example
//!
//! ```no_run
//! use resultstore::core::types::GroupPath;
//! use resultstore::store::{with_store, OpenMode, RetryPolicy, StoreError};
//!
//! let n = with_store("out.json", OpenMode::Read, RetryPolicy::default(), |h| {
//!     Ok::<_, StoreError>(h.group(&GroupPath::root()).map_or(0, |g| g.len()))
//! })?;
//! # Ok::<(), StoreError>(())
//! ```

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use rand::RngCore;
use thiserror::Error;

use super::format::{self, FormatError};
use super::node::{Group, Node};
use super::retry::{retry, RetryPolicy, Sleeper, ThreadSleeper};
use crate::core::ops::lock::{LockError, LockKind, StoreLock};
use crate::core::paths::StorePaths;
use crate::core::types::GroupPath;

/// How a store is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Existing store, shared lock, never written back.
    Read,
    /// Existing store, exclusive lock.
    ReadWrite,
    /// Start from an empty tree, replacing any existing store.
    Create,
    /// Open if present, otherwise start empty.
    Append,
}

impl OpenMode {
    pub fn is_writable(self) -> bool {
        self != OpenMode::Read
    }

    fn lock_kind(self) -> LockKind {
        if self.is_writable() {
            LockKind::Exclusive
        } else {
            LockKind::Shared
        }
    }
}

/// Why a single open attempt failed.
#[derive(Debug, Error)]
pub enum OpenError {
    #[error("store is locked by another process")]
    Locked,

    #[error("store file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error(transparent)]
    Lock(LockError),

    #[error("i/o error opening store: {0}")]
    Io(#[from] io::Error),

    #[error("corrupt store: {0}")]
    Corrupt(#[from] FormatError),
}

impl From<LockError> for OpenError {
    fn from(e: LockError) -> Self {
        match e {
            LockError::Contended => OpenError::Locked,
            other => OpenError::Lock(other),
        }
    }
}

/// Errors from store access.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Every open attempt failed.
    #[error("store '{}' unavailable after {attempts} attempt(s): {source}", .path.display())]
    Unavailable {
        path: PathBuf,
        attempts: u32,
        #[source]
        source: OpenError,
    },

    #[error("store '{}' is open read-only", .0.display())]
    ReadOnly(PathBuf),

    #[error("failed to write store '{}': {source}", .path.display())]
    Flush {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to encode store: {0}")]
    Encode(#[from] FormatError),

    #[error("failed to release store: {0}")]
    Release(#[from] LockError),
}

impl StoreError {
    /// Whether this is a retries-exhausted failure.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, StoreError::Unavailable { .. })
    }
}

/// An open store. See the module docs for the lifecycle.
#[derive(Debug)]
pub struct StoreHandle {
    paths: StorePaths,
    mode: OpenMode,
    root: Group,
    dirty: bool,
    /// Some while the handle is open.
    lock: Option<StoreLock>,
}

impl StoreHandle {
    /// Open once, no retries.
    pub fn open(file: impl AsRef<Path>, mode: OpenMode) -> Result<Self, OpenError> {
        let paths = StorePaths::new(file.as_ref());

        let must_exist = matches!(mode, OpenMode::Read | OpenMode::ReadWrite);
        if must_exist && !paths.file().exists() {
            return Err(OpenError::NotFound(paths.file().to_path_buf()));
        }

        let lock = StoreLock::acquire(&paths, mode.lock_kind())?;

        let (root, dirty) = match mode {
            OpenMode::Create => (Group::new(), true),
            OpenMode::Read | OpenMode::ReadWrite => (Self::load(&paths)?, false),
            OpenMode::Append => match fs::read(paths.file()) {
                Ok(bytes) => (format::decode(&bytes)?, false),
                Err(e) if e.kind() == io::ErrorKind::NotFound => (Group::new(), true),
                Err(e) => return Err(OpenError::Io(e)),
            },
        };

        Ok(Self {
            paths,
            mode,
            root,
            dirty,
            lock: Some(lock),
        })
    }

    fn load(paths: &StorePaths) -> Result<Group, OpenError> {
        let bytes = fs::read(paths.file()).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                OpenError::NotFound(paths.file().to_path_buf())
            } else {
                OpenError::Io(e)
            }
        })?;
        Ok(format::decode(&bytes)?)
    }

    /// Open with retries, sleeping for real between attempts.
    pub fn acquire(
        file: impl AsRef<Path>,
        mode: OpenMode,
        policy: RetryPolicy,
    ) -> Result<Self, StoreError> {
        Self::acquire_with(file, mode, policy, &mut ThreadSleeper, &mut rand::rng())
    }

    /// Open with retries using the given clock and random source.
    ///
    /// # Errors
    ///
    /// `StoreError::Unavailable` carrying the last attempt's error once the
    /// policy's attempts are spent.
    pub fn acquire_with(
        file: impl AsRef<Path>,
        mode: OpenMode,
        policy: RetryPolicy,
        sleeper: &mut dyn Sleeper,
        rng: &mut dyn RngCore,
    ) -> Result<Self, StoreError> {
        let file = file.as_ref();
        retry(policy, sleeper, rng, |_| Self::open(file, mode)).map_err(|exhausted| {
            StoreError::Unavailable {
                path: file.to_path_buf(),
                attempts: exhausted.attempts,
                source: exhausted.last,
            }
        })
    }

    pub fn path(&self) -> &Path {
        self.paths.file()
    }

    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    /// Whether the handle still holds its lock.
    pub fn is_open(&self) -> bool {
        self.lock.is_some()
    }

    /// Whether there are unflushed changes.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn root(&self) -> &Group {
        &self.root
    }

    /// Mutable access to the tree. Marks the store modified.
    ///
    /// # Errors
    ///
    /// `StoreError::ReadOnly` for handles opened with [`OpenMode::Read`].
    pub fn root_mut(&mut self) -> Result<&mut Group, StoreError> {
        if !self.mode.is_writable() {
            return Err(StoreError::ReadOnly(self.path().to_path_buf()));
        }
        self.dirty = true;
        Ok(&mut self.root)
    }

    pub fn node(&self, path: &GroupPath) -> Option<&Node> {
        self.root.node(path)
    }

    pub fn group(&self, path: &GroupPath) -> Option<&Group> {
        self.root.group(path)
    }

    /// Write the tree to disk if it changed.
    pub fn flush(&mut self) -> Result<(), StoreError> {
        if !self.dirty || !self.mode.is_writable() {
            return Ok(());
        }

        let bytes = format::encode(&self.root)?;
        let temp = self.paths.temp_path();
        let flush_err = |source| StoreError::Flush {
            path: self.paths.file().to_path_buf(),
            source,
        };

        let write = || -> io::Result<()> {
            let mut out = fs::File::create(&temp)?;
            out.write_all(&bytes)?;
            out.sync_all()?;
            fs::rename(&temp, self.paths.file())
        };
        if let Err(e) = write() {
            let _ = fs::remove_file(&temp);
            return Err(flush_err(e));
        }

        self.dirty = false;
        Ok(())
    }

    /// Flush and release. The lock is released even if the flush fails.
    pub fn close(mut self) -> Result<(), StoreError> {
        self.finish()
    }

    fn finish(&mut self) -> Result<(), StoreError> {
        let Some(mut lock) = self.lock.take() else {
            return Ok(());
        };
        let flushed = self.flush_while_locked();
        let released = lock.release();
        flushed?;
        released?;
        Ok(())
    }

    fn flush_while_locked(&mut self) -> Result<(), StoreError> {
        let result = self.flush();
        // Whatever happened, nothing more goes to disk from this handle.
        self.dirty = false;
        result
    }
}

impl Drop for StoreHandle {
    fn drop(&mut self) {
        let _ = self.finish();
    }
}

/// Run `f` against a store and release it on every exit path.
///
/// An error from `f` wins over an error from closing.
pub fn with_store<T, E>(
    file: impl AsRef<Path>,
    mode: OpenMode,
    policy: RetryPolicy,
    f: impl FnOnce(&mut StoreHandle) -> Result<T, E>,
) -> Result<T, E>
where
    E: From<StoreError>,
{
    let mut handle = StoreHandle::acquire(file, mode, policy)?;
    let result = f(&mut handle);
    let closed = handle.close();
    let value = result?;
    closed?;
    Ok(value)
}
