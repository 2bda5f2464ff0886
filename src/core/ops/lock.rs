//! core::ops::lock
//!
//! Advisory lock on a store's `<file>.lock` sidecar.
//!
//! Readers share the lock; writers hold it alone, from the moment the tree
//! is loaded until the replacement file has been renamed into place. A
//! conflicting holder is reported as [`LockError::Contended`] straight
//! away. Waiting is the retry loop's job ([`crate::store::retry`]), not
//! this module's.
//!
//! Dropping a [`StoreLock`] unlocks it, so a panicking holder never
//! wedges the store.
//!
//! ```ignore
//! let paths = StorePaths::new("out.json");
//! let mut lock = StoreLock::acquire(&paths, LockKind::Exclusive)?;
//! // load, mutate, flush
//! lock.release()?;
//! ```

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use thiserror::Error;

use crate::core::paths::StorePaths;

#[derive(Debug, Error)]
pub enum LockError {
    /// Someone else holds a conflicting lock.
    #[error("store is locked by another process")]
    Contended,

    #[error("cannot prepare lock file {}: {source}", .path.display())]
    Prepare {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot lock {}: {source}", .path.display())]
    Acquire {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot unlock {}: {source}", .path.display())]
    Release {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockKind {
    Shared,
    Exclusive,
}

/// A lock held on a store's sidecar. Unlocks on drop.
#[derive(Debug)]
pub struct StoreLock {
    path: PathBuf,
    kind: LockKind,
    held: Option<File>,
}

impl StoreLock {
    /// Take the lock without waiting.
    ///
    /// Writers also create the store's directory, since the store itself
    /// will be written there on flush.
    ///
    /// # Errors
    ///
    /// [`LockError::Contended`] when another holder conflicts; the other
    /// variants for I/O trouble with the sidecar.
    pub fn acquire(paths: &StorePaths, kind: LockKind) -> Result<Self, LockError> {
        let path = paths.lock_path();
        let prepare = |source| LockError::Prepare {
            path: path.clone(),
            source,
        };

        if let (LockKind::Exclusive, Some(dir)) = (kind, paths.parent_dir()) {
            fs::create_dir_all(dir).map_err(prepare)?;
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(prepare)?;

        let locked = match kind {
            LockKind::Shared => FileExt::try_lock_shared(&file),
            LockKind::Exclusive => FileExt::try_lock_exclusive(&file),
        };

        match locked {
            Ok(()) => Ok(Self {
                path,
                kind,
                held: Some(file),
            }),
            Err(e) if is_contention(&e) => Err(LockError::Contended),
            Err(source) => Err(LockError::Acquire { path, source }),
        }
    }

    pub fn is_held(&self) -> bool {
        self.held.is_some()
    }

    pub fn kind(&self) -> LockKind {
        self.kind
    }

    /// The sidecar file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Unlock now instead of at drop. Idempotent.
    pub fn release(&mut self) -> Result<(), LockError> {
        match self.held.take() {
            Some(file) => FileExt::unlock(&file).map_err(|source| LockError::Release {
                path: self.path.clone(),
                source,
            }),
            None => Ok(()),
        }
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        if let Some(file) = self.held.take() {
            let _ = FileExt::unlock(&file);
        }
    }
}

fn is_contention(e: &io::Error) -> bool {
    e.kind() == io::ErrorKind::WouldBlock
        || e.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> StorePaths {
        StorePaths::new(dir.path().join("out.json"))
    }

    #[test]
    fn exclusive_creates_sidecar() {
        let dir = TempDir::new().unwrap();
        let paths = store_in(&dir);

        let lock = StoreLock::acquire(&paths, LockKind::Exclusive).unwrap();
        assert!(lock.is_held());
        assert_eq!(lock.kind(), LockKind::Exclusive);
        assert_eq!(lock.path(), paths.lock_path());
        assert!(paths.lock_path().exists());
        assert!(!paths.file().exists(), "only the sidecar is created");
    }

    #[test]
    fn writer_creates_store_directory() {
        let dir = TempDir::new().unwrap();
        let paths = StorePaths::new(dir.path().join("runs/2024/out.json"));

        let _lock = StoreLock::acquire(&paths, LockKind::Exclusive).unwrap();
        assert!(dir.path().join("runs/2024").is_dir());
    }

    #[test]
    fn conflicts() {
        let dir = TempDir::new().unwrap();
        let paths = store_in(&dir);

        let writer = StoreLock::acquire(&paths, LockKind::Exclusive).unwrap();
        for kind in [LockKind::Exclusive, LockKind::Shared] {
            assert!(matches!(
                StoreLock::acquire(&paths, kind),
                Err(LockError::Contended)
            ));
        }
        drop(writer);

        let reader = StoreLock::acquire(&paths, LockKind::Shared).unwrap();
        let other_reader = StoreLock::acquire(&paths, LockKind::Shared).unwrap();
        assert!(reader.is_held() && other_reader.is_held());
        assert!(matches!(
            StoreLock::acquire(&paths, LockKind::Exclusive),
            Err(LockError::Contended)
        ));
    }

    #[test]
    fn release_is_idempotent_and_frees_the_store() {
        let dir = TempDir::new().unwrap();
        let paths = store_in(&dir);

        let mut lock = StoreLock::acquire(&paths, LockKind::Exclusive).unwrap();
        lock.release().unwrap();
        lock.release().unwrap();
        assert!(!lock.is_held());

        assert!(StoreLock::acquire(&paths, LockKind::Exclusive).is_ok());
    }

    #[test]
    fn shared_lock_needs_no_directory_creation() {
        let dir = TempDir::new().unwrap();
        let paths = StorePaths::new(dir.path().join("absent/out.json"));
        assert!(matches!(
            StoreLock::acquire(&paths, LockKind::Shared),
            Err(LockError::Prepare { .. })
        ));
    }
}
