//! core::paths
//!
//! Centralized path routing for the files that make up a store.
//!
//! # Storage Layout
//!
//! A store at `<file>` owns:
//! - `<file>` - The store document itself
//! - `<file>.lock` - Sidecar lock file holding the OS-level lock
//! - `<file>.<uuid>.tmp` - Transient file used for atomic replacement
//!
//! The lock lives beside the store rather than on it because the store
//! file is replaced by rename on every flush; a lock taken on the old
//! inode would not be seen by the next opener.
//!
//! # Example
//!
//! ```
//! use resultstore::core::paths::StorePaths;
//! use std::path::PathBuf;
//!
//! let paths = StorePaths::new("/data/out.json");
//! assert_eq!(paths.lock_path(), PathBuf::from("/data/out.json.lock"));
//! ```

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use uuid::Uuid;

/// Path routing for a single store file.
///
/// No code outside this module should compute sidecar names by hand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorePaths {
    file: PathBuf,
}

impl StorePaths {
    /// Create routing for the store at `file`.
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self { file: file.into() }
    }

    /// The store document.
    pub fn file(&self) -> &Path {
        &self.file
    }

    /// Sidecar lock file.
    pub fn lock_path(&self) -> PathBuf {
        self.with_suffix(".lock")
    }

    /// A fresh temp path in the same directory, unique per call so two
    /// processes never share one.
    pub fn temp_path(&self) -> PathBuf {
        self.with_suffix(&format!(".{}.tmp", Uuid::new_v4()))
    }

    /// Directory holding the store, created on demand by writers.
    pub fn parent_dir(&self) -> Option<&Path> {
        self.file.parent().filter(|p| !p.as_os_str().is_empty())
    }

    fn with_suffix(&self, suffix: &str) -> PathBuf {
        let mut name: OsString = self.file.as_os_str().to_owned();
        name.push(suffix);
        PathBuf::from(name)
    }
}
