//! core::ops
//!
//! Cross-process coordination for store access.
//!
//! # Modules
//!
//! - [`lock`] - Sidecar advisory lock (shared for readers, exclusive for writers)
//!
//! # Architecture
//!
//! Every store open:
//! 1. Acquires the sidecar lock without blocking
//! 2. Reads and verifies the store document
//! 3. Holds the lock until the handle is closed or dropped
//!
//! There is no waiting on the lock itself. Contention is resolved by the
//! retry loop in [`crate::store::retry`].

pub mod lock;

pub use lock::{LockError, LockKind, StoreLock};
