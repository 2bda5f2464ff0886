//! Hierarchical result store.
//!
//! A store is one file holding a tree of groups. Groups carry attributes
//! and named children; leaves are scalar or array datasets.
//!
//! # Modules
//!
//! - [`value`] - Values handed over for persistence and the [`Dump`] trait
//! - [`node`] - The in-memory tree
//! - [`format`] - On-disk encoding with checksum verification
//! - [`retry`] - Bounded, jittered retry
//! - [`handle`] - Locked, scoped access to a store file

pub mod format;
pub mod handle;
pub mod node;
pub mod retry;
pub mod value;

pub use handle::{with_store, OpenError, OpenMode, StoreError, StoreHandle};
pub use node::{AttrValue, Dataset, Group, Node, PathError};
pub use retry::{RetryPolicy, Sleeper, ThreadSleeper};
pub use value::{ArrayData, Dump, DumpError, NdArray, Scalar, Value};
