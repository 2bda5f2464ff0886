//! core
//!
//! Core domain types, configuration, and cross-process locking.
//!
//! # Modules
//!
//! - [`types`] - Strong types: NodeName, GroupPath, Location
//! - [`config`] - Configuration schema and loading
//! - [`ops`] - Sidecar locking
//! - [`paths`] - Centralized path routing for store files
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid names and paths from reaching the store
//! - Schemas are strict and self-describing

pub mod config;
pub mod ops;
pub mod paths;
pub mod types;
