//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`NodeName`] - Validated name of a single child in a group
//! - [`GroupPath`] - Normalized absolute path inside a store
//! - [`Location`] - `<filepath>[:<internal-path>]` command-line target
//!
//! # Validation
//!
//! These types enforce validity at construction time. Invalid values
//! cannot be represented, so the store never sees an empty or slashed
//! child name.
//!
//! # Examples
//!
//! ```
//! use resultstore::core::types::{GroupPath, Location, NodeName, PathRequirement};
//!
//! let name = NodeName::new("energy").unwrap();
//! let path = GroupPath::parse("/results/run1").unwrap();
//! assert_eq!(path.join(&name).as_str(), "/results/run1/energy");
//!
//! let loc = Location::parse("out.json", PathRequirement::Optional).unwrap();
//! assert!(loc.group.is_root());
//!
//! assert!(NodeName::new("a/b").is_err());
//! assert!(Location::parse("a:b:c", PathRequirement::Optional).is_err());
//! ```

use std::borrow::Borrow;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid node name: {0}")]
    InvalidNodeName(String),

    #[error("invalid group path: {0}")]
    InvalidGroupPath(String),

    /// The location argument has an unexpected number of colons.
    #[error("malformed location '{location}': {reason}")]
    MalformedLocation { location: String, reason: String },
}

/// Name of the reserved subgroup holding the debug side-channel.
pub const DEBUG_GROUP: &str = "debug";

/// A validated child name.
///
/// Names must be:
/// - Non-empty
/// - Free of `/` (the path separator)
/// - Not `.` or `..`
/// - Free of ASCII control characters
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NodeName(String);

impl NodeName {
    /// Create a new validated node name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidNodeName` if the name is empty, contains
    /// a slash or a control character, or is `.`/`..`.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(Self(name))
    }

    fn validate(name: &str) -> Result<(), TypeError> {
        if name.is_empty() {
            return Err(TypeError::InvalidNodeName("name cannot be empty".into()));
        }
        if name == "." || name == ".." {
            return Err(TypeError::InvalidNodeName(format!(
                "'{}' is not a valid name",
                name
            )));
        }
        if name.contains('/') {
            return Err(TypeError::InvalidNodeName(format!(
                "'{}' cannot contain '/'",
                name
            )));
        }
        if name.chars().any(|c| c.is_ascii_control()) {
            return Err(TypeError::InvalidNodeName(format!(
                "'{}' cannot contain control characters",
                name.escape_debug()
            )));
        }
        Ok(())
    }

    /// Get the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is the reserved debug subgroup name.
    pub fn is_debug(&self) -> bool {
        self.0 == DEBUG_GROUP
    }
}

impl TryFrom<String> for NodeName {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<NodeName> for String {
    fn from(name: NodeName) -> Self {
        name.0
    }
}

impl Borrow<str> for NodeName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for NodeName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A normalized absolute path to a node inside a store.
///
/// Stored as its components; renders with a leading `/` and no trailing
/// slash. The root is `/`. Leading slashes are optional on input, so
/// `results/run1` and `/results/run1/` parse to the same path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct GroupPath {
    components: Vec<NodeName>,
}

impl GroupPath {
    /// The store root, `/`.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse and normalize a path.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidGroupPath` if the path contains empty
    /// interior components (`a//b`) or an invalid component name.
    pub fn parse(path: &str) -> Result<Self, TypeError> {
        let trimmed = path.trim_start_matches('/').trim_end_matches('/');
        if trimmed.is_empty() {
            return Ok(Self::root());
        }

        let mut components = Vec::new();
        for part in trimmed.split('/') {
            let name = NodeName::new(part).map_err(|e| {
                TypeError::InvalidGroupPath(format!("'{}': {}", path, e))
            })?;
            components.push(name);
        }
        Ok(Self { components })
    }

    /// Whether this is the root path.
    pub fn is_root(&self) -> bool {
        self.components.is_empty()
    }

    /// Path components from the root down.
    pub fn components(&self) -> &[NodeName] {
        &self.components
    }

    /// The final component, if any.
    pub fn name(&self) -> Option<&NodeName> {
        self.components.last()
    }

    /// Append a child name.
    pub fn join(&self, name: &NodeName) -> Self {
        let mut components = self.components.clone();
        components.push(name.clone());
        Self { components }
    }

    /// Render the path.
    pub fn as_str(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for GroupPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.components.is_empty() {
            return write!(f, "/");
        }
        for c in &self.components {
            write!(f, "/{}", c)?;
        }
        Ok(())
    }
}

impl std::str::FromStr for GroupPath {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Whether a location must carry an internal path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathRequirement {
    /// Missing internal path defaults to the root group.
    Optional,
    /// The location must contain exactly one colon.
    Required,
}

/// A store file plus a path inside it.
///
/// Written on the command line as `<filepath>[:<internal-path>]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// Path to the store file.
    pub file: PathBuf,
    /// Group path inside the store.
    pub group: GroupPath,
}

impl Location {
    /// Create a location from its parts.
    pub fn new(file: impl Into<PathBuf>, group: GroupPath) -> Self {
        Self {
            file: file.into(),
            group,
        }
    }

    /// Parse a `<filepath>[:<internal-path>]` argument.
    ///
    /// # Errors
    ///
    /// - `TypeError::MalformedLocation` for more than one colon, for a
    ///   missing colon when the path is required, or for an empty file part
    /// - `TypeError::InvalidGroupPath` if the internal path is invalid
    pub fn parse(arg: &str, requirement: PathRequirement) -> Result<Self, TypeError> {
        let malformed = |reason: &str| TypeError::MalformedLocation {
            location: arg.to_string(),
            reason: reason.to_string(),
        };

        let parts: Vec<&str> = arg.split(':').collect();
        let (file, group) = match (parts.as_slice(), requirement) {
            ([file, path], _) => (*file, GroupPath::parse(path)?),
            ([file], PathRequirement::Optional) => (*file, GroupPath::root()),
            ([_], PathRequirement::Required) => {
                return Err(malformed("must contain one colon"));
            }
            (_, PathRequirement::Optional) => {
                return Err(malformed("must contain at most one colon"));
            }
            (_, PathRequirement::Required) => {
                return Err(malformed("must contain one colon"));
            }
        };

        if file.is_empty() {
            return Err(malformed("file path cannot be empty"));
        }

        Ok(Self::new(file, group))
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file.display(), self.group)
    }
}
