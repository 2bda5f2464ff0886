//! store::node
//!
//! The in-memory tree of a store: groups holding named children and
//! attributes, and datasets at the leaves.
//!
//! Children are kept sorted by name. Names are unique per group by
//! construction, since inserting an existing name replaces that child.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::value::{NdArray, Scalar};
use crate::core::types::{GroupPath, NodeName};

/// Errors resolving a path in the tree.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    /// A dataset sits where a group is needed.
    #[error("'{path}' is a dataset, not a group")]
    NotAGroup { path: String },
}

/// A small metadata value attached to a group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Scalar(Scalar),
    List(Vec<Scalar>),
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Scalar(s) => write!(f, "{}", s),
            AttrValue::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<Scalar> for AttrValue {
    fn from(s: Scalar) -> Self {
        AttrValue::Scalar(s)
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        AttrValue::Scalar(Scalar::Float(v))
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        AttrValue::Scalar(Scalar::Int(v))
    }
}

impl From<i32> for AttrValue {
    fn from(v: i32) -> Self {
        AttrValue::Scalar(Scalar::Int(i64::from(v)))
    }
}

impl From<bool> for AttrValue {
    fn from(v: bool) -> Self {
        AttrValue::Scalar(Scalar::Bool(v))
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        AttrValue::Scalar(Scalar::Str(v.to_string()))
    }
}

impl From<String> for AttrValue {
    fn from(v: String) -> Self {
        AttrValue::Scalar(Scalar::Str(v))
    }
}

impl From<Vec<Scalar>> for AttrValue {
    fn from(v: Vec<Scalar>) -> Self {
        AttrValue::List(v)
    }
}

/// Leaf data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dataset {
    Scalar(Scalar),
    Array(NdArray),
}

impl Dataset {
    /// One-line description for listings, e.g. `float [3, 3]`.
    pub fn describe(&self) -> String {
        match self {
            Dataset::Scalar(s) => format!("{} = {}", s.kind(), s),
            Dataset::Array(a) => format!("{} {:?}", a.data.kind(), a.shape),
        }
    }
}

/// A child of a group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Node {
    Group(Group),
    Dataset(Dataset),
}

impl Node {
    pub fn as_group(&self) -> Option<&Group> {
        match self {
            Node::Group(g) => Some(g),
            Node::Dataset(_) => None,
        }
    }

    pub fn as_dataset(&self) -> Option<&Dataset> {
        match self {
            Node::Dataset(d) => Some(d),
            Node::Group(_) => None,
        }
    }

    /// Whether the node holds anything: a group with children, or any dataset.
    pub fn has_content(&self) -> bool {
        match self {
            Node::Group(g) => !g.is_empty(),
            Node::Dataset(_) => true,
        }
    }
}

/// A named node owning children and attributes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Group {
    attrs: BTreeMap<String, AttrValue>,
    children: BTreeMap<NodeName, Node>,
}

impl Group {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Attributes
    // =========================================================================

    pub fn attr(&self, name: &str) -> Option<&AttrValue> {
        self.attrs.get(name)
    }

    /// Set an attribute, replacing any previous value.
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<AttrValue>) {
        self.attrs.insert(name.into(), value.into());
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<AttrValue> {
        self.attrs.remove(name)
    }

    pub fn attrs(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.attrs.iter().map(|(k, v)| (k.as_str(), v))
    }

    // =========================================================================
    // Children
    // =========================================================================

    /// Number of children.
    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.children.contains_key(name)
    }

    pub fn child(&self, name: &str) -> Option<&Node> {
        self.children.get(name)
    }

    pub fn child_names(&self) -> Vec<&str> {
        self.children.keys().map(NodeName::as_str).collect()
    }

    pub fn children(&self) -> impl Iterator<Item = (&NodeName, &Node)> {
        self.children.iter()
    }

    pub fn subgroup(&self, name: &str) -> Option<&Group> {
        self.child(name).and_then(Node::as_group)
    }

    pub fn dataset(&self, name: &str) -> Option<&Dataset> {
        self.child(name).and_then(Node::as_dataset)
    }

    /// Insert a child, returning the node it replaced.
    pub fn insert(&mut self, name: NodeName, node: Node) -> Option<Node> {
        self.children.insert(name, node)
    }

    pub fn remove(&mut self, name: &NodeName) -> Option<Node> {
        self.children.remove(name)
    }

    /// Delete every child. Attributes are kept.
    pub fn clear_children(&mut self) {
        self.children.clear();
    }

    // =========================================================================
    // Path traversal
    // =========================================================================

    /// The node at `path`, relative to this group. The empty path is `None`
    /// because a group is not its own child.
    pub fn node(&self, path: &GroupPath) -> Option<&Node> {
        let (last, parents) = path.components().split_last()?;
        let mut group = self;
        for c in parents {
            group = group.children.get(c)?.as_group()?;
        }
        group.children.get(last)
    }

    /// The group at `path`; the empty path is this group.
    pub fn group(&self, path: &GroupPath) -> Option<&Group> {
        if path.is_root() {
            return Some(self);
        }
        self.node(path).and_then(Node::as_group)
    }

    pub fn group_mut(&mut self, path: &GroupPath) -> Option<&mut Group> {
        let mut group = self;
        for c in path.components() {
            group = match group.children.get_mut(c)? {
                Node::Group(g) => g,
                Node::Dataset(_) => return None,
            };
        }
        Some(group)
    }

    /// The group at `path`, creating it and any missing parents.
    ///
    /// # Errors
    ///
    /// `PathError::NotAGroup` if a dataset occupies `path` or one of its
    /// parents.
    pub fn require_group(&mut self, path: &GroupPath) -> Result<&mut Group, PathError> {
        let mut group = self;
        let mut walked = GroupPath::root();
        for c in path.components() {
            walked = walked.join(c);
            let node = group
                .children
                .entry(c.clone())
                .or_insert_with(|| Node::Group(Group::new()));
            group = match node {
                Node::Group(g) => g,
                Node::Dataset(_) => {
                    return Err(PathError::NotAGroup {
                        path: walked.to_string(),
                    })
                }
            };
        }
        Ok(group)
    }
}
