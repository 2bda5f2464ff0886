//! store::value
//!
//! The values a computation hands over for persistence, and how each kind
//! materializes under a group.
//!
//! # Variants
//!
//! - [`Scalar`] - a single int, float, bool, or string; becomes a scalar dataset
//! - [`NdArray`] - a row-major numeric array; becomes an array dataset
//! - [`Value::Mapping`] - named sub-values; becomes a subgroup with one child per key
//!
//! Dispatch goes through the [`Dump`] trait, one impl per variant, so adding
//! a kind means adding an impl rather than another branch of type checks.
//!
//! # Floats
//!
//! JSON has no spelling for NaN or infinities. Floats are written as
//! numbers when finite and as the strings `"NaN"`, `"Infinity"`,
//! `"-Infinity"` otherwise, so arrays holding missing data survive a
//! round trip through the store file.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::node::{Dataset, Group, Node};
use crate::core::types::NodeName;

/// Errors raised while materializing a value.
#[derive(Debug, Error, PartialEq)]
pub enum DumpError {
    /// A mapping key is not a usable child name.
    #[error("invalid name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    /// A mapping contains the same key twice.
    #[error("duplicate key '{key}' in mapping")]
    DuplicateKey { key: String },

    /// An array's shape does not describe its data.
    #[error("array shape {shape:?} holds {expected} elements but data has {actual}")]
    ShapeMismatch {
        shape: Vec<usize>,
        expected: usize,
        actual: usize,
    },

    /// The input cannot be represented in the store.
    #[error("unsupported value: {0}")]
    Unsupported(String),
}

/// Write `self` into `parent` under `name`, replacing any existing child.
pub trait Dump {
    fn dump(&self, parent: &mut Group, name: &NodeName) -> Result<(), DumpError>;
}

/// A single scalar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scalar {
    Int(i64),
    Float(#[serde(with = "float_repr")] f64),
    Bool(bool),
    Str(String),
}

impl Scalar {
    /// Short type label used in listings.
    pub fn kind(&self) -> &'static str {
        match self {
            Scalar::Int(_) => "int",
            Scalar::Float(_) => "float",
            Scalar::Bool(_) => "bool",
            Scalar::Str(_) => "str",
        }
    }

    /// The value as a float, if numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Int(i) => Some(*i as f64),
            Scalar::Float(f) => Some(*f),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Int(i) => write!(f, "{}", i),
            Scalar::Float(x) => write!(f, "{}", x),
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Str(s) => write!(f, "{}", s),
        }
    }
}

impl Dump for Scalar {
    fn dump(&self, parent: &mut Group, name: &NodeName) -> Result<(), DumpError> {
        parent.insert(name.clone(), Node::Dataset(Dataset::Scalar(self.clone())));
        Ok(())
    }
}

/// Element storage of an [`NdArray`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArrayData {
    Int(Vec<i64>),
    Float(#[serde(with = "float_repr::vec")] Vec<f64>),
}

impl ArrayData {
    pub fn len(&self) -> usize {
        match self {
            ArrayData::Int(v) => v.len(),
            ArrayData::Float(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ArrayData::Int(_) => "int",
            ArrayData::Float(_) => "float",
        }
    }
}

/// A row-major n-dimensional numeric array.
///
/// Fields are public so callers can assemble arrays from whatever buffers
/// they hold; [`NdArray::validate`] (run by every dump) checks that
/// `shape` actually describes `data`. An empty shape is a 0-d array with
/// exactly one element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NdArray {
    pub shape: Vec<usize>,
    pub data: ArrayData,
}

impl NdArray {
    /// A 1-D float array.
    pub fn from_vec(data: Vec<f64>) -> Self {
        Self {
            shape: vec![data.len()],
            data: ArrayData::Float(data),
        }
    }

    /// A 1-D int array.
    pub fn from_ints(data: Vec<i64>) -> Self {
        Self {
            shape: vec![data.len()],
            data: ArrayData::Int(data),
        }
    }

    /// An array of the given shape, checked.
    pub fn from_shape_vec(shape: Vec<usize>, data: ArrayData) -> Result<Self, DumpError> {
        let array = Self { shape, data };
        array.validate()?;
        Ok(array)
    }

    /// Number of elements `shape` describes, `None` if it overflows `usize`.
    pub fn size(&self) -> Option<usize> {
        self.shape.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d))
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Check that `shape` matches the element count.
    pub fn validate(&self) -> Result<(), DumpError> {
        let expected = self.size().ok_or_else(|| {
            DumpError::Unsupported(format!("array shape {:?} is too large", self.shape))
        })?;
        let actual = self.data.len();
        if expected != actual {
            return Err(DumpError::ShapeMismatch {
                shape: self.shape.clone(),
                expected,
                actual,
            });
        }
        Ok(())
    }
}

impl Dump for NdArray {
    fn dump(&self, parent: &mut Group, name: &NodeName) -> Result<(), DumpError> {
        self.validate()?;
        parent.insert(name.clone(), Node::Dataset(Dataset::Array(self.clone())));
        Ok(())
    }
}

/// Anything that can be persisted under a name.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Scalar(Scalar),
    Array(NdArray),
    /// Ordered name → value pairs, materialized as a subgroup.
    Mapping(Vec<(String, Value)>),
}

impl Value {
    /// Build a mapping from pairs.
    pub fn mapping<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Value::Mapping(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl Dump for Value {
    fn dump(&self, parent: &mut Group, name: &NodeName) -> Result<(), DumpError> {
        match self {
            Value::Scalar(s) => s.dump(parent, name),
            Value::Array(a) => a.dump(parent, name),
            Value::Mapping(entries) => dump_mapping(entries, parent, name),
        }
    }
}

/// Build the subgroup off to the side, then attach it, so a rejected entry
/// never leaves half a mapping behind.
fn dump_mapping(
    entries: &[(String, Value)],
    parent: &mut Group,
    name: &NodeName,
) -> Result<(), DumpError> {
    let mut group = Group::new();
    let mut seen = BTreeSet::new();

    for (key, value) in entries {
        let child = NodeName::new(key.as_str()).map_err(|e| DumpError::InvalidName {
            name: key.clone(),
            reason: e.to_string(),
        })?;
        if !seen.insert(key.as_str()) {
            return Err(DumpError::DuplicateKey { key: key.clone() });
        }
        value.dump(&mut group, &child)?;
    }

    parent.insert(name.clone(), Node::Group(group));
    Ok(())
}

impl From<Scalar> for Value {
    fn from(s: Scalar) -> Self {
        Value::Scalar(s)
    }
}

impl From<NdArray> for Value {
    fn from(a: NdArray) -> Self {
        Value::Array(a)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Scalar(Scalar::Float(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Scalar(Scalar::Int(v))
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Scalar(Scalar::Int(i64::from(v)))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Scalar(Scalar::Bool(v))
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Scalar(Scalar::Str(v.to_string()))
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Scalar(Scalar::Str(v))
    }
}

impl From<Vec<f64>> for Value {
    fn from(v: Vec<f64>) -> Self {
        Value::Array(NdArray::from_vec(v))
    }
}

impl From<Vec<i64>> for Value {
    fn from(v: Vec<i64>) -> Self {
        Value::Array(NdArray::from_ints(v))
    }
}

impl TryFrom<&serde_json::Value> for Value {
    type Error = DumpError;

    /// Interpret JSON: numbers and bools and strings become scalars,
    /// (nested, rectangular) numeric arrays become arrays, objects become
    /// mappings. `null` and mixed or ragged arrays are rejected.
    fn try_from(json: &serde_json::Value) -> Result<Self, Self::Error> {
        use serde_json::Value as J;

        match json {
            J::Null => Err(DumpError::Unsupported("null".to_string())),
            J::Bool(b) => Ok(Value::from(*b)),
            J::String(s) => Ok(Value::from(s.as_str())),
            J::Number(n) => Ok(match n.as_i64() {
                Some(i) => Value::from(i),
                None => Value::from(n.as_f64().unwrap_or(f64::NAN)),
            }),
            J::Array(_) => json_array(json).map(Value::Array),
            J::Object(map) => map
                .iter()
                .map(|(k, v)| Ok((k.clone(), Value::try_from(v)?)))
                .collect::<Result<Vec<_>, DumpError>>()
                .map(Value::Mapping),
        }
    }
}

fn json_array(json: &serde_json::Value) -> Result<NdArray, DumpError> {
    let mut shape = Vec::new();
    let mut cursor = json;
    while let serde_json::Value::Array(items) = cursor {
        shape.push(items.len());
        match items.first() {
            Some(first) => cursor = first,
            None => break,
        }
    }

    let mut numbers = Vec::new();
    collect_numbers(json, &shape, &mut numbers)?;

    let data = if numbers.iter().all(|n| n.is_i64()) {
        ArrayData::Int(numbers.iter().filter_map(|n| n.as_i64()).collect())
    } else {
        ArrayData::Float(numbers.iter().filter_map(|n| n.as_f64()).collect())
    };
    NdArray::from_shape_vec(shape, data)
}

fn collect_numbers(
    json: &serde_json::Value,
    shape: &[usize],
    out: &mut Vec<serde_json::Number>,
) -> Result<(), DumpError> {
    match (json, shape.split_first()) {
        (serde_json::Value::Array(items), Some((len, rest))) => {
            if items.len() != *len {
                return Err(DumpError::Unsupported("ragged array".to_string()));
            }
            for item in items {
                collect_numbers(item, rest, out)?;
            }
            Ok(())
        }
        (serde_json::Value::Number(n), None) => {
            out.push(n.clone());
            Ok(())
        }
        _ => Err(DumpError::Unsupported(
            "arrays must be rectangular and numeric".to_string(),
        )),
    }
}

/// Serde adapter for floats that keeps non-finite values.
pub(crate) mod float_repr {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Num(f64),
        Text(String),
    }

    fn to_repr(v: f64) -> Repr {
        if v.is_finite() {
            Repr::Num(v)
        } else if v.is_nan() {
            Repr::Text("NaN".to_string())
        } else if v > 0.0 {
            Repr::Text("Infinity".to_string())
        } else {
            Repr::Text("-Infinity".to_string())
        }
    }

    fn from_repr<E: serde::de::Error>(repr: Repr) -> Result<f64, E> {
        match repr {
            Repr::Num(v) => Ok(v),
            Repr::Text(s) => match s.as_str() {
                "NaN" => Ok(f64::NAN),
                "Infinity" => Ok(f64::INFINITY),
                "-Infinity" => Ok(f64::NEG_INFINITY),
                other => Err(E::custom(format!("invalid float '{}'", other))),
            },
        }
    }

    pub fn serialize<S: Serializer>(v: &f64, s: S) -> Result<S::Ok, S::Error> {
        to_repr(*v).serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        from_repr(Repr::deserialize(d)?)
    }

    pub mod vec {
        use super::*;

        pub fn serialize<S: Serializer>(v: &[f64], s: S) -> Result<S::Ok, S::Error> {
            s.collect_seq(v.iter().map(|x| to_repr(*x)))
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<f64>, D::Error> {
            Vec::<Repr>::deserialize(d)?
                .into_iter()
                .map(from_repr::<D::Error>)
                .collect()
        }
    }
}
