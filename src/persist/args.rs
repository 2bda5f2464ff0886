//! persist::args
//!
//! The parsed-arguments record stamped onto result groups.

use std::str::FromStr;

use thiserror::Error;

use crate::store::node::AttrValue;
use crate::store::value::Scalar;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArgsError {
    #[error("expected name=value, got '{0}'")]
    MissingEquals(String),

    #[error("argument name cannot be empty in '{0}'")]
    EmptyName(String),
}

/// Argument names mapped to optional values, in insertion order.
///
/// `None` marks an argument that was not given; it is never recorded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArgsRecord {
    entries: Vec<(String, Option<AttrValue>)>,
}

impl ArgsRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `name`, replacing an earlier value in place.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> &mut Self {
        self.put(name.into(), Some(value.into()))
    }

    /// Record `name` as not given.
    pub fn unset(&mut self, name: impl Into<String>) -> &mut Self {
        self.put(name.into(), None)
    }

    fn put(&mut self, name: String, value: Option<AttrValue>) -> &mut Self {
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, v)| v.as_ref())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&AttrValue>)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_ref()))
    }

    /// Entries that carry a value.
    pub fn present(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.entries
            .iter()
            .filter_map(|(n, v)| v.as_ref().map(|v| (n.as_str(), v)))
    }

    /// Parse a command-line `name=value` pair and add it.
    ///
    /// The value is typed as an integer, float, or bool when it reads as one
    /// and kept as a string otherwise. An empty value records `name` as not
    /// given.
    pub fn parse_pair(&mut self, pair: &str) -> Result<&mut Self, ArgsError> {
        let (name, raw) = pair
            .split_once('=')
            .ok_or_else(|| ArgsError::MissingEquals(pair.to_string()))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(ArgsError::EmptyName(pair.to_string()));
        }

        if raw.is_empty() {
            Ok(self.unset(name))
        } else {
            Ok(self.set(name, infer_scalar(raw)))
        }
    }
}

impl<K, V> FromIterator<(K, Option<V>)> for ArgsRecord
where
    K: Into<String>,
    V: Into<AttrValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, Option<V>)>>(iter: I) -> Self {
        let mut record = ArgsRecord::new();
        for (k, v) in iter {
            record.put(k.into(), v.map(Into::into));
        }
        record
    }
}

fn infer_scalar(raw: &str) -> Scalar {
    if let Ok(i) = i64::from_str(raw) {
        return Scalar::Int(i);
    }
    if let Ok(f) = f64::from_str(raw) {
        return Scalar::Float(f);
    }
    match raw {
        "true" => Scalar::Bool(true),
        "false" => Scalar::Bool(false),
        _ => Scalar::Str(raw.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_insertion_order_and_replaces_in_place() {
        let mut args = ArgsRecord::new();
        args.set("b", 1).set("a", 2).set("b", 3);

        let names: Vec<_> = args.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(args.get("b"), Some(&AttrValue::from(3)));
    }

    #[test]
    fn unset_hides_value() {
        let mut args = ArgsRecord::new();
        args.set("x", 1).unset("x");
        assert_eq!(args.len(), 1);
        assert!(args.get("x").is_none());
        assert_eq!(args.present().count(), 0);
    }

    #[test]
    fn parse_pair_types_values() {
        let mut args = ArgsRecord::new();
        for pair in ["n=4", "alpha=0.5", "flag=true", "label=run one", "beta="] {
            args.parse_pair(pair).unwrap();
        }
        assert_eq!(args.get("n"), Some(&AttrValue::from(4)));
        assert_eq!(args.get("alpha"), Some(&AttrValue::from(0.5)));
        assert_eq!(args.get("flag"), Some(&AttrValue::from(true)));
        assert_eq!(args.get("label"), Some(&AttrValue::from("run one")));
        assert!(args.get("beta").is_none());
        assert_eq!(args.len(), 5);
    }

    #[test]
    fn parse_pair_splits_on_first_equals() {
        let mut args = ArgsRecord::new();
        args.parse_pair("expr=a=b").unwrap();
        assert_eq!(args.get("expr"), Some(&AttrValue::from("a=b")));
    }

    #[test]
    fn parse_pair_errors() {
        let mut args = ArgsRecord::new();
        assert_eq!(
            args.parse_pair("novalue").unwrap_err(),
            ArgsError::MissingEquals("novalue".to_string())
        );
        assert!(matches!(
            args.parse_pair("=1"),
            Err(ArgsError::EmptyName(_))
        ));
    }

    #[test]
    fn collects_from_pairs() {
        let args: ArgsRecord = vec![("alpha", Some(0.5)), ("beta", None)]
            .into_iter()
            .collect();
        assert_eq!(args.len(), 2);
        assert_eq!(args.present().count(), 1);
    }
}
