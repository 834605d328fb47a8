//! # Graph Object Identity
//!
//! Newtypes for the two identity-bearing fields of a graph object: the
//! `_class` taxonomy class list and the `_key` identifier.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The `_class` of a graph object: one taxonomy class name or an ordered
/// list of them.
///
/// Both JSON shapes (`"Service"` and `["Service", "Host"]`) deserialize into
/// this type, and serialization writes back the shape that was read.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClassNames {
    /// A single taxonomy class name.
    One(String),
    /// An ordered list of taxonomy class names.
    Many(Vec<String>),
}

impl ClassNames {
    /// The class names in declaration order.
    pub fn as_slice(&self) -> &[String] {
        match self {
            Self::One(name) => std::slice::from_ref(name),
            Self::Many(names) => names,
        }
    }

    /// Returns the number of class names.
    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    /// Returns true if no class name is declared.
    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }
}

impl From<&str> for ClassNames {
    fn from(name: &str) -> Self {
        Self::One(name.to_string())
    }
}

impl From<String> for ClassNames {
    fn from(name: String) -> Self {
        Self::One(name)
    }
}

impl From<Vec<String>> for ClassNames {
    fn from(names: Vec<String>) -> Self {
        Self::Many(names)
    }
}

impl From<Vec<&str>> for ClassNames {
    fn from(names: Vec<&str>) -> Self {
        Self::Many(names.into_iter().map(str::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for ClassNames {
    fn from(names: [&str; N]) -> Self {
        Self::Many(names.iter().map(|n| n.to_string()).collect())
    }
}

impl fmt::Display for ClassNames {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_slice().join(","))
    }
}

/// The `_key` of a graph object as it participates in uniqueness checks.
///
/// String keys and non-string keys are distinct even when their textual
/// forms coincide (`"1"` and `1` are different keys). Objects without a
/// `_key` all share the [`GraphObjectKey::Missing`] identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GraphObjectKey {
    /// The object has no `_key` property.
    Missing,
    /// A string `_key`.
    Text(String),
    /// A non-string `_key`, held as its compact JSON text.
    Other(String),
}

impl GraphObjectKey {
    /// Extract the `_key` identity of a graph object.
    pub fn of(object: &Value) -> Self {
        match object.get("_key") {
            None => Self::Missing,
            Some(Value::String(s)) => Self::Text(s.clone()),
            Some(other) => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for GraphObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => Ok(()),
            Self::Text(s) | Self::Other(s) => f.write_str(s),
        }
    }
}
