//! Materialized query data

use std::collections::HashSet;
use std::fmt;

use indexmap::{IndexMap, IndexSet};
use serde::ser::{self, SerializeMap};
use serde::{Serialize, Serializer};

use super::value::Value;

/// A fully materialized, possibly nested container.
///
/// `Set` and `Map` compare equal regardless of order; iteration follows
/// first-seen order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Data {
    /// A single value (aggregate, reduction or unwrapped container)
    Value(Value),
    /// Ordered, possibly repeating elements
    List(Vec<Value>),
    /// Unique elements
    Set(IndexSet<Value>),
    /// Grouping: key to per-group data
    Map(IndexMap<Value, Data>),
}

impl Data {
    pub fn list<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Data::List(items.into_iter().map(Into::into).collect())
    }

    pub fn set<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Data::Set(items.into_iter().map(Into::into).collect())
    }

    pub fn map<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, Data)>,
        K: Into<Value>,
    {
        Data::Map(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn value(v: impl Into<Value>) -> Self {
        Data::Value(v.into())
    }

    /// Number of elements, `None` for a single value
    pub fn len(&self) -> Option<usize> {
        match self {
            Data::Value(_) => None,
            Data::List(items) => Some(items.len()),
            Data::Set(items) => Some(items.len()),
            Data::Map(groups) => Some(groups.len()),
        }
    }

    /// True for an empty container; a single value is never empty
    pub fn is_empty(&self) -> bool {
        self.len() == Some(0)
    }

    /// Looks up a group in a grouping map
    pub fn get(&self, key: &Value) -> Option<&Data> {
        match self {
            Data::Map(groups) => groups.get(key),
            _ => None,
        }
    }

    /// Elements of a list or set; a single value yields itself.
    ///
    /// Grouping maps yield their keys.
    pub fn into_values(self) -> Vec<Value> {
        match self {
            Data::Value(v) => vec![v],
            Data::List(items) => items,
            Data::Set(items) => items.into_iter().collect(),
            Data::Map(groups) => groups.into_keys().collect(),
        }
    }
}

impl From<Value> for Data {
    fn from(v: Value) -> Self {
        Data::Value(v)
    }
}

impl fmt::Display for Data {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Data::Value(v) => write!(f, "{}", v),
            Data::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Data::Set(items) => {
                if items.is_empty() {
                    return write!(f, "set()");
                }
                write!(f, "{{")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "}}")
            }
            Data::Map(groups) => {
                write!(f, "{{")?;
                for (i, (key, value)) in groups.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl Serialize for Data {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Data::Value(v) => v.serialize(serializer),
            Data::List(items) => serializer.collect_seq(items.iter()),
            Data::Set(items) => serializer.collect_seq(items.iter()),
            Data::Map(groups) => {
                // Distinct keys such as 1 and "1" can render to the same string
                let mut seen = HashSet::with_capacity(groups.len());
                let mut map = serializer.serialize_map(Some(groups.len()))?;
                for (key, value) in groups {
                    let name = key.to_key_string();
                    if !seen.insert(name.clone()) {
                        return Err(ser::Error::custom(format!(
                            "grouping key {} collides with another key as {:?}",
                            key, name
                        )));
                    }
                    map.serialize_entry(&name, value)?;
                }
                map.end()
            }
        }
    }
}
