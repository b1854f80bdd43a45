//! Result elements and evaluation types

use std::fmt;

use crate::value::{Data, Value};

/// One element produced by a result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    /// Element of a list, set or single-value result
    Item(Value),
    /// Group of a grouping result
    Pair(Value, Data),
}

/// Container type a result materializes into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EvalType {
    Value,
    List,
    Set,
    Map,
}

impl EvalType {
    pub fn of(data: &Data) -> Self {
        match data {
            Data::Value(_) => EvalType::Value,
            Data::List(_) => EvalType::List,
            Data::Set(_) => EvalType::Set,
            Data::Map(_) => EvalType::Map,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EvalType::Value => "value",
            EvalType::List => "list",
            EvalType::Set => "set",
            EvalType::Map => "map",
        }
    }

    /// True for container types whose elements can be iterated
    pub fn is_collection(&self) -> bool {
        matches!(self, EvalType::List | EvalType::Set)
    }
}

impl fmt::Display for EvalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Splits materialized data into entries
pub(crate) fn entries_of(data: Data) -> Vec<Entry> {
    match data {
        Data::Value(v) => vec![Entry::Item(v)],
        Data::List(items) => items.into_iter().map(Entry::Item).collect(),
        Data::Set(items) => items.into_iter().map(Entry::Item).collect(),
        Data::Map(groups) => groups
            .into_iter()
            .map(|(k, v)| Entry::Pair(k, v))
            .collect(),
    }
}
