//! Selection literal

use std::fmt;

use crate::query::{QueryError, QueryResult};

/// A nested container literal describing the result shape.
///
/// Mirrors how a selection reads when written out by hand:
///
/// | Literal           | Meaning                                  |
/// |-------------------|------------------------------------------|
/// | `"A"`             | list of values of field A                |
/// | `("A", "B")`      | list of (A, B) tuples                    |
/// | `{"A"}`           | set of values of field A                 |
/// | `[{"A", "B"}]`    | list of {A, B} sets                      |
/// | `{"A": "C"}`      | grouping of C values by A                |
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Field(String),
    Tuple(Vec<String>),
    List(Vec<Selection>),
    Set(Vec<Selection>),
    Map(Vec<(Selection, Selection)>),
}

impl Selection {
    pub fn field(name: impl Into<String>) -> Self {
        Selection::Field(name.into())
    }

    pub fn tuple<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Selection::Tuple(names.into_iter().map(Into::into).collect())
    }

    pub fn list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Selection>,
    {
        Selection::List(items.into_iter().map(Into::into).collect())
    }

    pub fn set<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Selection>,
    {
        Selection::Set(items.into_iter().map(Into::into).collect())
    }

    /// Mapping literal with any number of pairs.
    ///
    /// Only single-pair mappings resolve; others are rejected when the
    /// query is built.
    pub fn map<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Selection>,
        V: Into<Selection>,
    {
        Selection::Map(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Single-pair grouping `{key: value}`
    pub fn group(key: impl Into<Selection>, value: impl Into<Selection>) -> Self {
        Selection::Map(vec![(key.into(), value.into())])
    }

    /// Parses the JSON request form of a selection.
    ///
    /// A string is a field, an array is a list, and the objects
    /// `{"tuple": [...]}`, `{"set": [...]}`, `{"list": [...]}` and
    /// `{"map": [key, value]}` select the other literals.
    pub fn from_json(json: &serde_json::Value) -> QueryResult<Self> {
        use serde_json::Value as Json;

        match json {
            Json::String(name) => Ok(Selection::Field(name.clone())),
            Json::Array(items) => Ok(Selection::List(parse_items(items)?)),
            Json::Object(obj) if obj.len() == 1 => {
                let (kind, inner) = obj
                    .iter()
                    .next()
                    .ok_or_else(|| QueryError::template_syntax("empty selection object"))?;
                let items = inner.as_array().ok_or_else(|| {
                    QueryError::template_syntax(format!("{:?} expects an array", kind))
                })?;
                match kind.as_str() {
                    "tuple" => items
                        .iter()
                        .map(|item| {
                            item.as_str().map(str::to_string).ok_or_else(|| {
                                QueryError::template_syntax("tuple members must be field names")
                            })
                        })
                        .collect::<QueryResult<Vec<_>>>()
                        .map(Selection::Tuple),
                    "list" => Ok(Selection::List(parse_items(items)?)),
                    "set" => Ok(Selection::Set(parse_items(items)?)),
                    "map" => match items.as_slice() {
                        [key, value] => Ok(Selection::group(
                            Selection::from_json(key)?,
                            Selection::from_json(value)?,
                        )),
                        _ => Err(QueryError::template_syntax(
                            "map expects exactly [key, value]",
                        )),
                    },
                    other => Err(QueryError::template_syntax(format!(
                        "unknown selection form {:?}",
                        other
                    ))),
                }
            }
            other => Err(QueryError::template_syntax(format!(
                "unsupported selection {}",
                other
            ))),
        }
    }
}

fn parse_items(items: &[serde_json::Value]) -> QueryResult<Vec<Selection>> {
    items.iter().map(Selection::from_json).collect()
}

impl From<&str> for Selection {
    fn from(name: &str) -> Self {
        Selection::Field(name.to_string())
    }
}

impl From<String> for Selection {
    fn from(name: String) -> Self {
        Selection::Field(name)
    }
}

impl From<&Selection> for Selection {
    fn from(sel: &Selection) -> Self {
        sel.clone()
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::Field(name) => write!(f, "{:?}", name),
            Selection::Tuple(names) => {
                write!(f, "(")?;
                for (i, name) in names.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{:?}", name)?;
                }
                if names.len() == 1 {
                    write!(f, ",")?;
                }
                write!(f, ")")
            }
            Selection::List(items) => {
                write!(f, "[")?;
                write_selections(f, items)?;
                write!(f, "]")
            }
            Selection::Set(items) => {
                write!(f, "{{")?;
                write_selections(f, items)?;
                write!(f, "}}")
            }
            Selection::Map(pairs) => {
                write!(f, "{{")?;
                for (i, (key, value)) in pairs.iter().enumerate() {
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

fn write_selections(f: &mut fmt::Formatter<'_>, items: &[Selection]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}
