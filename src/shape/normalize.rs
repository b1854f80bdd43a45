//! Selection normalization
//!
//! Turns a [`Selection`] literal into an explicit [`Shape`]:
//! an optional grouping key, an outer container kind and the shape of one
//! element. Only the literal is inspected; fieldnames are checked later by
//! the resolver.

use std::fmt;

use super::selection::Selection;
use crate::query::{QueryError, QueryResult};

/// Container returned around the elements
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OuterKind {
    List,
    Set,
}

/// Shape of one element built from one row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InnerKind {
    /// Bare value of a single field
    Scalar,
    /// Fixed-arity tuple of field values
    Tuple,
    /// Inner list of field values
    List,
    /// Inner set of field values
    Set,
}

/// Element recipe before fieldnames are resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub inner: InnerKind,
    pub fields: Vec<String>,
}

impl Element {
    fn scalar(name: &str) -> Self {
        Self {
            inner: InnerKind::Scalar,
            fields: vec![name.to_string()],
        }
    }
}

/// Normalized selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shape {
    /// Grouping key (scalar or tuple), present for mapping selections
    pub key: Option<Element>,
    pub outer: OuterKind,
    pub element: Element,
}

impl Shape {
    /// Parses `selection`, applying the disambiguation rule for single-item
    /// containers.
    pub fn normalize(selection: &Selection) -> QueryResult<Self> {
        match selection {
            Selection::Map(pairs) => {
                let (key, value) = match pairs.as_slice() {
                    [pair] => pair,
                    _ => {
                        return Err(QueryError::template_syntax(format!(
                            "mapping selection must hold exactly one pair, got {}",
                            pairs.len()
                        )))
                    }
                };
                let key = key_element(key)?;
                let (outer, element) = values(value)?;
                Ok(Shape {
                    key: Some(key),
                    outer,
                    element,
                })
            }
            other => {
                let (outer, element) = values(other)?;
                Ok(Shape {
                    key: None,
                    outer,
                    element,
                })
            }
        }
    }

    pub fn is_grouping(&self) -> bool {
        self.key.is_some()
    }

    /// Every referenced field: key fields first, then value fields
    pub fn fields(&self) -> Vec<&str> {
        self.key
            .iter()
            .chain(std::iter::once(&self.element))
            .flat_map(|e| e.fields.iter().map(String::as_str))
            .collect()
    }
}

/// Outer container and element of a non-mapping selection.
///
/// A container holding exactly one item is the outer container; with more
/// items it is an inner container inside the default outer list.
fn values(selection: &Selection) -> QueryResult<(OuterKind, Element)> {
    match selection {
        Selection::Field(_) | Selection::Tuple(_) => Ok((OuterKind::List, element(selection)?)),
        Selection::List(items) | Selection::Set(items) => {
            let kind = if matches!(selection, Selection::Set(_)) {
                OuterKind::Set
            } else {
                OuterKind::List
            };
            match items.as_slice() {
                [] => Err(QueryError::template_syntax(format!(
                    "empty container in selection {}",
                    selection
                ))),
                [item] => Ok((kind, element(item)?)),
                _ => Ok((OuterKind::List, inner_container(selection)?)),
            }
        }
        Selection::Map(_) => Err(QueryError::template_syntax(format!(
            "nested mapping {} is not supported",
            selection
        ))),
    }
}

fn element(selection: &Selection) -> QueryResult<Element> {
    match selection {
        Selection::Field(name) => Ok(Element::scalar(name)),
        Selection::Tuple(names) => {
            if names.is_empty() {
                return Err(QueryError::template_syntax("empty tuple in selection"));
            }
            Ok(Element {
                inner: InnerKind::Tuple,
                fields: names.clone(),
            })
        }
        Selection::List(_) | Selection::Set(_) => inner_container(selection),
        Selection::Map(_) => Err(QueryError::template_syntax(format!(
            "nested mapping {} is not supported",
            selection
        ))),
    }
}

fn inner_container(selection: &Selection) -> QueryResult<Element> {
    let (inner, items) = match selection {
        Selection::List(items) => (InnerKind::List, items),
        Selection::Set(items) => (InnerKind::Set, items),
        other => return element(other),
    };
    if items.is_empty() {
        return Err(QueryError::template_syntax(format!(
            "empty container in selection {}",
            selection
        )));
    }
    let fields = items
        .iter()
        .map(|item| match item {
            Selection::Field(name) => Ok(name.clone()),
            other => Err(QueryError::template_syntax(format!(
                "inner container members must be field names, got {}",
                other
            ))),
        })
        .collect::<QueryResult<Vec<_>>>()?;
    Ok(Element { inner, fields })
}

fn key_element(selection: &Selection) -> QueryResult<Element> {
    match selection {
        Selection::Field(_) | Selection::Tuple(_) => element(selection),
        other => Err(QueryError::template_syntax(format!(
            "grouping key must be a field or a tuple of fields, got {}",
            other
        ))),
    }
}

impl fmt::Display for OuterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OuterKind::List => write!(f, "list"),
            OuterKind::Set => write!(f, "set"),
        }
    }
}

impl fmt::Display for InnerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InnerKind::Scalar => write!(f, "scalar"),
            InnerKind::Tuple => write!(f, "tuple"),
            InnerKind::List => write!(f, "list"),
            InnerKind::Set => write!(f, "set"),
        }
    }
}
