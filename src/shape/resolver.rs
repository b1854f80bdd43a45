//! Shape resolution against a row source

use super::normalize::{Element, InnerKind, OuterKind, Shape};
use crate::query::{QueryError, QueryResult};
use crate::value::{Data, Value, ValueSet};

/// Column getter plus element constructor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
    pub inner: InnerKind,
    pub columns: Vec<usize>,
    pub fields: Vec<String>,
}

impl Projection {
    /// Builds one element from `row`
    pub fn build(&self, row: &[Value]) -> Value {
        let mut cells = self
            .columns
            .iter()
            .map(|&i| row.get(i).cloned().unwrap_or(Value::Null));
        match self.inner {
            InnerKind::Scalar => cells.next().unwrap_or(Value::Null),
            InnerKind::Tuple => Value::Tuple(cells.collect()),
            InnerKind::List => Value::List(cells.collect()),
            InnerKind::Set => Value::Set(cells.collect::<ValueSet>()),
        }
    }
}

/// Per-element recipe and the outer container it is collected into
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementRecipe {
    pub outer: OuterKind,
    pub projection: Projection,
}

impl ElementRecipe {
    /// Collects built elements into the outer container
    pub fn collect(&self, values: Vec<Value>) -> Data {
        match self.outer {
            OuterKind::List => Data::List(values),
            OuterKind::Set => Data::Set(values.into_iter().collect()),
        }
    }
}

/// A selection resolved against concrete fieldnames
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedShape {
    pub key: Option<Projection>,
    pub value: ElementRecipe,
}

impl ResolvedShape {
    /// Resolves every field of `shape` to a column of `fieldnames`.
    ///
    /// Unknown fields fail with a field lookup error naming `source_desc`.
    pub fn resolve(shape: &Shape, fieldnames: &[String], source_desc: &str) -> QueryResult<Self> {
        let key = shape
            .key
            .as_ref()
            .map(|key| project(key, fieldnames, source_desc))
            .transpose()?;
        let projection = project(&shape.element, fieldnames, source_desc)?;
        Ok(Self {
            key,
            value: ElementRecipe {
                outer: shape.outer,
                projection,
            },
        })
    }

    /// Header labels of a flattened row: key fields, then value fields
    pub fn field_labels(&self) -> Vec<String> {
        self.key
            .iter()
            .chain(std::iter::once(&self.value.projection))
            .flat_map(|p| p.fields.iter().cloned())
            .collect()
    }
}

fn project(element: &Element, fieldnames: &[String], source_desc: &str) -> QueryResult<Projection> {
    let columns = element
        .fields
        .iter()
        .map(|field| {
            fieldnames
                .iter()
                .position(|name| name == field)
                .ok_or_else(|| QueryError::field_lookup(field, source_desc))
        })
        .collect::<QueryResult<Vec<_>>>()?;
    Ok(Projection {
        inner: element.inner,
        columns,
        fields: element.fields.clone(),
    })
}
