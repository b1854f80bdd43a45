//! Immutable, chainable query description

use std::collections::HashSet;
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::iter;
use std::path::Path;
use std::sync::Arc;

use super::aggregates::Aggregate;
use super::errors::{QueryError, QueryResult, UserResult};
use super::explain::{result_type, ExplainPlan};
use super::pipeline::apply_step;
use super::step::{label_of, Labeled, Step};
use crate::export::{self, CsvOptions, RowReader};
use crate::grouping::GroupingEngine;
use crate::observability::{Event, Logger};
use crate::predicate::{Predicate, Where};
use crate::result::{Entry, EvalType, LazyResult};
use crate::shape::{OuterKind, ResolvedShape, Selection, Shape};
use crate::source::RowSource;
use crate::value::{Data, Value, DEFAULT_WIDTH};

/// Default number of preview lines
pub const PREVIEW_MAX_LINES: usize = 8;

#[derive(Clone)]
enum Origin {
    Unbound,
    Rows(Arc<dyn RowSource>),
    Data(Arc<Data>),
}

/// A deferred query.
///
/// Holds an optional source, a selection, field constraints and an
/// ordered list of operations. Nothing is read until an output method
/// (`execute`, `fetch`, `preview`, `to_reader`, `to_csv`) is called.
/// Chaining methods return a new query and leave `self` unchanged, so a
/// query can be shared and evaluated any number of times.
#[derive(Clone)]
pub struct Query {
    origin: Origin,
    selection: Option<Selection>,
    shape: Option<Shape>,
    filters: Where,
    steps: Vec<Step>,
}

impl Query {
    /// Creates a source-less query.
    ///
    /// The selection is checked for syntax now; fields are checked when a
    /// source is bound.
    pub fn new(selection: impl Into<Selection>) -> QueryResult<Self> {
        let selection = selection.into();
        let shape = Shape::normalize(&selection)?;
        Ok(Self {
            origin: Origin::Unbound,
            selection: Some(selection),
            shape: Some(shape),
            filters: Where::new(),
            steps: Vec::new(),
        })
    }

    /// Creates a query over `source`; unknown fields fail here
    pub fn select(
        source: Arc<dyn RowSource>,
        selection: impl Into<Selection>,
    ) -> QueryResult<Self> {
        Self::new(selection)?.bind(source)
    }

    /// Creates a query over `source` with field constraints
    pub fn select_where(
        source: Arc<dyn RowSource>,
        selection: impl Into<Selection>,
        filters: Where,
    ) -> QueryResult<Self> {
        let mut query = Self::new(selection)?;
        query.filters = filters;
        query.bind(source)
    }

    /// Creates a query over already-materialized data
    pub fn from_data(data: impl Into<Data>) -> Self {
        Self {
            origin: Origin::Data(Arc::new(data.into())),
            selection: None,
            shape: None,
            filters: Where::new(),
            steps: Vec::new(),
        }
    }

    /// Returns a copy bound to `source`.
    ///
    /// Fails if the query already has a source or references a field the
    /// source does not have.
    pub fn bind(&self, source: Arc<dyn RowSource>) -> QueryResult<Self> {
        if !matches!(self.origin, Origin::Unbound) {
            return Err(QueryError::invalid_argument("query already has a source"));
        }
        let shape = self
            .shape
            .as_ref()
            .ok_or_else(|| QueryError::invalid_argument("query has no selection"))?;

        let desc = source.describe();
        ResolvedShape::resolve(shape, source.fieldnames(), &desc)?;
        self.filters.bind(source.fieldnames(), &desc)?;

        let mut query = self.clone();
        query.origin = Origin::Rows(source);
        Logger::emit(
            Event::QueryBuilt,
            &[("query", &query.to_string()), ("source", &desc)],
        );
        Ok(query)
    }

    /// Returns a copy with `field` constrained by `predicate`.
    ///
    /// On a bound query the field is checked immediately.
    pub fn with_where(
        &self,
        field: impl Into<String>,
        predicate: impl Into<Predicate>,
    ) -> QueryResult<Self> {
        let mut query = self.clone();
        query.filters.set(field, predicate);
        match &query.origin {
            Origin::Data(_) => {
                return Err(QueryError::invalid_argument(
                    "field constraints need a row source",
                ))
            }
            Origin::Rows(source) => {
                query
                    .filters
                    .bind(source.fieldnames(), &source.describe())?;
            }
            Origin::Unbound => {}
        }
        Ok(query)
    }

    fn push(&self, step: Step) -> Self {
        let mut query = self.clone();
        query.steps.push(step);
        query
    }

    /// Transforms every element (per group for groupings)
    pub fn map<F>(&self, f: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        let label = label_of::<F>();
        self.push(Step::Map(Labeled::new(Arc::new(move |v: &Value| Ok(f(v))), label)))
    }

    /// Fallible [`Query::map`]; an error aborts evaluation
    pub fn try_map<F>(&self, f: F) -> Self
    where
        F: Fn(&Value) -> UserResult<Value> + Send + Sync + 'static,
    {
        let label = label_of::<F>();
        self.push(Step::Map(Labeled::new(Arc::new(f), label)))
    }

    /// Like [`Query::map`] with tuple elements spread into the arguments
    pub fn starmap<F>(&self, f: F) -> Self
    where
        F: Fn(&[Value]) -> Value + Send + Sync + 'static,
    {
        let label = label_of::<F>();
        self.push(Step::StarMap(Labeled::new(
            Arc::new(move |args: &[Value]| Ok(f(args))),
            label,
        )))
    }

    pub fn try_starmap<F>(&self, f: F) -> Self
    where
        F: Fn(&[Value]) -> UserResult<Value> + Send + Sync + 'static,
    {
        let label = label_of::<F>();
        self.push(Step::StarMap(Labeled::new(Arc::new(f), label)))
    }

    /// Keeps elements matching `predicate`
    pub fn filter(&self, predicate: impl Into<Predicate>) -> Self {
        self.push(Step::Filter(predicate.into()))
    }

    /// Keeps truthy elements
    pub fn filter_truthy(&self) -> Self {
        self.filter(true)
    }

    /// Folds each collection to one value, starting from its first element
    pub fn reduce<F>(&self, f: F) -> Self
    where
        F: Fn(&Value, &Value) -> Value + Send + Sync + 'static,
    {
        let label = label_of::<F>();
        self.push(Step::Reduce {
            func: Labeled::new(Arc::new(move |a: &Value, b: &Value| Ok(f(a, b))), label),
            seed: None,
        })
    }

    pub fn try_reduce<F>(&self, f: F) -> Self
    where
        F: Fn(&Value, &Value) -> UserResult<Value> + Send + Sync + 'static,
    {
        let label = label_of::<F>();
        self.push(Step::Reduce {
            func: Labeled::new(Arc::new(f), label),
            seed: None,
        })
    }

    /// Folds each collection starting from a fresh `seed()` value
    pub fn reduce_with<F, S>(&self, f: F, seed: S) -> Self
    where
        F: Fn(&Value, &Value) -> Value + Send + Sync + 'static,
        S: Fn() -> Value + Send + Sync + 'static,
    {
        let label = label_of::<F>();
        let seed_label = label_of::<S>();
        self.push(Step::Reduce {
            func: Labeled::new(Arc::new(move |a: &Value, b: &Value| Ok(f(a, b))), label),
            seed: Some(Labeled::new(Arc::new(seed), seed_label)),
        })
    }

    /// Calls `f` once with the whole result (once per group for groupings)
    pub fn apply<F>(&self, f: F) -> Self
    where
        F: Fn(Data) -> Data + Send + Sync + 'static,
    {
        let label = label_of::<F>();
        self.push(Step::Apply(Labeled::new(Arc::new(move |d: Data| Ok(f(d))), label)))
    }

    pub fn try_apply<F>(&self, f: F) -> Self
    where
        F: Fn(Data) -> UserResult<Data> + Send + Sync + 'static,
    {
        let label = label_of::<F>();
        self.push(Step::Apply(Labeled::new(Arc::new(f), label)))
    }

    pub fn sum(&self) -> Self {
        self.push(Step::Aggregate(Aggregate::Sum))
    }

    /// Number of non-null elements
    pub fn count(&self) -> Self {
        self.push(Step::Aggregate(Aggregate::Count))
    }

    pub fn avg(&self) -> Self {
        self.push(Step::Aggregate(Aggregate::Avg))
    }

    pub fn min(&self) -> Self {
        self.push(Step::Aggregate(Aggregate::Min))
    }

    pub fn max(&self) -> Self {
        self.push(Step::Aggregate(Aggregate::Max))
    }

    /// Removes duplicates, keeping first-seen order
    pub fn distinct(&self) -> Self {
        self.push(Step::Distinct)
    }

    /// Turns a grouping into one flat tuple per grouped element
    pub fn flatten(&self) -> Self {
        self.push(Step::Flatten)
    }

    /// Replaces single-element containers with their element
    pub fn unwrap(&self) -> Self {
        self.push(Step::Unwrap)
    }

    /// Fieldnames of the bound row source
    pub fn fieldnames(&self) -> Option<Vec<String>> {
        match &self.origin {
            Origin::Rows(source) => Some(source.fieldnames().to_vec()),
            _ => None,
        }
    }

    /// Field labels of a flattened row: key fields, then value fields
    pub fn field_labels(&self) -> Option<Vec<String>> {
        self.shape
            .as_ref()
            .map(|shape| shape.fields().into_iter().map(str::to_string).collect())
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Evaluates the query against its bound source
    pub fn execute(&self) -> QueryResult<LazyResult> {
        let base = match &self.origin {
            Origin::Unbound => {
                return Err(QueryError::invalid_argument(
                    "query has no source; use execute_with",
                ))
            }
            Origin::Data(data) => LazyResult::from_data(data.as_ref().clone()),
            Origin::Rows(source) => {
                let shape = self
                    .shape
                    .as_ref()
                    .ok_or_else(|| QueryError::invalid_argument("query has no selection"))?;
                select_rows(source.as_ref(), shape, &self.filters)?
            }
        };

        Logger::emit(
            Event::QueryExecute,
            &[
                ("query", &self.to_string()),
                ("steps", &self.steps.len().to_string()),
            ],
        );

        Ok(self
            .steps
            .iter()
            .fold(base, |result, step| apply_step(step, result)))
    }

    /// Binds a source-less query to `source` and evaluates it
    pub fn execute_with(&self, source: Arc<dyn RowSource>) -> QueryResult<LazyResult> {
        self.bind(source)?.execute()
    }

    /// Evaluates and materializes the result
    pub fn fetch(&self) -> QueryResult<Data> {
        self.execute()?.fetch()
    }

    /// Query rendering followed by a bounded preview of its data
    pub fn preview(&self) -> QueryResult<String> {
        self.preview_with(PREVIEW_MAX_LINES, DEFAULT_WIDTH)
    }

    pub fn preview_with(&self, max_lines: usize, width: usize) -> QueryResult<String> {
        let mut result = self.execute()?;
        let preview = result.preview(max_lines, width)?;
        Ok(format!(
            "{}\n---- preview ----\n{}",
            self,
            preview.lines.join("\n")
        ))
    }

    /// Describes the query without reading any row
    pub fn explain(&self) -> ExplainPlan {
        let start = match &self.origin {
            Origin::Data(data) => Some(EvalType::of(data)),
            _ => self.shape.as_ref().map(|shape| {
                if shape.is_grouping() {
                    EvalType::Map
                } else if shape.outer == OuterKind::Set {
                    EvalType::Set
                } else {
                    EvalType::List
                }
            }),
        };

        ExplainPlan {
            source: match &self.origin {
                Origin::Unbound => None,
                Origin::Rows(source) => Some(source.describe()),
                Origin::Data(_) => Some("materialized data".to_string()),
            },
            selection: self.selection.as_ref().map(|s| s.to_string()),
            grouping: self.shape.as_ref().and_then(|shape| {
                shape
                    .key
                    .as_ref()
                    .map(|key| format!("{} ({})", key.inner, key.fields.join(", ")))
            }),
            element: self.shape.as_ref().map(|shape| {
                format!(
                    "{} of {} ({})",
                    shape.outer,
                    shape.element.inner,
                    shape.element.fields.join(", ")
                )
            }),
            constraints: self
                .filters
                .clauses()
                .iter()
                .map(|c| format!("{}={}", c.field, c.predicate))
                .collect(),
            steps: self.steps.iter().map(|s| s.to_string()).collect(),
            result_type: result_type(start, &self.steps),
        }
    }

    /// Rows of the flattened result, preceded by an optional header.
    ///
    /// With no `fieldnames`, the header is the selection's field labels and
    /// is only emitted when it is as wide as the first row.
    pub fn to_reader(&self, fieldnames: Option<Vec<String>>) -> QueryResult<RowReader> {
        let result = self.flatten().execute()?;
        RowReader::new(result, fieldnames, self.field_labels())
    }

    /// Writes the flattened result as delimited text, returning the number
    /// of data rows written
    pub fn to_csv<W: Write>(&self, writer: &mut W, options: &CsvOptions) -> QueryResult<usize> {
        let reader = self.to_reader(None)?;
        let rows = export::write_csv(reader, writer, options)?;
        Logger::emit(Event::ExportComplete, &[("rows", &rows.to_string())]);
        Ok(rows)
    }

    pub fn to_csv_path(&self, path: impl AsRef<Path>, options: &CsvOptions) -> QueryResult<usize> {
        let mut writer = BufWriter::new(File::create(path)?);
        let rows = self.to_csv(&mut writer, options)?;
        writer.flush()?;
        Ok(rows)
    }
}

/// Builds the base result: filtered rows shaped into elements, or grouped
fn select_rows(
    source: &dyn RowSource,
    shape: &Shape,
    filters: &Where,
) -> QueryResult<LazyResult> {
    let desc = source.describe();
    let resolved = ResolvedShape::resolve(shape, source.fieldnames(), &desc)?;
    let bound = filters.bind(source.fieldnames(), &desc)?;

    let rows = source.rows()?.filter_map(move |row| match row {
        Ok(row) => match bound.matches_row(&row) {
            Ok(true) => Some(Ok(row)),
            Ok(false) => None,
            Err(err) => Some(Err(err)),
        },
        Err(err) => Some(Err(err)),
    });

    match resolved.key {
        Some(key) => {
            let engine = GroupingEngine::new(key, resolved.value);
            let groups = iter::once_with(move || engine.group(rows)).flat_map(|groups| {
                match groups {
                    Ok(groups) => groups
                        .into_iter()
                        .map(|(key, data)| Ok(Entry::Pair(key, data)))
                        .collect::<Vec<_>>(),
                    Err(err) => vec![Err(err)],
                }
            });
            Ok(LazyResult::new(EvalType::Map, Box::new(groups)))
        }
        None => {
            let recipe = resolved.value;
            let items = rows.map(move |row| row.map(|row| recipe.projection.build(&row)));
            match shape.outer {
                OuterKind::List => Ok(LazyResult::new(
                    EvalType::List,
                    Box::new(items.map(|item| item.map(Entry::Item))),
                )),
                OuterKind::Set => {
                    let mut seen = HashSet::new();
                    Ok(LazyResult::new(
                        EvalType::Set,
                        Box::new(
                            items
                                .filter(move |item| match item {
                                    Ok(v) => seen.insert(v.clone()),
                                    Err(_) => true,
                                })
                                .map(|item| item.map(Entry::Item)),
                        ),
                    ))
                }
            }
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.origin {
            Origin::Data(data) => write!(f, "Query.from_data({})", data)?,
            origin => {
                write!(f, "Query(")?;
                if let Origin::Rows(source) = origin {
                    write!(f, "{}, ", source.describe())?;
                }
                if let Some(selection) = &self.selection {
                    write!(f, "{}", selection)?;
                }
                if !self.filters.is_empty() {
                    write!(f, ", {}", self.filters)?;
                }
                write!(f, ")")?;
            }
        }
        for step in &self.steps {
            write!(f, ".{}", step)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::QueryErrorCode;
    use crate::source::MemorySource;

    fn source() -> Arc<dyn RowSource> {
        Arc::new(
            MemorySource::new(
                ["A", "B"],
                vec![
                    vec![Value::text("x"), Value::Int(1)],
                    vec![Value::text("y"), Value::Int(2)],
                ],
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_with_where_checks_bound_fields() {
        let query = Query::select(source(), "A").unwrap();
        let narrowed = query.with_where("A", "y").unwrap();
        assert_eq!(narrowed.fetch().unwrap(), Data::list(["y"]));
        assert_eq!(query.fetch().unwrap(), Data::list(["x", "y"]));

        let err = query.with_where("Z", "y").unwrap_err();
        assert_eq!(err.code(), QueryErrorCode::FieldLookup);
    }

    #[test]
    fn test_bind_twice_rejected() {
        let query = Query::select(source(), "A").unwrap();
        let err = query.bind(source()).unwrap_err();
        assert_eq!(err.code(), QueryErrorCode::InvalidArgument);
    }

    #[test]
    fn test_from_data() {
        let query = Query::from_data(Data::list([3, 1, 2])).max();
        assert_eq!(query.fetch().unwrap(), Data::value(3));
        assert_eq!(query.to_string(), "Query.from_data([3, 1, 2]).max()");
        assert!(query.with_where("A", 1).is_err());
        assert_eq!(query.explain().result_type, Some(EvalType::Value));
    }

    #[test]
    fn test_unbound_where_is_checked_on_bind() {
        let query = Query::new("A").unwrap().with_where("Z", 1).unwrap();
        let err = query.bind(source()).unwrap_err();
        assert_eq!(err.code(), QueryErrorCode::FieldLookup);
    }

    #[test]
    fn test_field_labels() {
        let query = Query::new(Selection::group(Selection::tuple(["A", "B"]), "C")).unwrap();
        assert_eq!(
            query.field_labels(),
            Some(vec!["A".to_string(), "B".to_string(), "C".to_string()])
        );
        assert_eq!(query.fieldnames(), None);
    }
}
