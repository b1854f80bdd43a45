//! In-memory row source

use std::collections::HashSet;
use std::sync::Arc;

use super::adapter::{Row, RowIter, RowSource};
use crate::predicate::Where;
use crate::query::{Query, QueryError, QueryResult};
use crate::shape::Selection;
use crate::value::Value;

/// Rows held in memory, cheap to clone and share between queries.
///
/// Several origins can be combined with [`MemorySource::extend`]; the
/// result exposes the union of their fieldnames and pads cells an origin
/// does not have with the empty string.
#[derive(Debug, Clone)]
pub struct MemorySource {
    fieldnames: Vec<String>,
    rows: Arc<Vec<Row>>,
}

impl MemorySource {
    /// Creates a source from fieldnames and rows of the same width
    pub fn new<I, S>(fieldnames: I, rows: Vec<Vec<Value>>) -> QueryResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fieldnames: Vec<String> = fieldnames.into_iter().map(Into::into).collect();
        check_unique(&fieldnames)?;

        let width = fieldnames.len();
        let rows = rows
            .into_iter()
            .enumerate()
            .map(|(i, row)| {
                if row.len() != width {
                    return Err(QueryError::invalid_argument(format!(
                        "row {} has {} cells, expected {}",
                        i,
                        row.len(),
                        width
                    )));
                }
                Ok(Row::from(row))
            })
            .collect::<QueryResult<Vec<_>>>()?;

        Ok(Self {
            fieldnames,
            rows: Arc::new(rows),
        })
    }

    /// Creates a source from records whose first record is the header
    pub fn from_records(records: Vec<Vec<Value>>) -> QueryResult<Self> {
        let mut records = records.into_iter();
        let header = records
            .next()
            .ok_or_else(|| QueryError::invalid_argument("records must start with a header row"))?;
        let fieldnames: Vec<String> = header.iter().map(Value::render_plain).collect();
        Self::new(fieldnames, records.collect())
    }

    /// Appends the rows of another origin.
    ///
    /// Fieldnames become the union of both origins in first-seen order;
    /// a field missing from an origin reads as `""` for its rows.
    pub fn extend(&mut self, other: &MemorySource) {
        let mut fieldnames = self.fieldnames.clone();
        for name in &other.fieldnames {
            if !fieldnames.contains(name) {
                fieldnames.push(name.clone());
            }
        }

        let mut rows = Vec::with_capacity(self.rows.len() + other.rows.len());
        rows.extend(realign(&self.fieldnames, &self.rows, &fieldnames));
        rows.extend(realign(&other.fieldnames, &other.rows, &fieldnames));

        self.fieldnames = fieldnames;
        self.rows = Arc::new(rows);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Builds a query selecting from this source
    pub fn select(&self, selection: impl Into<Selection>) -> QueryResult<Query> {
        Query::select(Arc::new(self.clone()), selection)
    }

    /// Builds a query selecting from this source with field constraints
    pub fn select_where(
        &self,
        selection: impl Into<Selection>,
        filters: Where,
    ) -> QueryResult<Query> {
        Query::select_where(Arc::new(self.clone()), selection, filters)
    }
}

fn check_unique(fieldnames: &[String]) -> QueryResult<()> {
    let mut seen = HashSet::new();
    for name in fieldnames {
        if !seen.insert(name.as_str()) {
            return Err(QueryError::invalid_argument(format!(
                "duplicate fieldname {:?}",
                name
            )));
        }
    }
    Ok(())
}

fn realign<'a>(
    from: &'a [String],
    rows: &'a [Row],
    to: &'a [String],
) -> impl Iterator<Item = Row> + 'a {
    let positions: Vec<Option<usize>> = to
        .iter()
        .map(|name| from.iter().position(|f| f == name))
        .collect();
    rows.iter().map(move |row| {
        positions
            .iter()
            .map(|pos| match pos {
                Some(i) => row[*i].clone(),
                None => Value::text(""),
            })
            .collect::<Vec<_>>()
            .into()
    })
}

impl RowSource for MemorySource {
    fn fieldnames(&self) -> &[String] {
        &self.fieldnames
    }

    fn rows(&self) -> QueryResult<RowIter> {
        let rows = Arc::clone(&self.rows);
        let mut next = 0;
        Ok(Box::new(std::iter::from_fn(move || {
            let row = rows.get(next).cloned();
            next += 1;
            row.map(Ok)
        })))
    }

    fn describe(&self) -> String {
        format!("<MemorySource {} rows>", self.rows.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(source: &MemorySource) -> Vec<Vec<Value>> {
        source
            .rows()
            .unwrap()
            .map(|r| r.unwrap().to_vec())
            .collect()
    }

    #[test]
    fn test_new_and_rows() {
        let source = MemorySource::new(
            ["A", "B"],
            vec![vec![Value::text("x"), Value::Int(1)]],
        )
        .unwrap();
        assert_eq!(source.fieldnames(), &["A".to_string(), "B".to_string()]);
        assert_eq!(rows(&source), vec![vec![Value::text("x"), Value::Int(1)]]);
        assert_eq!(source.describe(), "<MemorySource 1 rows>");
    }

    #[test]
    fn test_each_pass_starts_over() {
        let source = MemorySource::new(["A"], vec![vec![Value::Int(1)], vec![Value::Int(2)]])
            .unwrap();
        assert_eq!(rows(&source).len(), 2);
        assert_eq!(rows(&source).len(), 2);
    }

    #[test]
    fn test_rejects_duplicate_fieldnames_and_ragged_rows() {
        assert!(MemorySource::new(["A", "A"], Vec::new()).is_err());
        assert!(MemorySource::new(["A", "B"], vec![vec![Value::Int(1)]]).is_err());
    }

    #[test]
    fn test_from_records_uses_header() {
        let source = MemorySource::from_records(vec![
            vec![Value::text("A"), Value::text("B")],
            vec![Value::text("x"), Value::text("foo")],
        ])
        .unwrap();
        assert_eq!(source.fieldnames(), &["A".to_string(), "B".to_string()]);
        assert_eq!(source.len(), 1);
        assert!(MemorySource::from_records(Vec::new()).is_err());
    }

    #[test]
    fn test_extend_pads_missing_fields_with_empty_text() {
        let mut first = MemorySource::new(
            ["A", "B"],
            vec![vec![Value::text("x"), Value::text("foo")]],
        )
        .unwrap();
        let second = MemorySource::new(
            ["A", "C"],
            vec![vec![Value::text("y"), Value::Int(10)]],
        )
        .unwrap();

        first.extend(&second);

        assert_eq!(
            first.fieldnames(),
            &["A".to_string(), "B".to_string(), "C".to_string()]
        );
        assert_eq!(
            rows(&first),
            vec![
                vec![Value::text("x"), Value::text("foo"), Value::text("")],
                vec![Value::text("y"), Value::text(""), Value::Int(10)],
            ]
        );
    }
}
