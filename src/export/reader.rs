//! Row reader over a flattened result

use crate::query::QueryResult;
use crate::result::{Entry, LazyResult};
use crate::value::Value;

enum Header {
    /// Always emitted
    Given(Vec<String>),
    /// Emitted only when as wide as the first row
    Labels(Vec<String>),
    None,
}

/// Iterator over export rows: an optional header row, then one row per
/// element of the result.
pub struct RowReader {
    result: LazyResult,
    header: Header,
    held: Option<Vec<Value>>,
    header_emitted: bool,
}

impl RowReader {
    /// Creates a reader over an already flattened result.
    ///
    /// `fieldnames` is always written as the header; otherwise `labels` is
    /// used when its width matches the first data row.
    pub fn new(
        result: LazyResult,
        fieldnames: Option<Vec<String>>,
        labels: Option<Vec<String>>,
    ) -> QueryResult<Self> {
        let header = match (fieldnames, labels) {
            (Some(names), _) => Header::Given(names),
            (None, Some(labels)) => Header::Labels(labels),
            (None, None) => Header::None,
        };
        Ok(Self {
            result: result.force()?,
            header,
            held: None,
            header_emitted: false,
        })
    }

    /// Drops the header row
    pub fn without_header(mut self) -> Self {
        self.header = Header::None;
        self
    }

    /// True once a header row has been handed out
    pub fn header_emitted(&self) -> bool {
        self.header_emitted
    }

    fn next_row(&mut self) -> Option<QueryResult<Vec<Value>>> {
        self.result.next().map(|entry| entry.map(row_of))
    }

    fn header_row(names: Vec<String>) -> Vec<Value> {
        names.into_iter().map(Value::Text).collect()
    }
}

fn row_of(entry: Entry) -> Vec<Value> {
    match entry {
        Entry::Item(value) => value.splat(),
        Entry::Pair(key, data) => {
            let mut row = key.splat();
            row.push(Value::List(data.into_values()));
            row
        }
    }
}

impl Iterator for RowReader {
    type Item = QueryResult<Vec<Value>>;

    fn next(&mut self) -> Option<Self::Item> {
        match std::mem::replace(&mut self.header, Header::None) {
            Header::Given(names) => {
                self.header_emitted = true;
                return Some(Ok(Self::header_row(names)));
            }
            Header::Labels(labels) => match self.next_row() {
                Some(Ok(first)) => {
                    if labels.len() == first.len() {
                        self.held = Some(first);
                        self.header_emitted = true;
                        return Some(Ok(Self::header_row(labels)));
                    }
                    return Some(Ok(first));
                }
                other => return other,
            },
            Header::None => {}
        }
        if let Some(row) = self.held.take() {
            return Some(Ok(row));
        }
        self.next_row()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Data;

    fn reader(data: Data, fieldnames: Option<Vec<String>>, labels: Option<Vec<String>>) -> RowReader {
        RowReader::new(LazyResult::from_data(data), fieldnames, labels).unwrap()
    }

    fn labels(names: &[&str]) -> Option<Vec<String>> {
        Some(names.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_tuples_spread_over_columns() {
        let data = Data::list([Value::tuple(["x", "foo"]), Value::tuple(["y", "bar"])]);
        let rows: Vec<_> = reader(data, None, labels(&["A", "B"]))
            .map(|r| r.unwrap())
            .collect();
        assert_eq!(
            rows,
            vec![
                vec![Value::text("A"), Value::text("B")],
                vec![Value::text("x"), Value::text("foo")],
                vec![Value::text("y"), Value::text("bar")],
            ]
        );
    }

    #[test]
    fn test_label_width_mismatch_skips_header() {
        let data = Data::list([Value::Int(1), Value::Int(2)]);
        let rows: Vec<_> = reader(data, None, labels(&["A", "B"]))
            .map(|r| r.unwrap())
            .collect();
        assert_eq!(rows, vec![vec![Value::Int(1)], vec![Value::Int(2)]]);
    }

    #[test]
    fn test_given_fieldnames_always_written() {
        let data = Data::list(Vec::<Value>::new());
        let mut rows = reader(data, labels(&["X"]), None);
        assert_eq!(rows.next().unwrap().unwrap(), vec![Value::text("X")]);
        assert!(rows.header_emitted());
        assert!(rows.next().is_none());
    }

    #[test]
    fn test_without_header() {
        let data = Data::list([Value::Int(1)]);
        let rows: Vec<_> = reader(data, labels(&["A"]), None)
            .without_header()
            .map(|r| r.unwrap())
            .collect();
        assert_eq!(rows, vec![vec![Value::Int(1)]]);
    }
}
