//! Single-pass grouping of rows by key

use indexmap::IndexMap;

use crate::observability::{Event, Logger};
use crate::query::QueryResult;
use crate::shape::{ElementRecipe, Projection};
use crate::source::Row;
use crate::value::{Data, Value};

/// Groups rows by a key projection.
///
/// Rows need not be sorted. Keys merge on value equality, and groups come
/// out in first-seen key order.
#[derive(Debug, Clone)]
pub struct GroupingEngine {
    key: Projection,
    value: ElementRecipe,
}

impl GroupingEngine {
    pub fn new(key: Projection, value: ElementRecipe) -> Self {
        Self { key, value }
    }

    /// Consumes `rows` and returns key to per-group container.
    ///
    /// The first row error aborts the pass.
    pub fn group<I>(&self, rows: I) -> QueryResult<IndexMap<Value, Data>>
    where
        I: IntoIterator<Item = QueryResult<Row>>,
    {
        let mut accumulators: IndexMap<Value, Vec<Value>> = IndexMap::new();
        let mut row_count = 0usize;

        for row in rows {
            let row = row?;
            row_count += 1;
            accumulators
                .entry(self.key.build(&row))
                .or_default()
                .push(self.value.projection.build(&row));
        }

        Logger::emit(
            Event::GroupingComplete,
            &[
                ("groups", &accumulators.len().to_string()),
                ("rows", &row_count.to_string()),
            ],
        );

        Ok(accumulators
            .into_iter()
            .map(|(key, values)| (key, self.value.collect(values)))
            .collect())
    }
}
