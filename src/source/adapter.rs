//! Row source contract

use std::sync::Arc;

use crate::query::QueryResult;
use crate::value::Value;

/// One row: scalar cells aligned with the source fieldnames.
///
/// Shared with downstream consumers, never mutated.
pub type Row = Arc<[Value]>;

/// Fallible, on-demand row iterator
pub type RowIter = Box<dyn Iterator<Item = QueryResult<Row>> + Send>;

/// Trait for supplying field-named rows to a query
pub trait RowSource: Send + Sync {
    /// Ordered, de-duplicated fieldnames
    fn fieldnames(&self) -> &[String];

    /// Opens a fresh pass over the rows.
    ///
    /// Rows must be produced on demand; a query only pulls what its
    /// operations require, so dropping the iterator early must release
    /// any backend handle.
    fn rows(&self) -> QueryResult<RowIter>;

    /// Short description used in error messages and query rendering
    fn describe(&self) -> String;
}
