//! rowshape - shape-directed, lazily evaluated queries over tabular rows
//!
//! A caller describes the *shape* of the data it wants with a selection
//! literal (a field, a tuple of fields, a list, a set, or a one-pair
//! grouping map), narrows rows with field constraints, and chains
//! operations such as `map`, `filter`, `sum` or `unwrap`. Nothing is read
//! until the query is evaluated.
//!
//! ```no_run
//! use rowshape::{MemorySource, Selection, Value};
//!
//! let rows = MemorySource::new(
//!     ["A", "B", "C"],
//!     vec![
//!         vec![Value::text("x"), Value::text("foo"), Value::Int(20)],
//!         vec![Value::text("y"), Value::text("bar"), Value::Int(10)],
//!     ],
//! )?;
//! let totals = rows.select(Selection::group("A", "C"))?.sum().fetch()?;
//! println!("{}", totals);
//! # Ok::<(), rowshape::QueryError>(())
//! ```

pub mod cli;
pub mod export;
pub mod grouping;
pub mod observability;
pub mod predicate;
pub mod query;
pub mod result;
pub mod shape;
pub mod source;
pub mod value;

pub use export::{CsvOptions, RowReader};
pub use predicate::{Matcher, Predicate, Where};
pub use query::{Aggregate, ExplainPlan, Query, QueryError, QueryResult, UserError, UserResult};
pub use result::{Entry, EvalType, LazyResult};
pub use shape::Selection;
pub use source::{MemorySource, RowSource};
pub use value::{Data, Value, ValueType};
