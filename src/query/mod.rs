//! Query subsystem for rowshape
//!
//! A [`Query`] describes which fields to pull from a row source, how to
//! shape them, which rows to keep, and which operations to run on the
//! shaped result. Building a query never reads rows; evaluation yields a
//! [`crate::result::LazyResult`].
//!
//! # Evaluation
//!
//! - Ungrouped results are streamed row by row.
//! - Grouping results are built in one pass over the source the first time
//!   an element is requested, then iterated in key insertion order.
//! - Operations on a grouping apply to each group independently; only
//!   `flatten` works on the grouping as a whole.
//!
//! # Failure model
//!
//! Unknown fields and malformed selections fail when the query is built.
//! Type errors inside operations and user functions fail at evaluation,
//! naming the operation and the offending value.

mod aggregates;
mod errors;
mod explain;
mod pipeline;
mod query;
mod step;

pub use aggregates::{Accumulator, Aggregate};
pub use errors::{QueryError, QueryErrorCode, QueryResult, UserError, UserResult};
pub use explain::ExplainPlan;
pub use query::{Query, PREVIEW_MAX_LINES};
pub use step::{ApplyFn, Labeled, MapFn, ReduceFn, SeedFn, StarMapFn, Step};
