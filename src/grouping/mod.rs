//! Grouping engine
//!
//! Partitions filtered rows by a key projection in one streaming pass,
//! then builds each group's container (list or set) from the accumulated
//! values. Aggregates are applied afterwards by the query pipeline.

mod engine;

pub use engine::GroupingEngine;
