//! Value model for rowshape
//!
//! Rows handed over by a row source are sequences of scalar [`Value`]s.
//! Tuples and inner containers only appear as result elements, built by
//! the shape resolver from several scalars of one row.
//!
//! [`Data`] is the fully materialized nested container returned by
//! `fetch()`: a bare value, a list, a set, or a grouping map.
//!
//! # Ordering
//!
//! Values have a total order used for display and deterministic output:
//!
//! Null < Bool < numbers (Int and Float interleaved) < Text < Tuple < List < Set
//!
//! Aggregates use the stricter *natural* order (see [`Value::natural_cmp`])
//! which refuses to compare unrelated kinds.

mod data;
mod format;
mod numeric;
mod value;

pub use data::Data;
pub use format::{pretty_lines, DEFAULT_WIDTH};
pub use numeric::{coerce_number, Number, NumericError};
pub use value::{Value, ValueSet, ValueType};
