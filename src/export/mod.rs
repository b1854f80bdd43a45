//! Delimited-text export
//!
//! Queries are exported by flattening them into rows: a grouping becomes
//! one row per grouped element (key fields first), a tuple element is
//! spread over several columns and any other element fills one column.

mod csv;
mod reader;

pub use csv::{write_csv, CsvOptions};
pub use reader::RowReader;
