//! Row sources
//!
//! A row source supplies fieldnames and rows of scalar values. Reading
//! files or databases is left to implementors of [`RowSource`];
//! [`MemorySource`] is the in-memory implementation used by the CLI and
//! the tests.

mod adapter;
mod memory;

pub use adapter::{Row, RowIter, RowSource};
pub use memory::MemorySource;
