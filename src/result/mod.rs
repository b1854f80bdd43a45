//! Lazy results
//!
//! Evaluating a query yields a [`LazyResult`]: a single-pass source of
//! [`Entry`] values plus the [`EvalType`] they materialize into. Results can
//! be iterated, drained with `fetch()`, or previewed without losing
//! elements.

mod entry;
mod lazy;

pub use entry::{Entry, EvalType};
pub use lazy::{EntryIter, LazyResult, Preview};
