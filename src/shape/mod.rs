//! Selection shapes
//!
//! A [`Selection`] is the literal a caller writes. It is normalized into a
//! [`Shape`] when a query is built, and resolved into a [`ResolvedShape`]
//! once the fieldnames of a row source are known. Both steps fail before
//! any row is read.
//!
//! Disambiguation of single-item containers:
//! - `{"A"}` alone is an outer set of scalars
//! - `[{"A"}]` is an outer list of single-item inner sets
//! - `{"A", "B"}` is an outer list of two-item inner sets

mod normalize;
mod resolver;
mod selection;

pub use normalize::{Element, InnerKind, OuterKind, Shape};
pub use resolver::{ElementRecipe, Projection, ResolvedShape};
pub use selection::Selection;
