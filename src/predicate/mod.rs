//! Predicate matching for rowshape
//!
//! A [`Predicate`] decides whether a value satisfies a match
//! specification. Specifications are, in priority order:
//!
//! 1. a user matcher object ([`Matcher`]), which is delegated to
//! 2. a callable, whose result is used directly
//! 3. a set of alternatives, matching if any member matches
//! 4. a type, matching instances of that type
//! 5. a literal, matching by equality; `true`/`false` literals test
//!    truthiness instead
//! 6. the wildcard, matching everything
//!
//! Any specification can be inverted with [`Predicate::not`]. Matching is
//! total except for user matchers and callables, whose errors propagate
//! unchanged.
//!
//! [`Where`] holds the field constraints of a selection (AND across
//! fields).

mod matcher;
mod where_clause;

pub use matcher::{Matcher, Predicate};
pub use where_clause::{BoundWhere, Where, WhereClause};
