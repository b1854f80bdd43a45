//! Field constraints of a selection

use std::fmt;

use super::matcher::Predicate;
use crate::query::{QueryError, QueryResult};
use crate::value::Value;

/// One `field = predicate` constraint
#[derive(Debug, Clone)]
pub struct WhereClause {
    pub field: String,
    pub predicate: Predicate,
}

/// Ordered set of field constraints, ANDed together.
///
/// Setting a constraint on a field that already has one replaces it.
#[derive(Debug, Clone, Default)]
pub struct Where {
    clauses: Vec<WhereClause>,
}

impl Where {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy with `field` constrained by `predicate`
    pub fn and(mut self, field: impl Into<String>, predicate: impl Into<Predicate>) -> Self {
        self.set(field, predicate);
        self
    }

    pub fn set(&mut self, field: impl Into<String>, predicate: impl Into<Predicate>) {
        let field = field.into();
        let predicate = predicate.into();
        match self.clauses.iter_mut().find(|c| c.field == field) {
            Some(existing) => existing.predicate = predicate,
            None => self.clauses.push(WhereClause { field, predicate }),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    pub fn clauses(&self) -> &[WhereClause] {
        &self.clauses
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.clauses.iter().map(|c| c.field.as_str())
    }

    /// Resolves every constrained field to its column index.
    ///
    /// Unknown fields fail with a field lookup error naming `source_desc`.
    pub fn bind(&self, fieldnames: &[String], source_desc: &str) -> QueryResult<BoundWhere> {
        let mut columns = Vec::with_capacity(self.clauses.len());
        for clause in &self.clauses {
            let index = fieldnames
                .iter()
                .position(|name| *name == clause.field)
                .ok_or_else(|| QueryError::field_lookup(&clause.field, source_desc))?;
            columns.push((index, clause.predicate.clone()));
        }
        Ok(BoundWhere { columns })
    }
}

impl fmt::Display for Where {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, clause) in self.clauses.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", clause.field, clause.predicate)?;
        }
        Ok(())
    }
}

/// Constraints resolved to column indices of one row source
#[derive(Debug, Clone, Default)]
pub struct BoundWhere {
    columns: Vec<(usize, Predicate)>,
}

impl BoundWhere {
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Returns whether `row` satisfies every constraint.
    ///
    /// A failing user matcher aborts with an evaluation error naming the
    /// offending cell.
    pub fn matches_row(&self, row: &[Value]) -> QueryResult<bool> {
        for (index, predicate) in &self.columns {
            let cell = row.get(*index).unwrap_or(&Value::Null);
            let matched = predicate
                .matches(cell)
                .map_err(|e| QueryError::user_function("where", Some(cell), e))?;
            if !matched {
                return Ok(false);
            }
        }
        Ok(true)
    }
}
