//! Explain output for queries
//!
//! Produces deterministic, human-readable output describing what a query
//! will do, without reading any row.

use std::fmt;

use super::step::Step;
use crate::result::EvalType;

/// Explain plan output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplainPlan {
    /// Row source description, if bound
    pub source: Option<String>,
    /// Selection as written
    pub selection: Option<String>,
    /// Grouping key fields and element shape
    pub grouping: Option<String>,
    /// Element recipe: outer container, element shape and fields
    pub element: Option<String>,
    /// Field constraints
    pub constraints: Vec<String>,
    /// Queued operations in order
    pub steps: Vec<String>,
    /// Container type of the evaluated result; `None` when only known at
    /// evaluation (after `apply` or `unwrap`)
    pub result_type: Option<EvalType>,
}

/// Container type after `steps`, as far as it can be known up front
pub(crate) fn result_type(start: Option<EvalType>, steps: &[Step]) -> Option<EvalType> {
    steps.iter().try_fold(start?, |current, step| match (current, step) {
        (EvalType::Map, Step::Flatten) => Some(EvalType::List),
        (EvalType::Map, _) => Some(EvalType::Map),
        (_, Step::Apply(_)) => None,
        (EvalType::Value, _) => Some(EvalType::Value),
        (_, Step::Unwrap) => None,
        (_, Step::Map(_) | Step::StarMap(_)) => Some(EvalType::List),
        (_, Step::Reduce { .. } | Step::Aggregate(_)) => Some(EvalType::Value),
        (other, Step::Filter(_) | Step::Distinct | Step::Flatten) => Some(other),
    })
}

impl fmt::Display for ExplainPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== EXPLAIN PLAN ===")?;
        writeln!(f, "Source: {}", self.source.as_deref().unwrap_or("unbound"))?;
        if let Some(selection) = &self.selection {
            writeln!(f, "Selection: {}", selection)?;
        }
        if let Some(grouping) = &self.grouping {
            writeln!(f, "Grouping Key: {}", grouping)?;
        }
        if let Some(element) = &self.element {
            writeln!(f, "Element: {}", element)?;
        }
        if !self.constraints.is_empty() {
            writeln!(f, "Where:")?;
            for constraint in &self.constraints {
                writeln!(f, "  - {}", constraint)?;
            }
        }
        if !self.steps.is_empty() {
            writeln!(f, "Steps:")?;
            for (i, step) in self.steps.iter().enumerate() {
                writeln!(f, "  {}. {}", i + 1, step)?;
            }
        }
        match self.result_type {
            Some(t) => writeln!(f, "Result Type: {}", t),
            None => writeln!(f, "Result Type: decided at evaluation"),
        }
    }
}
