//! Queued query operations

use std::fmt;
use std::sync::Arc;

use super::aggregates::Aggregate;
use super::errors::UserResult;
use crate::predicate::Predicate;
use crate::value::{Data, Value};

pub type MapFn = Arc<dyn Fn(&Value) -> UserResult<Value> + Send + Sync>;
pub type StarMapFn = Arc<dyn Fn(&[Value]) -> UserResult<Value> + Send + Sync>;
pub type ReduceFn = Arc<dyn Fn(&Value, &Value) -> UserResult<Value> + Send + Sync>;
pub type SeedFn = Arc<dyn Fn() -> Value + Send + Sync>;
pub type ApplyFn = Arc<dyn Fn(Data) -> UserResult<Data> + Send + Sync>;

/// A user function with the name it is rendered under
#[derive(Clone)]
pub struct Labeled<F> {
    pub func: F,
    pub label: String,
}

impl<F> Labeled<F> {
    pub fn new(func: F, label: String) -> Self {
        Self { func, label }
    }
}

/// Display name of a function type: the item name for `fn` items,
/// `<closure>` for closures.
pub(crate) fn label_of<F>() -> String {
    let name = std::any::type_name::<F>();
    if name.contains("{{closure}}") {
        return "<closure>".to_string();
    }
    name.rsplit("::").next().unwrap_or(name).to_string()
}

/// One queued operation
#[derive(Clone)]
pub enum Step {
    /// Element-wise transform
    Map(Labeled<MapFn>),
    /// Element-wise transform with tuple elements spread into arguments
    StarMap(Labeled<StarMapFn>),
    /// Element-wise selection
    Filter(Predicate),
    /// Fold each collection to one value
    Reduce {
        func: Labeled<ReduceFn>,
        seed: Option<Labeled<SeedFn>>,
    },
    /// Function of each whole collection
    Apply(Labeled<ApplyFn>),
    Aggregate(Aggregate),
    Distinct,
    Flatten,
    Unwrap,
}

impl Step {
    /// Operation name used in error messages
    pub fn name(&self) -> &'static str {
        match self {
            Step::Map(_) => "map",
            Step::StarMap(_) => "starmap",
            Step::Filter(_) => "filter",
            Step::Reduce { .. } => "reduce",
            Step::Apply(_) => "apply",
            Step::Aggregate(op) => op.name(),
            Step::Distinct => "distinct",
            Step::Flatten => "flatten",
            Step::Unwrap => "unwrap",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Map(func) => write!(f, "map({})", func.label),
            Step::StarMap(func) => write!(f, "starmap({})", func.label),
            Step::Filter(Predicate::Literal(Value::Bool(true))) => write!(f, "filter()"),
            Step::Filter(pred) => write!(f, "filter({})", pred),
            Step::Reduce { func, seed: None } => write!(f, "reduce({})", func.label),
            Step::Reduce {
                func,
                seed: Some(seed),
            } => write!(f, "reduce({}, seed={})", func.label, seed.label),
            Step::Apply(func) => write!(f, "apply({})", func.label),
            other => write!(f, "{}()", other.name()),
        }
    }
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Step({})", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn double(v: &Value) -> Value {
        v.clone()
    }

    fn label_for<F: Fn(&Value) -> Value>(_: &F) -> String {
        label_of::<F>()
    }

    #[test]
    fn test_labels() {
        assert_eq!(label_for(&double), "double");
        assert_eq!(label_for(&|v: &Value| v.clone()), "<closure>");
    }

    #[test]
    fn test_display() {
        assert_eq!(Step::Distinct.to_string(), "distinct()");
        assert_eq!(Step::Aggregate(Aggregate::Sum).to_string(), "sum()");
        assert_eq!(Step::Filter(Predicate::from(true)).to_string(), "filter()");
        assert_eq!(Step::Filter(Predicate::from("x")).to_string(), "filter(\"x\")");
    }
}
