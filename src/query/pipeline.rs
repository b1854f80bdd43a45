//! Applying queued steps to a lazy result
//!
//! Every step turns one [`LazyResult`] into another without pulling any
//! element. On a grouping result, steps other than `flatten` act on each
//! group's data and leave keys untouched. On any other result they act on
//! the element stream:
//!
//! | Step                 | Stream behaviour                                  |
//! |----------------------|---------------------------------------------------|
//! | map, starmap, filter | one element at a time                             |
//! | distinct             | one element at a time, remembering seen elements  |
//! | aggregates, reduce   | single value computed on first pull               |
//! | apply                | materializes, shape known after the call          |
//! | unwrap               | peeks at most two elements                        |
//! | flatten              | no-op                                             |

use std::collections::HashSet;
use std::iter;

use indexmap::IndexSet;

use super::errors::{QueryError, QueryResult, UserResult};
use super::step::{ApplyFn, Labeled, ReduceFn, SeedFn, Step};
use crate::predicate::Predicate;
use crate::result::{Entry, EvalType, LazyResult};
use crate::value::{Data, Value};

/// Queues `step` on top of `input`
pub(crate) fn apply_step(step: &Step, input: LazyResult) -> LazyResult {
    if input.is_pending() {
        let step = step.clone();
        return LazyResult::pending(move || Ok(apply_step(&step, input.force()?)));
    }
    match input.eval_type().unwrap_or(EvalType::Value) {
        EvalType::Map => grouped(step, input),
        eval_type => ungrouped(step, eval_type, input),
    }
}

fn grouped(step: &Step, input: LazyResult) -> LazyResult {
    if let Step::Flatten = step {
        return LazyResult::new(EvalType::List, Box::new(input.flat_map(flatten_entry)));
    }
    let step = step.clone();
    LazyResult::new(
        EvalType::Map,
        Box::new(input.map(move |entry| match entry? {
            Entry::Pair(key, data) => Ok(Entry::Pair(key, group_op(&step, data)?)),
            Entry::Item(v) => Err(QueryError::evaluation(
                step.name(),
                Some(&v),
                "element outside a group in a grouping result",
            )),
        })),
    )
}

/// One flat row per grouped element: key cells followed by value cells
fn flatten_entry(entry: QueryResult<Entry>) -> Vec<QueryResult<Entry>> {
    match entry {
        Ok(Entry::Pair(key, data)) => {
            let key_cells = key.splat();
            data.into_values()
                .into_iter()
                .map(|value| {
                    let mut row = key_cells.clone();
                    row.extend(value.splat());
                    Ok(Entry::Item(Value::Tuple(row)))
                })
                .collect()
        }
        other => vec![other],
    }
}

fn ungrouped(step: &Step, eval_type: EvalType, input: LazyResult) -> LazyResult {
    match step {
        Step::Map(f) => {
            let func = f.func.clone();
            map_items(input, mapped_type(eval_type), "map", move |v| func(v))
        }
        Step::StarMap(f) => {
            let func = f.func.clone();
            map_items(input, mapped_type(eval_type), "starmap", move |v| {
                func(&v.splat())
            })
        }
        Step::Filter(predicate) => {
            if eval_type == EvalType::Value {
                return LazyResult::failed(QueryError::evaluation(
                    "filter",
                    None,
                    "cannot filter a single value",
                ));
            }
            let predicate = predicate.clone();
            LazyResult::new(
                eval_type,
                Box::new(input.filter_map(move |entry| match entry {
                    Ok(Entry::Item(v)) => match keep(&predicate, &v) {
                        Ok(true) => Some(Ok(Entry::Item(v))),
                        Ok(false) => None,
                        Err(err) => Some(Err(err)),
                    },
                    other => Some(other),
                })),
            )
        }
        Step::Reduce { func, seed } => {
            // A single value is already reduced
            if eval_type == EvalType::Value {
                return input;
            }
            let (func, seed) = (func.clone(), seed.clone());
            LazyResult::new(
                EvalType::Value,
                Box::new(iter::once_with(move || {
                    fold(&func, seed.as_ref(), input.map(|e| e.and_then(item_of)))
                        .map(Entry::Item)
                })),
            )
        }
        Step::Apply(f) => {
            let f = f.clone();
            LazyResult::pending(move || {
                let mut input = input;
                let data = input.fetch()?;
                Ok(LazyResult::from_data(call_apply(&f, data)?))
            })
        }
        Step::Aggregate(op) => {
            let op = *op;
            LazyResult::new(
                EvalType::Value,
                Box::new(iter::once_with(move || {
                    let mut acc = op.accumulator();
                    for entry in input {
                        acc.push(item_of(entry?)?)?;
                    }
                    Ok(Entry::Item(acc.finish()))
                })),
            )
        }
        Step::Distinct => {
            if eval_type == EvalType::Value {
                return input;
            }
            let mut seen = HashSet::new();
            LazyResult::new(
                eval_type,
                Box::new(input.filter(move |entry| match entry {
                    Ok(Entry::Item(v)) => seen.insert(v.clone()),
                    _ => true,
                })),
            )
        }
        Step::Flatten => input,
        Step::Unwrap => {
            if eval_type == EvalType::Value {
                return input;
            }
            LazyResult::pending(move || unwrap_stream(eval_type, input))
        }
    }
}

/// `map` and `starmap` turn sets into lists
fn mapped_type(eval_type: EvalType) -> EvalType {
    match eval_type {
        EvalType::Value => EvalType::Value,
        _ => EvalType::List,
    }
}

fn map_items<F>(input: LazyResult, out: EvalType, op: &'static str, f: F) -> LazyResult
where
    F: Fn(&Value) -> UserResult<Value> + 'static,
{
    LazyResult::new(
        out,
        Box::new(input.map(move |entry| {
            let v = item_of(entry?)?;
            f(&v)
                .map(Entry::Item)
                .map_err(|e| QueryError::user_function(op, Some(&v), e))
        })),
    )
}

fn item_of(entry: Entry) -> QueryResult<Value> {
    match entry {
        Entry::Item(v) => Ok(v),
        Entry::Pair(key, _) => Err(QueryError::evaluation(
            "pipeline",
            Some(&key),
            "group in a non-grouping result",
        )),
    }
}

fn keep(predicate: &Predicate, value: &Value) -> QueryResult<bool> {
    predicate
        .matches(value)
        .map_err(|e| QueryError::user_function("filter", Some(value), e))
}

fn fold<I>(func: &Labeled<ReduceFn>, seed: Option<&Labeled<SeedFn>>, values: I) -> QueryResult<Value>
where
    I: IntoIterator<Item = QueryResult<Value>>,
{
    let mut acc = seed.map(|s| (s.func)());
    for value in values {
        let value = value?;
        acc = Some(match acc {
            None => value,
            Some(prev) => (func.func)(&prev, &value)
                .map_err(|e| QueryError::user_function("reduce", Some(&value), e))?,
        });
    }
    acc.ok_or_else(|| {
        QueryError::evaluation("reduce", None, "reduce of an empty collection with no seed")
    })
}

fn call_apply(f: &Labeled<ApplyFn>, data: Data) -> QueryResult<Data> {
    (f.func)(data).map_err(|e| QueryError::user_function("apply", None, e))
}

/// A one-element stream becomes its bare element; others pass through
fn unwrap_stream(eval_type: EvalType, mut input: LazyResult) -> QueryResult<LazyResult> {
    let first = match input.next() {
        None => return Ok(input),
        Some(entry) => entry?,
    };
    let second = match input.next() {
        None => return Ok(LazyResult::from_data(Data::Value(item_of(first)?))),
        Some(entry) => entry?,
    };
    let head = vec![Ok(first), Ok(second)];
    Ok(LazyResult::new(eval_type, Box::new(head.into_iter().chain(input))))
}

/// Applies a step to one group's data
fn group_op(step: &Step, data: Data) -> QueryResult<Data> {
    match step {
        Step::Map(f) => map_data(data, "map", |v| (f.func)(v)),
        Step::StarMap(f) => map_data(data, "starmap", |v| (f.func)(&v.splat())),
        Step::Filter(predicate) => match data {
            Data::List(items) => Ok(Data::List(filter_values(predicate, items)?)),
            Data::Set(items) => Ok(Data::Set(
                filter_values(predicate, items.into_iter().collect())?
                    .into_iter()
                    .collect(),
            )),
            Data::Value(v) => Err(QueryError::evaluation(
                "filter",
                Some(&v),
                "cannot filter a single value",
            )),
            Data::Map(_) => Err(nested("filter")),
        },
        Step::Reduce { func, seed } => match data {
            Data::Value(v) => Ok(Data::Value(v)),
            Data::Map(_) => Err(nested("reduce")),
            other => Ok(Data::Value(fold(
                func,
                seed.as_ref(),
                other.into_values().into_iter().map(Ok),
            )?)),
        },
        Step::Apply(f) => call_apply(f, data),
        Step::Aggregate(op) => Ok(Data::Value(op.over(data.into_values())?)),
        Step::Distinct => match data {
            Data::List(items) => Ok(Data::List(
                items.into_iter().collect::<IndexSet<_>>().into_iter().collect(),
            )),
            other => Ok(other),
        },
        Step::Unwrap => match data.len() {
            Some(1) => Ok(Data::Value(
                data.into_values().into_iter().next().unwrap_or(Value::Null),
            )),
            _ => Ok(data),
        },
        Step::Flatten => Ok(data),
    }
}

fn map_data<F>(data: Data, op: &str, f: F) -> QueryResult<Data>
where
    F: Fn(&Value) -> UserResult<Value>,
{
    let call = |v: Value| f(&v).map_err(|e| QueryError::user_function(op, Some(&v), e));
    match data {
        Data::Value(v) => Ok(Data::Value(call(v)?)),
        Data::Map(_) => Err(nested(op)),
        other => Ok(Data::List(
            other
                .into_values()
                .into_iter()
                .map(call)
                .collect::<QueryResult<_>>()?,
        )),
    }
}

fn filter_values(predicate: &Predicate, items: Vec<Value>) -> QueryResult<Vec<Value>> {
    let mut kept = Vec::with_capacity(items.len());
    for v in items {
        if keep(predicate, &v)? {
            kept.push(v);
        }
    }
    Ok(kept)
}

fn nested(op: &str) -> QueryError {
    QueryError::evaluation(op, None, "nested groupings are not supported")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Aggregate;
    use std::sync::Arc;

    fn run(steps: &[Step], data: Data) -> QueryResult<Data> {
        let mut result = LazyResult::from_data(data);
        for step in steps {
            result = apply_step(step, result);
        }
        result.fetch()
    }

    fn grouped_data() -> Data {
        Data::map([
            (Value::tuple(["x", "foo"]), Data::list([20, 30])),
            (Value::tuple(["y", "bar"]), Data::list([20])),
        ])
    }

    fn map_step<F>(f: F) -> Step
    where
        F: Fn(&Value) -> UserResult<Value> + Send + Sync + 'static,
    {
        Step::Map(Labeled::new(Arc::new(f), "f".to_string()))
    }

    #[test]
    fn test_map_turns_set_into_list() {
        let step = map_step(|v| Ok(Value::Int(v.as_i64().unwrap_or(0) * 2)));
        let out = run(&[step], Data::set([1, 2])).unwrap();
        assert_eq!(out, Data::list([2, 4]));
    }

    #[test]
    fn test_map_per_group_keeps_keys() {
        let step = map_step(|v| Ok(Value::Int(v.as_i64().unwrap_or(0) + 1)));
        let out = run(&[step], grouped_data()).unwrap();
        assert_eq!(out.get(&Value::tuple(["x", "foo"])), Some(&Data::list([21, 31])));
    }

    #[test]
    fn test_map_error_aborts() {
        let step = map_step(|_| Err("boom".into()));
        let err = run(&[step], Data::list([1])).unwrap_err();
        assert!(err.to_string().contains("map"));
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn test_filter_single_value_fails() {
        let err = run(&[Step::Filter(Predicate::from(true))], Data::value(3)).unwrap_err();
        assert_eq!(err.code().code(), "ROWSHAPE_EVALUATION_TYPE");
    }

    #[test]
    fn test_aggregate_whole_and_per_group() {
        let sum = Step::Aggregate(Aggregate::Sum);
        assert_eq!(run(&[sum.clone()], Data::list([1, 2, 3])).unwrap(), Data::value(6));

        let out = run(&[sum], grouped_data()).unwrap();
        assert_eq!(out.get(&Value::tuple(["x", "foo"])), Some(&Data::value(50)));
    }

    #[test]
    fn test_flatten_concatenates_key_and_value() {
        let out = run(&[Step::Flatten], grouped_data()).unwrap();
        assert_eq!(
            out,
            Data::List(vec![
                Value::tuple([Value::text("x"), Value::text("foo"), Value::Int(20)]),
                Value::tuple([Value::text("x"), Value::text("foo"), Value::Int(30)]),
                Value::tuple([Value::text("y"), Value::text("bar"), Value::Int(20)]),
            ])
        );
        // Idempotent
        let twice = run(&[Step::Flatten, Step::Flatten], grouped_data()).unwrap();
        assert_eq!(twice, out);
    }

    #[test]
    fn test_unwrap_is_size_sensitive() {
        assert_eq!(run(&[Step::Unwrap], Data::list([1])).unwrap(), Data::value(1));
        assert_eq!(run(&[Step::Unwrap], Data::set([1])).unwrap(), Data::value(1));
        assert_eq!(run(&[Step::Unwrap], Data::list([1, 2])).unwrap(), Data::list([1, 2]));
        assert_eq!(run(&[Step::Unwrap], Data::set([1, 2])).unwrap(), Data::set([1, 2]));

        let out = run(&[Step::Unwrap], grouped_data()).unwrap();
        assert_eq!(out.get(&Value::tuple(["y", "bar"])), Some(&Data::value(20)));
        assert_eq!(out.get(&Value::tuple(["x", "foo"])), Some(&Data::list([20, 30])));
    }

    #[test]
    fn test_steps_after_unwrap_follow_the_resolved_shape() {
        let count = Step::Aggregate(Aggregate::Count);
        assert_eq!(
            run(&[Step::Unwrap, count.clone()], Data::list([1, 2])).unwrap(),
            Data::value(2)
        );
        assert_eq!(run(&[Step::Unwrap, count], Data::list([7])).unwrap(), Data::value(1));
    }

    #[test]
    fn test_distinct_preserves_first_seen_order() {
        let out = run(&[Step::Distinct], Data::list([3, 1, 3, 2, 1])).unwrap();
        assert_eq!(out, Data::list([3, 1, 2]));
    }

    #[test]
    fn test_reduce_with_and_without_seed() {
        let add: ReduceFn = Arc::new(|a: &Value, b: &Value| {
            Ok(Value::Int(a.as_i64().unwrap_or(0) + b.as_i64().unwrap_or(0)))
        });
        let step = Step::Reduce {
            func: Labeled::new(add.clone(), "add".to_string()),
            seed: None,
        };
        assert_eq!(run(&[step.clone()], Data::list([1, 2, 3])).unwrap(), Data::value(6));
        assert!(run(&[step], Data::List(Vec::new())).is_err());

        let seeded = Step::Reduce {
            func: Labeled::new(add, "add".to_string()),
            seed: Some(Labeled::new(Arc::new(|| Value::Int(100)), "seed".to_string())),
        };
        let out = run(&[seeded], grouped_data()).unwrap();
        assert_eq!(out.get(&Value::tuple(["y", "bar"])), Some(&Data::value(120)));
    }

    #[test]
    fn test_reduce_single_value_is_unchanged() {
        let add: ReduceFn = Arc::new(|a: &Value, b: &Value| {
            Ok(Value::Int(a.as_i64().unwrap_or(0) + b.as_i64().unwrap_or(0)))
        });
        let step = Step::Reduce {
            func: Labeled::new(add, "add".to_string()),
            seed: None,
        };
        assert_eq!(run(&[step.clone()], Data::value(5)).unwrap(), Data::value(5));

        let out = run(&[Step::Unwrap, step], grouped_data()).unwrap();
        assert_eq!(out.get(&Value::tuple(["x", "foo"])), Some(&Data::value(50)));
        assert_eq!(out.get(&Value::tuple(["y", "bar"])), Some(&Data::value(20)));
    }

    #[test]
    fn test_apply_on_whole_result() {
        let reverse: ApplyFn = Arc::new(|data: Data| {
            let mut items = data.into_values();
            items.reverse();
            Ok(Data::List(items))
        });
        let step = Step::Apply(Labeled::new(reverse, "reverse".to_string()));
        assert_eq!(run(&[step], Data::list([1, 2])).unwrap(), Data::list([2, 1]));
    }
}
