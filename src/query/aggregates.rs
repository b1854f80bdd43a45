//! Aggregate functions
//!
//! All aggregates skip nulls. `sum` and `avg` coerce elements to numbers
//! (see [`coerce_number`]); `min` and `max` use natural ordering. Over no
//! contributing element, every aggregate but `count` yields null.

use std::cmp::Ordering;

use super::errors::{QueryError, QueryResult};
use crate::value::{coerce_number, Number, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    Sum,
    Count,
    Avg,
    Min,
    Max,
}

impl Aggregate {
    pub fn name(&self) -> &'static str {
        match self {
            Aggregate::Sum => "sum",
            Aggregate::Count => "count",
            Aggregate::Avg => "avg",
            Aggregate::Min => "min",
            Aggregate::Max => "max",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "sum" => Some(Aggregate::Sum),
            "count" => Some(Aggregate::Count),
            "avg" => Some(Aggregate::Avg),
            "min" => Some(Aggregate::Min),
            "max" => Some(Aggregate::Max),
            _ => None,
        }
    }

    pub fn accumulator(&self) -> Accumulator {
        Accumulator {
            op: *self,
            count: 0,
            total: None,
            best: None,
        }
    }

    /// Aggregates a whole collection
    pub fn over<I>(&self, values: I) -> QueryResult<Value>
    where
        I: IntoIterator<Item = Value>,
    {
        let mut acc = self.accumulator();
        for value in values {
            acc.push(value)?;
        }
        Ok(acc.finish())
    }
}

/// Streaming state of one aggregate
#[derive(Debug, Clone)]
pub struct Accumulator {
    op: Aggregate,
    count: usize,
    total: Option<Number>,
    best: Option<Value>,
}

impl Accumulator {
    pub fn push(&mut self, value: Value) -> QueryResult<()> {
        if value.is_null() {
            return Ok(());
        }
        match self.op {
            Aggregate::Count => self.count += 1,
            Aggregate::Sum | Aggregate::Avg => {
                let number = coerce_number(&value).map_err(|e| {
                    QueryError::evaluation(self.op.name(), Some(&e.value), "not a number")
                })?;
                if let Some(n) = number {
                    self.total = Some(match self.total {
                        Some(total) => total.add(n),
                        None => n,
                    });
                    self.count += 1;
                }
            }
            Aggregate::Min | Aggregate::Max => {
                let replace = match &self.best {
                    None => true,
                    Some(best) => {
                        let ord = value.natural_cmp(best).ok_or_else(|| {
                            QueryError::evaluation(
                                self.op.name(),
                                Some(&value),
                                format!("cannot compare with {}", best),
                            )
                        })?;
                        match self.op {
                            Aggregate::Min => ord == Ordering::Less,
                            _ => ord == Ordering::Greater,
                        }
                    }
                };
                if replace {
                    self.best = Some(value);
                }
            }
        }
        Ok(())
    }

    pub fn finish(self) -> Value {
        match self.op {
            Aggregate::Count => Value::Int(self.count as i64),
            Aggregate::Sum => self.total.map(Value::from).unwrap_or(Value::Null),
            Aggregate::Avg => match self.total {
                Some(total) if self.count > 0 => Value::Float(total.to_f64() / self.count as f64),
                _ => Value::Null,
            },
            Aggregate::Min | Aggregate::Max => self.best.unwrap_or(Value::Null),
        }
    }
}
