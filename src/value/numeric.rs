//! Numeric coercion for `sum` and `avg`
//!
//! The conversion contract is narrow:
//! - Int and Float pass through, Bool becomes 1 or 0
//! - Text is trimmed, then parsed as an integer, then as a float
//! - Text that is empty after trimming counts as missing
//! - Non-finite results ("nan", "inf") and everything else are errors

use thiserror::Error;

use super::value::Value;

/// A value that took part in numeric aggregation
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn to_f64(self) -> f64 {
        match self {
            Number::Int(i) => i as f64,
            Number::Float(f) => f,
        }
    }

    /// Adds two numbers, staying integral until a float or an overflow
    /// forces promotion.
    pub fn add(self, other: Number) -> Number {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => match a.checked_add(b) {
                Some(sum) => Number::Int(sum),
                None => Number::Float(a as f64 + b as f64),
            },
            (a, b) => Number::Float(a.to_f64() + b.to_f64()),
        }
    }
}

impl From<Number> for Value {
    fn from(n: Number) -> Self {
        match n {
            Number::Int(i) => Value::Int(i),
            Number::Float(f) => Value::Float(f),
        }
    }
}

/// A value that cannot take part in numeric aggregation
#[derive(Debug, Clone, Error)]
#[error("cannot convert {value} to a number")]
pub struct NumericError {
    pub value: Value,
}

/// Coerces a value to a number.
///
/// Returns `Ok(None)` for values that count as missing (null and blank
/// text) so that aggregates can skip them.
pub fn coerce_number(value: &Value) -> Result<Option<Number>, NumericError> {
    match value {
        Value::Null => Ok(None),
        Value::Bool(b) => Ok(Some(Number::Int(i64::from(*b)))),
        Value::Int(i) => Ok(Some(Number::Int(*i))),
        Value::Float(f) => Ok(Some(Number::Float(*f))),
        Value::Text(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            if let Ok(i) = trimmed.parse::<i64>() {
                return Ok(Some(Number::Int(i)));
            }
            match trimmed.parse::<f64>() {
                Ok(f) if f.is_finite() => Ok(Some(Number::Float(f))),
                _ => Err(NumericError {
                    value: value.clone(),
                }),
            }
        }
        Value::Tuple(_) | Value::List(_) | Value::Set(_) => Err(NumericError {
            value: value.clone(),
        }),
    }
}
