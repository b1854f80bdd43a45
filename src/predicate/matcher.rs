//! Predicate specifications and matching

use std::fmt;
use std::sync::Arc;

use regex::Regex;

use crate::query::{QueryError, QueryResult, UserResult};
use crate::value::{Value, ValueType};

/// A user-supplied object with its own match contract.
pub trait Matcher: Send + Sync {
    /// Returns whether `value` satisfies this matcher
    fn matches(&self, value: &Value) -> UserResult<bool>;

    /// Short description used in query and plan rendering
    fn describe(&self) -> String {
        "<matcher>".to_string()
    }
}

type MatchFn = dyn Fn(&Value) -> UserResult<bool> + Send + Sync;

/// A match specification
#[derive(Clone)]
pub enum Predicate {
    /// Wildcard: matches every value
    Any,
    /// Equality with a value; `Bool` literals test truthiness
    Literal(Value),
    /// Instance-of test
    Type(ValueType),
    /// Matches if any alternative matches
    OneOf(Vec<Predicate>),
    /// Element-wise match of a tuple value of the same arity
    Tuple(Vec<Predicate>),
    /// Text values matching a regular expression
    Regex(Regex),
    /// Callable returning the match decision
    Callable(Arc<MatchFn>),
    /// User matcher object
    Matcher(Arc<dyn Matcher>),
    /// Inverted specification
    Not(Box<Predicate>),
}

impl Predicate {
    pub fn any() -> Self {
        Predicate::Any
    }

    pub fn literal(value: impl Into<Value>) -> Self {
        Predicate::Literal(value.into())
    }

    pub fn one_of<I, P>(alternatives: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Predicate>,
    {
        Predicate::OneOf(alternatives.into_iter().map(Into::into).collect())
    }

    pub fn tuple<I, P>(items: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Predicate>,
    {
        Predicate::Tuple(items.into_iter().map(Into::into).collect())
    }

    /// Compiles a regular expression predicate
    pub fn regex(pattern: &str) -> QueryResult<Self> {
        Regex::new(pattern)
            .map(Predicate::Regex)
            .map_err(|e| QueryError::invalid_argument(format!("bad regex {:?}: {}", pattern, e)))
    }

    /// Wraps a fallible function
    pub fn func<F>(f: F) -> Self
    where
        F: Fn(&Value) -> UserResult<bool> + Send + Sync + 'static,
    {
        Predicate::Callable(Arc::new(f))
    }

    /// Wraps an infallible test
    pub fn test<F>(f: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Predicate::Callable(Arc::new(move |v: &Value| Ok(f(v))))
    }

    pub fn matcher(m: impl Matcher + 'static) -> Self {
        Predicate::Matcher(Arc::new(m))
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(inner: impl Into<Predicate>) -> Self {
        Predicate::Not(Box::new(inner.into()))
    }

    /// Returns whether `value` satisfies this specification.
    ///
    /// Only user matchers and callables can fail; their errors are
    /// returned as-is.
    pub fn matches(&self, value: &Value) -> UserResult<bool> {
        match self {
            Predicate::Matcher(m) => m.matches(value),
            Predicate::Callable(f) => f(value),
            Predicate::OneOf(alternatives) => {
                for alt in alternatives {
                    if alt.matches(value)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Predicate::Tuple(items) => match value {
                Value::Tuple(values) if values.len() == items.len() => {
                    for (item, v) in items.iter().zip(values) {
                        if !item.matches(v)? {
                            return Ok(false);
                        }
                    }
                    Ok(true)
                }
                _ => Ok(false),
            },
            Predicate::Type(ty) => Ok(ty.matches(value)),
            Predicate::Literal(Value::Bool(expected)) => Ok(value.is_truthy() == *expected),
            Predicate::Literal(expected) => Ok(value == expected),
            Predicate::Regex(re) => Ok(value.as_str().map(|s| re.is_match(s)).unwrap_or(false)),
            Predicate::Any => Ok(true),
            Predicate::Not(inner) => Ok(!inner.matches(value)?),
        }
    }

    /// Parses a predicate from its JSON request form.
    ///
    /// Scalars are literals, arrays are alternatives, and objects select
    /// one of `not`, `regex`, `type`, `tuple` or `any`.
    pub fn from_json(json: &serde_json::Value) -> QueryResult<Self> {
        use serde_json::Value as Json;

        match json {
            Json::Array(items) => Ok(Predicate::OneOf(
                items.iter().map(Predicate::from_json).collect::<QueryResult<_>>()?,
            )),
            Json::Object(obj) => {
                if obj.len() != 1 {
                    return Err(QueryError::invalid_argument(format!(
                        "predicate object must have exactly one key, got {}",
                        json
                    )));
                }
                let (key, inner) = obj
                    .iter()
                    .next()
                    .ok_or_else(|| QueryError::invalid_argument("empty predicate object"))?;
                match key.as_str() {
                    "not" => Ok(Predicate::not(Predicate::from_json(inner)?)),
                    "any" => Ok(Predicate::Any),
                    "regex" => match inner.as_str() {
                        Some(pattern) => Predicate::regex(pattern),
                        None => Err(QueryError::invalid_argument("regex must be a string")),
                    },
                    "type" => inner
                        .as_str()
                        .and_then(ValueType::parse)
                        .map(Predicate::Type)
                        .ok_or_else(|| {
                            QueryError::invalid_argument(format!("unknown type {}", inner))
                        }),
                    "tuple" => match inner.as_array() {
                        Some(items) => Ok(Predicate::Tuple(
                            items.iter().map(Predicate::from_json).collect::<QueryResult<_>>()?,
                        )),
                        None => Err(QueryError::invalid_argument("tuple must be an array")),
                    },
                    other => Err(QueryError::invalid_argument(format!(
                        "unknown predicate form {:?}",
                        other
                    ))),
                }
            }
            scalar => Ok(Predicate::Literal(Value::from(scalar.clone()))),
        }
    }
}

impl From<Value> for Predicate {
    fn from(v: Value) -> Self {
        Predicate::Literal(v)
    }
}

impl From<&str> for Predicate {
    fn from(s: &str) -> Self {
        Predicate::Literal(Value::text(s))
    }
}

impl From<String> for Predicate {
    fn from(s: String) -> Self {
        Predicate::Literal(Value::Text(s))
    }
}

impl From<i64> for Predicate {
    fn from(i: i64) -> Self {
        Predicate::Literal(Value::Int(i))
    }
}

impl From<i32> for Predicate {
    fn from(i: i32) -> Self {
        Predicate::Literal(Value::Int(i as i64))
    }
}

impl From<bool> for Predicate {
    fn from(b: bool) -> Self {
        Predicate::Literal(Value::Bool(b))
    }
}

impl From<ValueType> for Predicate {
    fn from(ty: ValueType) -> Self {
        Predicate::Type(ty)
    }
}

impl From<Regex> for Predicate {
    fn from(re: Regex) -> Self {
        Predicate::Regex(re)
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Any => write!(f, "ANY"),
            Predicate::Literal(v) => write!(f, "{}", v),
            Predicate::Type(ty) => write!(f, "{}", ty),
            Predicate::OneOf(alternatives) => {
                write!(f, "[")?;
                for (i, alt) in alternatives.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", alt)?;
                }
                write!(f, "]")
            }
            Predicate::Tuple(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            }
            Predicate::Regex(re) => write!(f, "re{:?}", re.as_str()),
            Predicate::Callable(_) => write!(f, "<function>"),
            Predicate::Matcher(m) => write!(f, "{}", m.describe()),
            Predicate::Not(inner) => write!(f, "not({})", inner),
        }
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Predicate({})", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_literal_equality_no_coercion() {
        let pred = Predicate::from("foo");
        assert!(pred.matches(&Value::text("foo")).unwrap());
        assert!(!pred.matches(&Value::text("bar")).unwrap());

        let pred = Predicate::from(20);
        assert!(!pred.matches(&Value::text("20")).unwrap());
        assert!(pred.matches(&Value::Int(20)).unwrap());
    }

    #[test]
    fn test_bool_literal_tests_truthiness() {
        let truthy = Predicate::from(true);
        assert!(truthy.matches(&Value::text("x")).unwrap());
        assert!(truthy.matches(&Value::Int(5)).unwrap());
        assert!(!truthy.matches(&Value::text("")).unwrap());

        let falsy = Predicate::from(false);
        assert!(falsy.matches(&Value::Int(0)).unwrap());
        assert!(falsy.matches(&Value::Null).unwrap());
    }

    #[test]
    fn test_alternatives() {
        let pred = Predicate::one_of(["x", "y"]);
        assert!(pred.matches(&Value::text("y")).unwrap());
        assert!(!pred.matches(&Value::text("z")).unwrap());
    }

    #[test]
    fn test_type_and_wildcard() {
        assert!(Predicate::from(ValueType::Int).matches(&Value::Int(1)).unwrap());
        assert!(!Predicate::from(ValueType::Int).matches(&Value::text("1")).unwrap());
        assert!(Predicate::any().matches(&Value::Null).unwrap());
    }

    #[test]
    fn test_inversion() {
        let pred = Predicate::not("foo");
        assert!(!pred.matches(&Value::text("foo")).unwrap());
        assert!(pred.matches(&Value::text("bar")).unwrap());
    }

    #[test]
    fn test_tuple_predicate_with_wildcard() {
        let pred = Predicate::tuple([Predicate::from("x"), Predicate::any()]);
        assert!(pred.matches(&Value::tuple(["x", "foo"])).unwrap());
        assert!(!pred.matches(&Value::tuple(["y", "foo"])).unwrap());
        assert!(!pred.matches(&Value::tuple(["x"])).unwrap());
    }

    #[test]
    fn test_regex() {
        let pred = Predicate::regex("^f").unwrap();
        assert!(pred.matches(&Value::text("foo")).unwrap());
        assert!(!pred.matches(&Value::Int(1)).unwrap());
        assert!(Predicate::regex("(").is_err());
    }

    struct Failing;

    impl Matcher for Failing {
        fn matches(&self, _: &Value) -> UserResult<bool> {
            Err("matcher exploded".into())
        }
    }

    #[test]
    fn test_matcher_error_propagates() {
        let pred = Predicate::matcher(Failing);
        let err = pred.matches(&Value::Int(1)).unwrap_err();
        assert_eq!(err.to_string(), "matcher exploded");

        // Inside alternatives too: no silent swallowing
        let pred = Predicate::OneOf(vec![Predicate::matcher(Failing), Predicate::Any]);
        assert!(pred.matches(&Value::Int(1)).is_err());
    }

    #[test]
    fn test_callable() {
        let pred = Predicate::test(|v| v.as_i64().map(|i| i > 10).unwrap_or(false));
        assert!(pred.matches(&Value::Int(20)).unwrap());
        assert!(!pred.matches(&Value::Int(5)).unwrap());
    }

    #[test]
    fn test_from_json() {
        let pred = Predicate::from_json(&json!(["foo", "bar"])).unwrap();
        assert!(pred.matches(&Value::text("bar")).unwrap());

        let pred = Predicate::from_json(&json!({"not": "foo"})).unwrap();
        assert!(!pred.matches(&Value::text("foo")).unwrap());

        let pred = Predicate::from_json(&json!({"type": "int"})).unwrap();
        assert!(pred.matches(&Value::Int(3)).unwrap());

        assert!(Predicate::from_json(&json!({"bogus": 1})).is_err());
    }
}
