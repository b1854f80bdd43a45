//! Scalar and element values

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use indexmap::IndexSet;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A single data element.
///
/// Row cells are always scalars (`Null`, `Bool`, `Int`, `Float`, `Text`).
/// `Tuple` is a fixed-arity projection of several fields; `List` and `Set`
/// are inner containers requested explicitly by a selection.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Tuple(Vec<Value>),
    List(Vec<Value>),
    Set(ValueSet),
}

/// Runtime type of a [`Value`], used by type predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Null,
    Bool,
    Int,
    Float,
    /// Either `Int` or `Float`
    Number,
    Text,
    Tuple,
    List,
    Set,
}

impl ValueType {
    /// Returns true if `value` is an instance of this type
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (ValueType::Number, Value::Int(_) | Value::Float(_)) => true,
            (ValueType::Number, _) => false,
            _ => value.value_type() == *self,
        }
    }

    /// Parses a type name as used in JSON requests
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "null" => Some(ValueType::Null),
            "bool" => Some(ValueType::Bool),
            "int" => Some(ValueType::Int),
            "float" => Some(ValueType::Float),
            "number" => Some(ValueType::Number),
            "text" | "str" => Some(ValueType::Text),
            "tuple" => Some(ValueType::Tuple),
            "list" => Some(ValueType::List),
            "set" => Some(ValueType::Set),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::Null => "null",
            ValueType::Bool => "bool",
            ValueType::Int => "int",
            ValueType::Float => "float",
            ValueType::Number => "number",
            ValueType::Text => "text",
            ValueType::Tuple => "tuple",
            ValueType::List => "list",
            ValueType::Set => "set",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Value {
    /// Creates a text value
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    /// Creates a tuple value
    pub fn tuple<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Value::Tuple(items.into_iter().map(Into::into).collect())
    }

    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Null => ValueType::Null,
            Value::Bool(_) => ValueType::Bool,
            Value::Int(_) => ValueType::Int,
            Value::Float(_) => ValueType::Float,
            Value::Text(_) => ValueType::Text,
            Value::Tuple(_) => ValueType::Tuple,
            Value::List(_) => ValueType::List,
            Value::Set(_) => ValueType::Set,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Truthiness as used by `true`/`false` predicates and `filter_truthy`.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Text(s) => !s.is_empty(),
            Value::Tuple(items) | Value::List(items) => !items.is_empty(),
            Value::Set(set) => !set.is_empty(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Elements of a tuple value, or the value itself as a one-item slice.
    ///
    /// Used by `starmap` and `flatten` to splice values into argument
    /// lists and rows.
    pub fn splat(&self) -> Vec<Value> {
        match self {
            Value::Tuple(items) => items.clone(),
            other => vec![other.clone()],
        }
    }

    /// Plain rendering for delimited text and JSON object keys.
    ///
    /// Text is written verbatim and null becomes the empty string.
    pub fn render_plain(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Text(s) => s.clone(),
            Value::Float(f) => format!("{:?}", f),
            other => other.to_string(),
        }
    }

    /// Key used when a grouping map is rendered as a JSON object.
    pub fn to_key_string(&self) -> String {
        match self {
            Value::Tuple(_) | Value::List(_) | Value::Set(_) => {
                serde_json::to_string(self).unwrap_or_else(|_| self.to_string())
            }
            other => other.render_plain(),
        }
    }

    /// Natural comparison used by `min`/`max`.
    ///
    /// Numbers compare with numbers, text with text, bools with bools and
    /// tuples element-wise. Any other pairing is incomparable.
    pub fn natural_cmp(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Null, Value::Null) => Some(Ordering::Equal),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
                Some(numeric_cmp(self, other))
            }
            (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
            (Value::Tuple(a), Value::Tuple(b)) => {
                for (x, y) in a.iter().zip(b.iter()) {
                    match x.natural_cmp(y)? {
                        Ordering::Equal => continue,
                        ord => return Some(ord),
                    }
                }
                Some(a.len().cmp(&b.len()))
            }
            _ => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Int(_) | Value::Float(_) => 2,
            Value::Text(_) => 3,
            Value::Tuple(_) => 4,
            Value::List(_) => 5,
            Value::Set(_) => 6,
        }
    }
}

/// Canonical float: all NaNs collapse to one, negative zero to zero.
fn canonical(f: f64) -> f64 {
    if f.is_nan() {
        f64::NAN
    } else if f == 0.0 {
        0.0
    } else {
        f
    }
}

/// Integral floats in `i64` range hash and compare like the equal integer.
fn integral(f: f64) -> Option<i64> {
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

/// Exact integer to float comparison; NaN sorts above every number.
fn int_float_cmp(x: i64, y: f64) -> Ordering {
    // 2^63, exactly representable
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    if y.is_nan() || y >= LIMIT {
        return Ordering::Less;
    }
    if y < -LIMIT {
        return Ordering::Greater;
    }
    let whole = y.trunc();
    match x.cmp(&(whole as i64)) {
        Ordering::Equal => {
            let frac = y - whole;
            if frac > 0.0 {
                Ordering::Less
            } else if frac < 0.0 {
                Ordering::Greater
            } else {
                Ordering::Equal
            }
        }
        ord => ord,
    }
}

fn numeric_cmp(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => x.cmp(y),
        (Value::Int(x), Value::Float(y)) => int_float_cmp(*x, *y),
        (Value::Float(x), Value::Int(y)) => int_float_cmp(*y, *x).reverse(),
        (Value::Float(x), Value::Float(y)) => canonical(*x).total_cmp(&canonical(*y)),
        _ => Ordering::Equal,
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => {
                canonical(*a).to_bits() == canonical(*b).to_bits()
            }
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                integral(*b) == Some(*a)
            }
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Tuple(a), Value::Tuple(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Set(a), Value::Set(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            Value::Null => {}
            Value::Bool(b) => b.hash(state),
            Value::Int(i) => i.hash(state),
            Value::Float(f) => match integral(*f) {
                Some(i) => i.hash(state),
                None => canonical(*f).to_bits().hash(state),
            },
            Value::Text(s) => s.hash(state),
            Value::Tuple(items) => {
                0u8.hash(state);
                items.hash(state);
            }
            Value::List(items) => {
                1u8.hash(state);
                items.hash(state);
            }
            Value::Set(set) => set.hash(state),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        let by_rank = self.rank().cmp(&other.rank());
        if by_rank != Ordering::Equal {
            return by_rank;
        }
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (Value::Tuple(a), Value::Tuple(b)) | (Value::List(a), Value::List(b)) => a.cmp(b),
            (Value::Set(a), Value::Set(b)) => a.sorted().cmp(&b.sorted()),
            (Value::Null, Value::Null) => Ordering::Equal,
            _ => numeric_cmp(self, other),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{:?}", x),
            Value::Text(s) => write!(f, "{:?}", s),
            Value::Tuple(items) => {
                write!(f, "(")?;
                write_items(f, items.iter())?;
                if items.len() == 1 {
                    write!(f, ",")?;
                }
                write!(f, ")")
            }
            Value::List(items) => {
                write!(f, "[")?;
                write_items(f, items.iter())?;
                write!(f, "]")
            }
            Value::Set(set) => {
                write!(f, "{{")?;
                write_items(f, set.iter())?;
                write!(f, "}}")
            }
        }
    }
}

fn write_items<'a>(
    f: &mut fmt::Formatter<'_>,
    items: impl Iterator<Item = &'a Value>,
) -> fmt::Result {
    for (i, item) in items.enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map(Into::into).unwrap_or(Value::Null)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::Text(s),
            serde_json::Value::Array(items) => {
                Value::Tuple(items.into_iter().map(Value::from).collect())
            }
            other @ serde_json::Value::Object(_) => Value::Text(other.to_string()),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Tuple(items) | Value::List(items) => serializer.collect_seq(items.iter()),
            Value::Set(set) => serializer.collect_seq(set.iter()),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Value::from)
    }
}

/// Insertion-ordered set of values whose equality and hash ignore order.
#[derive(Debug, Clone, Default)]
pub struct ValueSet(IndexSet<Value>);

impl ValueSet {
    pub fn new() -> Self {
        Self(IndexSet::new())
    }

    /// Inserts a value, returning false if it was already present
    pub fn insert(&mut self, value: Value) -> bool {
        self.0.insert(value)
    }

    pub fn contains(&self, value: &Value) -> bool {
        self.0.contains(value)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.0.iter()
    }

    /// Elements in total order, independent of insertion order
    pub fn sorted(&self) -> Vec<&Value> {
        let mut items: Vec<&Value> = self.0.iter().collect();
        items.sort();
        items
    }

}

impl PartialEq for ValueSet {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for ValueSet {}

impl Hash for ValueSet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.len().hash(state);
        for item in self.sorted() {
            item.hash(state);
        }
    }
}

impl FromIterator<Value> for ValueSet {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<IndexSet<Value>> for ValueSet {
    fn from(set: IndexSet<Value>) -> Self {
        Self(set)
    }
}
