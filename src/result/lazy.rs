//! Single-pass lazy result
//!
//! State machine:
//!
//! ```text
//! Pending --(first access)--> Active --(source drained or error)--> Exhausted
//! ```
//!
//! `Pending` holds a deferred step whose output shape is only known once it
//! runs (`apply`, `unwrap`). `Active` owns the element source plus a
//! lookahead buffer filled by previews; buffered elements are always handed
//! out before new ones are pulled. `Exhausted` is terminal.

use std::collections::VecDeque;
use std::fmt;
use std::iter;

use indexmap::{IndexMap, IndexSet};

use super::entry::{entries_of, Entry, EvalType};
use crate::observability::{Event, Logger};
use crate::query::{QueryError, QueryResult};
use crate::value::{pretty_lines, Data, Value};

/// Boxed element source
pub type EntryIter = Box<dyn Iterator<Item = QueryResult<Entry>>>;

type Thunk = Box<dyn FnOnce() -> QueryResult<LazyResult>>;

enum State {
    Pending(Thunk),
    Active {
        eval_type: EvalType,
        buffer: VecDeque<Entry>,
        source: iter::Fuse<EntryIter>,
    },
    Exhausted {
        eval_type: Option<EvalType>,
    },
}

/// Bounded rendering of the first elements of a result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    pub lines: Vec<String>,
    /// More output exists beyond `lines`
    pub truncated: bool,
}

/// A single-pass result of evaluating a query.
///
/// Iterating pulls one element at a time; each element is handed out once.
/// Not safe for concurrent consumption: materialize with
/// [`LazyResult::fetch`] and share the [`Data`] instead.
pub struct LazyResult {
    state: State,
}

impl LazyResult {
    pub fn new(eval_type: EvalType, source: EntryIter) -> Self {
        Self {
            state: State::Active {
                eval_type,
                buffer: VecDeque::new(),
                source: source.fuse(),
            },
        }
    }

    /// Result over already-materialized data
    pub fn from_data(data: Data) -> Self {
        let eval_type = EvalType::of(&data);
        let entries = entries_of(data);
        Self::new(eval_type, Box::new(entries.into_iter().map(Ok)))
    }

    /// Result whose shape is decided by `thunk` on first access
    pub fn pending<F>(thunk: F) -> Self
    where
        F: FnOnce() -> QueryResult<LazyResult> + 'static,
    {
        Self {
            state: State::Pending(Box::new(thunk)),
        }
    }

    /// Result that fails with `err` on first access
    pub fn failed(err: QueryError) -> Self {
        Self::pending(move || Err(err))
    }

    /// Declared container type, `None` while still pending
    pub fn eval_type(&self) -> Option<EvalType> {
        match &self.state {
            State::Pending(_) => None,
            State::Active { eval_type, .. } => Some(*eval_type),
            State::Exhausted { eval_type } => *eval_type,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, State::Pending(_))
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self.state, State::Exhausted { .. })
    }

    /// Runs any pending step, returning a result with a known type
    pub fn force(mut self) -> QueryResult<LazyResult> {
        self.resolve()?;
        Ok(self)
    }

    fn resolve(&mut self) -> QueryResult<()> {
        loop {
            let state = std::mem::replace(&mut self.state, State::Exhausted { eval_type: None });
            match state {
                State::Pending(thunk) => match thunk() {
                    Ok(next) => self.state = next.state,
                    Err(err) => {
                        Self::log_failure(&err);
                        return Err(err);
                    }
                },
                other => {
                    self.state = other;
                    return Ok(());
                }
            }
        }
    }

    fn exhaust(&mut self, eval_type: EvalType) {
        self.state = State::Exhausted {
            eval_type: Some(eval_type),
        };
        Logger::emit(Event::ResultExhausted, &[("eval_type", eval_type.as_str())]);
    }

    fn log_failure(err: &QueryError) {
        Logger::emit(
            Event::EvaluationFailed,
            &[("code", err.code().code()), ("message", &err.to_string())],
        );
    }

    /// Drains the result into its declared container.
    ///
    /// Destructive: a second call returns an empty container (or null for
    /// a single-value result).
    pub fn fetch(&mut self) -> QueryResult<Data> {
        self.resolve()?;
        let eval_type = self.eval_type().unwrap_or(EvalType::Value);

        match eval_type {
            EvalType::Value => {
                let mut first = None;
                for entry in self.by_ref() {
                    let value = item(entry?)?;
                    first.get_or_insert(value);
                }
                Ok(Data::Value(first.unwrap_or(Value::Null)))
            }
            EvalType::List => {
                let mut items = Vec::new();
                for entry in self.by_ref() {
                    items.push(item(entry?)?);
                }
                Ok(Data::List(items))
            }
            EvalType::Set => {
                let mut items = IndexSet::new();
                for entry in self.by_ref() {
                    items.insert(item(entry?)?);
                }
                Ok(Data::Set(items))
            }
            EvalType::Map => {
                let mut groups = IndexMap::new();
                for entry in self.by_ref() {
                    match entry? {
                        Entry::Pair(key, value) => {
                            groups.insert(key, value);
                        }
                        Entry::Item(v) => {
                            return Err(QueryError::evaluation(
                                "fetch",
                                Some(&v),
                                "element outside a group in a grouping result",
                            ))
                        }
                    }
                }
                Ok(Data::Map(groups))
            }
        }
    }

    /// Renders at most `max_lines` lines of the result without losing any
    /// element: entries pulled for the preview stay buffered and are
    /// returned first by later iteration or [`LazyResult::fetch`].
    ///
    /// An empty result renders as an explicit empty container.
    pub fn preview(&mut self, max_lines: usize, width: usize) -> QueryResult<Preview> {
        self.resolve()?;
        let max_lines = max_lines.max(1);
        let eval_type = self.eval_type().unwrap_or(EvalType::Value);

        loop {
            let mut lines = pretty_lines(&self.buffered(eval_type), width);
            if lines.len() > max_lines {
                lines.truncate(max_lines);
                if let Some(last) = lines.last_mut() {
                    let padding = last.len() - last.trim_start().len();
                    *last = format!("{}...", " ".repeat(padding));
                }
                Logger::emit(Event::PreviewBuilt, &[("truncated", "true")]);
                return Ok(Preview {
                    lines,
                    truncated: true,
                });
            }
            if !self.pull_into_buffer()? {
                Logger::emit(Event::PreviewBuilt, &[("truncated", "false")]);
                return Ok(Preview {
                    lines,
                    truncated: false,
                });
            }
        }
    }

    /// Materializes a copy of the buffered prefix
    fn buffered(&self, eval_type: EvalType) -> Data {
        let buffer: Vec<Entry> = match &self.state {
            State::Active { buffer, .. } => buffer.iter().cloned().collect(),
            _ => Vec::new(),
        };
        if eval_type == EvalType::Map {
            return Data::Map(
                buffer
                    .into_iter()
                    .filter_map(|e| match e {
                        Entry::Pair(k, v) => Some((k, v)),
                        Entry::Item(_) => None,
                    })
                    .collect(),
            );
        }

        let mut values = buffer.into_iter().filter_map(|e| match e {
            Entry::Item(v) => Some(v),
            Entry::Pair(..) => None,
        });
        match eval_type {
            EvalType::Value => Data::Value(values.next().unwrap_or(Value::Null)),
            EvalType::Set => Data::Set(values.collect()),
            _ => Data::List(values.collect()),
        }
    }

    /// Pulls one entry from the source into the lookahead buffer.
    ///
    /// Returns false once the source is drained.
    fn pull_into_buffer(&mut self) -> QueryResult<bool> {
        let (eval_type, pulled) = match &mut self.state {
            State::Active {
                eval_type, source, ..
            } => (*eval_type, source.next()),
            _ => return Ok(false),
        };
        match pulled {
            Some(Ok(entry)) => {
                if let State::Active { buffer, .. } = &mut self.state {
                    buffer.push_back(entry);
                }
                Ok(true)
            }
            Some(Err(err)) => {
                self.exhaust(eval_type);
                Self::log_failure(&err);
                Err(err)
            }
            None => Ok(false),
        }
    }
}

fn item(entry: Entry) -> QueryResult<Value> {
    match entry {
        Entry::Item(v) => Ok(v),
        Entry::Pair(key, _) => Err(QueryError::evaluation(
            "fetch",
            Some(&key),
            "group in a non-grouping result",
        )),
    }
}

impl Iterator for LazyResult {
    type Item = QueryResult<Entry>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Err(err) = self.resolve() {
            return Some(Err(err));
        }
        let (eval_type, pulled) = match &mut self.state {
            State::Active {
                eval_type,
                buffer,
                source,
            } => {
                if let Some(entry) = buffer.pop_front() {
                    return Some(Ok(entry));
                }
                (*eval_type, source.next())
            }
            _ => return None,
        };
        match pulled {
            Some(Ok(entry)) => Some(Ok(entry)),
            Some(Err(err)) => {
                self.exhaust(eval_type);
                Self::log_failure(&err);
                Some(Err(err))
            }
            None => {
                self.exhaust(eval_type);
                None
            }
        }
    }
}

impl fmt::Debug for LazyResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &self.state {
            State::Pending(_) => "pending",
            State::Active { .. } => "active",
            State::Exhausted { .. } => "exhausted",
        };
        f.debug_struct("LazyResult")
            .field("eval_type", &self.eval_type())
            .field("state", &state)
            .finish()
    }
}
