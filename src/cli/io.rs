//! JSON I/O handling for CLI
//!
//! - Input: a single JSON request object on stdin
//! - Output: a single JSON object on stdout, or plain text for `preview`,
//!   `explain` and `csv`
//! - UTF-8 only

use std::io::{self, Read, Write};
use std::sync::Arc;

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value as Json;

use super::errors::{CliError, CliResult};
use crate::predicate::{Predicate, Where};
use crate::query::Query;
use crate::shape::Selection;
use crate::source::MemorySource;
use crate::value::Value;

/// A query over inline rows
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Request {
    pub fieldnames: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Vec<Value>>,
    pub select: Json,
    #[serde(default, rename = "where")]
    pub constraints: IndexMap<String, Json>,
    #[serde(default)]
    pub steps: Vec<Json>,
}

impl Request {
    pub fn parse(input: &str) -> CliResult<Self> {
        if input.trim().is_empty() {
            return Err(CliError::io_error("Empty input"));
        }
        Ok(serde_json::from_str(input)?)
    }

    /// Builds the query: source, selection, constraints, then steps in
    /// order
    pub fn into_query(self) -> CliResult<Query> {
        let source = MemorySource::new(self.fieldnames, self.rows)?;
        let selection = Selection::from_json(&self.select)?;

        let mut filters = Where::new();
        for (field, spec) in &self.constraints {
            filters.set(field.clone(), Predicate::from_json(spec)?);
        }

        let mut query = Query::select_where(Arc::new(source), selection, filters)?;
        for step in &self.steps {
            query = push_step(&query, step)?;
        }
        Ok(query)
    }
}

fn push_step(query: &Query, step: &Json) -> CliResult<Query> {
    match step {
        Json::String(name) => match name.as_str() {
            "sum" => Ok(query.sum()),
            "count" => Ok(query.count()),
            "avg" => Ok(query.avg()),
            "min" => Ok(query.min()),
            "max" => Ok(query.max()),
            "distinct" => Ok(query.distinct()),
            "flatten" => Ok(query.flatten()),
            "unwrap" => Ok(query.unwrap()),
            "filter" => Ok(query.filter_truthy()),
            other => Err(CliError::request_error(format!("Unknown step: '{}'", other))),
        },
        Json::Object(obj) if obj.len() == 1 && obj.contains_key("filter") => {
            let spec = &obj["filter"];
            Ok(query.filter(Predicate::from_json(spec)?))
        }
        other => Err(CliError::request_error(format!("Invalid step: {}", other))),
    }
}

/// Read a JSON request from stdin
pub fn read_request() -> CliResult<Request> {
    let mut input = String::new();
    io::stdin().lock().read_to_string(&mut input)?;
    Request::parse(&input)
}

/// Write a success response to stdout
pub fn write_response(data: Json) -> CliResult<()> {
    let response = serde_json::json!({
        "status": "ok",
        "data": data
    });

    let mut stdout = io::stdout();
    serde_json::to_writer(&mut stdout, &response)?;
    writeln!(stdout)?;
    stdout.flush()?;

    Ok(())
}

/// Write an error response to stdout
pub fn write_error(code: &str, message: &str) -> CliResult<()> {
    let response = serde_json::json!({
        "status": "error",
        "code": code,
        "message": message
    });

    let mut stdout = io::stdout();
    serde_json::to_writer(&mut stdout, &response)?;
    writeln!(stdout)?;
    stdout.flush()?;

    Ok(())
}

/// Write plain text to stdout
pub fn write_text(text: &str) -> CliResult<()> {
    let mut stdout = io::stdout();
    writeln!(stdout, "{}", text)?;
    stdout.flush()?;

    Ok(())
}
