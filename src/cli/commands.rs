//! CLI command implementations
//!
//! Every command loads the configuration, reads one request from stdin,
//! builds the query and writes a single response. Failures are written as
//! a JSON error response before being returned to `main`.

use std::path::Path;

use super::args::Command;
use super::config::Config;
use super::errors::CliResult;
use super::io::{read_request, write_error, write_response, write_text, Request};
use crate::query::Query;

/// Parse arguments and run the selected command
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    let outcome = match cmd {
        Command::Fetch { config } => fetch(config.as_deref()),
        Command::Preview { config } => preview(config.as_deref()),
        Command::Explain { config } => explain(config.as_deref()),
        Command::Csv { config, out } => csv(config.as_deref(), out.as_deref()),
    };
    if let Err(err) = &outcome {
        write_error(err.code_str(), err.message())?;
    }
    outcome
}

fn load(config_path: Option<&Path>) -> CliResult<(Config, Query)> {
    let config = Config::resolve(config_path)?;
    let query = read_request()?.into_query()?;
    Ok((config, query))
}

/// Materialize the result and write it as JSON
pub fn fetch(config_path: Option<&Path>) -> CliResult<()> {
    let (_, query) = load(config_path)?;
    write_response(fetch_json(&query)?)
}

/// Print the query and a bounded preview
pub fn preview(config_path: Option<&Path>) -> CliResult<()> {
    let (config, query) = load(config_path)?;
    let text = query.preview_with(config.preview_max_lines, config.preview_width)?;
    write_text(&text)
}

/// Print the query plan; no row is read
pub fn explain(config_path: Option<&Path>) -> CliResult<()> {
    let (_, query) = load(config_path)?;
    write_text(query.explain().to_string().trim_end())
}

/// Export the flattened result to `out`, or to stdout
pub fn csv(config_path: Option<&Path>, out: Option<&Path>) -> CliResult<()> {
    let (config, query) = load(config_path)?;
    let options = config.csv_options()?;
    match out {
        Some(path) => {
            let rows = query.to_csv_path(path, &options)?;
            write_response(serde_json::json!({
                "path": path.display().to_string(),
                "rows": rows,
            }))
        }
        None => {
            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            query.to_csv(&mut lock, &options)?;
            Ok(())
        }
    }
}

fn fetch_json(query: &Query) -> CliResult<serde_json::Value> {
    Ok(serde_json::to_value(query.fetch()?)?)
}

/// Runs a request given as text and returns the JSON `fetch` would print
pub fn fetch_request(input: &str) -> CliResult<serde_json::Value> {
    fetch_json(&Request::parse(input)?.into_query()?)
}
