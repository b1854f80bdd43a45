//! CLI module for rowshape
//!
//! Reads one JSON request on stdin describing rows, a selection, field
//! constraints and steps, then runs one of:
//! - fetch: materialize the result as JSON
//! - preview: print the query and a bounded preview
//! - explain: print the query plan without reading rows
//! - csv: export the flattened result as delimited text

mod args;
mod commands;
mod config;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{csv, explain, fetch, fetch_request, preview, run, run_command};
pub use config::Config;
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_request, write_error, write_response, Request};
