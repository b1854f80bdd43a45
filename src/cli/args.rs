//! CLI argument definitions using clap
//!
//! Commands:
//! - rowshape fetch [--config <path>]
//! - rowshape preview [--config <path>]
//! - rowshape explain [--config <path>]
//! - rowshape csv [--config <path>] [--out <path>]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// rowshape - shape-directed queries over tabular rows
#[derive(Parser, Debug)]
#[command(name = "rowshape")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Evaluate the query and print the materialized result
    Fetch {
        /// Path to configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Print the query followed by a bounded preview of its result
    Preview {
        /// Path to configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Print the query plan without reading any row
    Explain {
        /// Path to configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Export the flattened result as delimited text
    Csv {
        /// Path to configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output file (stdout when absent)
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
