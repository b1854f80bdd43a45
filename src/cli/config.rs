//! CLI configuration file
//!
//! A JSON object; every field is optional:
//!
//! ```json
//! {"preview_max_lines": 8, "preview_width": 72, "csv_delimiter": ",",
//!  "csv_header": true, "log_level": "warn"}
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::errors::{CliError, CliResult};
use crate::export::CsvOptions;
use crate::observability::{Event, Logger, Severity};
use crate::query::PREVIEW_MAX_LINES;
use crate::value::DEFAULT_WIDTH;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Lines shown by `preview`
    #[serde(default = "default_preview_max_lines")]
    pub preview_max_lines: usize,

    /// Target line width of `preview`
    #[serde(default = "default_preview_width")]
    pub preview_width: usize,

    /// Single-character field delimiter for `csv`
    #[serde(default = "default_csv_delimiter")]
    pub csv_delimiter: String,

    #[serde(default = "default_csv_header")]
    pub csv_header: bool,

    /// Minimum log severity: trace, info, warn or error
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_preview_max_lines() -> usize {
    PREVIEW_MAX_LINES
}
fn default_preview_width() -> usize {
    DEFAULT_WIDTH
}
fn default_csv_delimiter() -> String {
    ",".to_string()
}
fn default_csv_header() -> bool {
    true
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            preview_max_lines: default_preview_max_lines(),
            preview_width: default_preview_width(),
            csv_delimiter: default_csv_delimiter(),
            csv_header: default_csv_header(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;
        Self::parse(&content)
    }

    /// Parse and validate configuration JSON
    pub fn parse(content: &str) -> CliResult<Self> {
        let config: Config = serde_json::from_str(content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `path` when given, defaults otherwise, and applies the log
    /// level
    pub fn resolve(path: Option<&Path>) -> CliResult<Self> {
        let config = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        Logger::set_min_severity(config.severity()?);
        Logger::emit(
            Event::ConfigLoaded,
            &[
                ("log_level", config.log_level.as_str()),
                (
                    "source",
                    path.and_then(|p| p.to_str()).unwrap_or("defaults"),
                ),
            ],
        );
        Ok(config)
    }

    pub fn validate(&self) -> CliResult<()> {
        if self.preview_max_lines == 0 {
            return Err(CliError::config_error("preview_max_lines must be > 0"));
        }
        if self.preview_width == 0 {
            return Err(CliError::config_error("preview_width must be > 0"));
        }
        self.delimiter()?;
        self.severity()?;
        Ok(())
    }

    fn delimiter(&self) -> CliResult<char> {
        let mut chars = self.csv_delimiter.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if !matches!(c, '"' | '\r' | '\n') => Ok(c),
            _ => Err(CliError::config_error(format!(
                "Invalid csv_delimiter: {:?}. Expected one character other than a quote or line break.",
                self.csv_delimiter
            ))),
        }
    }

    fn severity(&self) -> CliResult<Severity> {
        Severity::parse(&self.log_level).ok_or_else(|| {
            CliError::config_error(format!("Invalid log_level: '{}'", self.log_level))
        })
    }

    pub fn csv_options(&self) -> CliResult<CsvOptions> {
        Ok(CsvOptions {
            delimiter: self.delimiter()?,
            header: self.csv_header,
        })
    }
}
