//! Observable events
//!
//! Events are explicit and typed.

use std::fmt;

use super::logger::Severity;

/// Observable events in rowshape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Configuration loaded
    ConfigLoaded,

    // Query lifecycle
    /// Query built and validated against its source
    QueryBuilt,
    /// Query evaluation started
    QueryExecute,
    /// Grouping pass finished
    GroupingComplete,
    /// A result was fully consumed
    ResultExhausted,
    /// Preview rendered
    PreviewBuilt,
    /// Evaluation aborted with an error
    EvaluationFailed,

    // Export
    /// Delimited text export finished
    ExportComplete,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::QueryBuilt => "QUERY_BUILT",
            Event::QueryExecute => "QUERY_EXECUTE",
            Event::GroupingComplete => "GROUPING_COMPLETE",
            Event::ResultExhausted => "RESULT_EXHAUSTED",
            Event::PreviewBuilt => "PREVIEW_BUILT",
            Event::EvaluationFailed => "EVALUATION_FAILED",
            Event::ExportComplete => "EXPORT_COMPLETE",
        }
    }

    /// Default severity when emitted through [`super::Logger::emit`]
    pub fn severity(&self) -> Severity {
        match self {
            Event::ConfigLoaded | Event::QueryExecute | Event::ExportComplete => Severity::Info,
            Event::EvaluationFailed => Severity::Warn,
            Event::QueryBuilt
            | Event::GroupingComplete
            | Event::ResultExhausted
            | Event::PreviewBuilt => Severity::Trace,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
