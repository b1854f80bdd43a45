//! Query error types
//!
//! Error codes:
//! - ROWSHAPE_TEMPLATE_SYNTAX (construction)
//! - ROWSHAPE_FIELD_LOOKUP (construction)
//! - ROWSHAPE_INVALID_ARGUMENT (construction)
//! - ROWSHAPE_EVALUATION_TYPE (evaluation)
//! - ROWSHAPE_SOURCE (evaluation)
//! - ROWSHAPE_IO (evaluation)
//!
//! Construction errors are raised while a query is built or bound to a
//! source, before any row is read. Evaluation errors abort the evaluation
//! that raised them; elements already handed to the caller stay valid.

use std::error::Error as StdError;
use std::fmt;
use std::io;

use thiserror::Error;

use crate::value::Value;

/// Error type returned by user-supplied functions and matchers
pub type UserError = Box<dyn StdError + Send + Sync>;

/// Result type for user-supplied functions and matchers
pub type UserResult<T> = Result<T, UserError>;

/// Result type for query operations
pub type QueryResult<T> = Result<T, QueryError>;

/// Stable error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryErrorCode {
    TemplateSyntax,
    FieldLookup,
    InvalidArgument,
    EvaluationType,
    Source,
    Io,
}

impl QueryErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            QueryErrorCode::TemplateSyntax => "ROWSHAPE_TEMPLATE_SYNTAX",
            QueryErrorCode::FieldLookup => "ROWSHAPE_FIELD_LOOKUP",
            QueryErrorCode::InvalidArgument => "ROWSHAPE_INVALID_ARGUMENT",
            QueryErrorCode::EvaluationType => "ROWSHAPE_EVALUATION_TYPE",
            QueryErrorCode::Source => "ROWSHAPE_SOURCE",
            QueryErrorCode::Io => "ROWSHAPE_IO",
        }
    }

    /// Returns true for errors raised before any row is read
    pub fn is_construction(&self) -> bool {
        matches!(
            self,
            QueryErrorCode::TemplateSyntax
                | QueryErrorCode::FieldLookup
                | QueryErrorCode::InvalidArgument
        )
    }
}

impl fmt::Display for QueryErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Errors raised while building or evaluating a query
#[derive(Debug, Error)]
pub enum QueryError {
    /// Malformed selection template
    #[error("template syntax error: {message}")]
    TemplateSyntax { message: String },

    /// Field referenced by a template or a where-constraint is unknown
    #[error("{field:?} not in {source_desc}")]
    FieldLookup { field: String, source_desc: String },

    /// Argument not acceptable for this query
    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    /// Failure while evaluating a step
    #[error("{operation} failed{}: {message}", .value.as_ref().map(|v| format!(" on {}", v)).unwrap_or_default())]
    EvaluationType {
        operation: String,
        value: Option<Value>,
        message: String,
    },

    /// The row source failed to produce rows
    #[error("row source error: {message}")]
    Source { message: String },

    /// Export sink failure
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl QueryError {
    pub fn template_syntax(message: impl Into<String>) -> Self {
        Self::TemplateSyntax {
            message: message.into(),
        }
    }

    pub fn field_lookup(field: impl Into<String>, source_desc: impl Into<String>) -> Self {
        Self::FieldLookup {
            field: field.into(),
            source_desc: source_desc.into(),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Evaluation failure attributed to a step and the value that caused it
    pub fn evaluation(
        operation: impl Into<String>,
        value: Option<&Value>,
        message: impl Into<String>,
    ) -> Self {
        Self::EvaluationType {
            operation: operation.into(),
            value: value.cloned(),
            message: message.into(),
        }
    }

    /// Wraps an error returned by a user function
    pub fn user_function(operation: &str, value: Option<&Value>, err: UserError) -> Self {
        Self::evaluation(operation, value, err.to_string())
    }

    pub fn source(message: impl Into<String>) -> Self {
        Self::Source {
            message: message.into(),
        }
    }

    /// Returns the error code
    pub fn code(&self) -> QueryErrorCode {
        match self {
            QueryError::TemplateSyntax { .. } => QueryErrorCode::TemplateSyntax,
            QueryError::FieldLookup { .. } => QueryErrorCode::FieldLookup,
            QueryError::InvalidArgument { .. } => QueryErrorCode::InvalidArgument,
            QueryError::EvaluationType { .. } => QueryErrorCode::EvaluationType,
            QueryError::Source { .. } => QueryErrorCode::Source,
            QueryError::Io(_) => QueryErrorCode::Io,
        }
    }

    /// Returns true for errors raised at construction time
    pub fn is_construction_error(&self) -> bool {
        self.code().is_construction()
    }
}
