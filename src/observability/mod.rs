//! Observability for rowshape
//!
//! Structured one-line JSON logs on stderr, keyed by typed [`Event`]s.
//!
//! # Principles
//!
//! 1. Observability is read-only
//! 2. No side effects on evaluation
//! 3. No background threads
//! 4. Deterministic key order
//!
//! # Usage
//!
//! ```ignore
//! use rowshape::observability::{Event, Logger, Severity};
//!
//! Logger::set_min_severity(Severity::Info);
//! Logger::emit(Event::QueryExecute, &[("steps", "2")]);
//! ```

mod events;
mod logger;

pub use events::Event;
pub use logger::{Logger, Severity};
