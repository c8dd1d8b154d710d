//! Typed compilation failures.
//!
//! Phases return these wrapped in [`eyre::Report`]; callers that need to
//! distinguish them use `report.downcast_ref::<CompileError>()`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompileError {
    /// The input graph cannot be expressed as a fixture.
    #[error("validation failed with {count} error(s): {summary}")]
    Validation { count: usize, summary: String },

    /// A value or node shape with no textual representation.
    #[error("unsupported construct at {location}: {reason}")]
    UnsupportedConstruct { location: String, reason: String },

    /// A compiler bug. Never caused by user input.
    #[error("internal invariant violated: {0}")]
    InvariantViolation(String),
}

impl CompileError {
    pub fn unsupported(location: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UnsupportedConstruct {
            location: location.into(),
            reason: reason.into(),
        }
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        Self::InvariantViolation(message.into())
    }
}
