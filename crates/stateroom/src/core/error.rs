//! Error types for extraction and diagram generation
//!
//! One enum covers the whole pipeline: model lookups, convention violations
//! found while scanning, and plain I/O failures propagated unmodified.

use thiserror::Error;

/// Errors raised by the model, the extraction passes, and the renderer
#[derive(Error, Debug)]
pub enum HsmError {
    #[error("unknown state: {name}")]
    UnknownState { name: String },

    #[error("duplicate state declaration: {name}")]
    DuplicateState { name: String },

    #[error("invariant violation: {message}")]
    InvariantViolation { message: String },

    #[error("malformed input: {message} at line {line}")]
    MalformedInput { message: String, line: usize },

    #[error("IO error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl HsmError {
    /// Create a new unknown-state error
    pub fn unknown_state(name: impl Into<String>) -> Self {
        Self::UnknownState { name: name.into() }
    }

    /// Create a new duplicate-state error
    pub fn duplicate_state(name: impl Into<String>) -> Self {
        Self::DuplicateState { name: name.into() }
    }

    /// Create a new invariant-violation error
    pub fn invariant(message: impl Into<String>) -> Self {
        Self::InvariantViolation {
            message: message.into(),
        }
    }

    /// Create a new malformed-input error for a 1-based source line
    pub fn malformed(message: impl Into<String>, line: usize) -> Self {
        Self::MalformedInput {
            message: message.into(),
            line,
        }
    }
}

/// Convenience alias used throughout the crate
pub type Result<T, E = HsmError> = std::result::Result<T, E>;
