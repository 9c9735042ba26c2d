//! Unified error type for every failure mode the engine can produce.
//!
//! The taxonomy is deliberately small: a `Validation` error means the received
//! message did not match its control message and fails the test; the remaining
//! variants distinguish failures that need different handling at the reporting
//! layer (missing elements, endpoint timeouts, broken configuration).

use miette::Diagnostic;
use thiserror::Error;

/// All engine failure modes.
///
/// Every variant escapes the action that raised it and aborts the enclosing
/// container chain; the execution engine converts the first error it sees into
/// the test result's cause. There are no automatic retries.
#[derive(Debug, Clone, Error, Diagnostic)]
pub enum EngineError {
    /// Content mismatch between received and control message.
    #[error("Validation failed: {message}")]
    #[diagnostic(code(veritas::validation))]
    Validation {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// A path expression resolved to nothing in the message payload.
    #[error("Element '{expression}' could not be found in message payload")]
    #[diagnostic(code(veritas::unknown_element))]
    UnknownElement { expression: String },

    /// The consumer boundary gave up waiting for a message.
    #[error("Timed out after {timeout_ms}ms waiting for message on endpoint '{endpoint}'")]
    #[diagnostic(code(veritas::timeout))]
    Timeout { endpoint: String, timeout_ms: u64 },

    /// Broken setup: no matching validator, unknown matcher name, and the
    /// like. Aborts before or instead of validation rather than mid-run.
    #[error("Configuration error: {message}")]
    #[diagnostic(code(veritas::config))]
    Config { message: String },

    /// A `${...}` reference named a variable the test context does not hold.
    #[error("Unknown variable '{name}'")]
    #[diagnostic(code(veritas::unresolved_variable))]
    UnresolvedVariable { name: String },

    /// A message payload could not be parsed as its declared type.
    #[error("Failed to parse message payload: {message}")]
    #[diagnostic(code(veritas::parse))]
    Parse { message: String },
}

impl EngineError {
    pub fn validation(message: impl Into<String>) -> Self {
        EngineError::Validation {
            message: message.into(),
            help: None,
        }
    }

    pub fn validation_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        EngineError::Validation {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        EngineError::Config {
            message: message.into(),
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        EngineError::Parse {
            message: message.into(),
        }
    }

    /// True for errors that count as content-validation failures at the
    /// reporting layer (used by fault-tolerant containers to decide whether a
    /// nested failure was the one they were told to expect).
    pub fn is_validation_failure(&self) -> bool {
        matches!(
            self,
            EngineError::Validation { .. } | EngineError::UnknownElement { .. }
        )
    }
}
