//! Error taxonomy for the orchestration layer.
//!
//! Two propagation classes, checked via `is_session_fatal()`:
//!
//! | Error           | Session-fatal | Handling                                   |
//! |-----------------|---------------|--------------------------------------------|
//! | Validation      | yes           | fail fast, no endpoint is ever called      |
//! | RetryExhausted  | yes           | terminal, full failure history attached    |
//! | Configuration   | yes           | rejected before the session starts         |
//! | Internal        | yes           | state-machine bug, should never fire       |
//! | Transport       | no            | downgraded to a zero-quality result        |
//! | Parse           | no            | downgraded to a zero-quality result        |
//!
//! Per-test-case failures (compile, runtime, timeout) live in
//! [`sandbox::ExecutionError`] and never surface here — they are
//! recorded on the outcome and the session continues.

use thiserror::Error;

use crate::state_machine::IllegalTransition;

/// Unified error type for session-level operations.
#[derive(Debug, Error)]
pub enum SolverError {
    /// Malformed or too-short problem statement. Never retried.
    #[error("invalid problem request: {0}")]
    Validation(String),

    /// Endpoint unreachable, non-success status, or request timeout.
    #[error("transport failure [{endpoint}]: {message}")]
    Transport { endpoint: String, message: String },

    /// Response body missing the expected structure.
    #[error("unparsable response from {endpoint}: {message}")]
    Parse { endpoint: String, message: String },

    /// Every ranked endpoint was tried, or the attempt budget ran out.
    #[error("retry list exhausted after {attempts} attempts")]
    RetryExhausted { attempts: u32 },

    /// Configuration rejected before any session work.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Invariant breach inside the controller itself.
    #[error("internal error: {0}")]
    Internal(String),
}

impl SolverError {
    /// Whether this error terminates the session (vs being absorbed
    /// into a zero-quality analysis result).
    pub fn is_session_fatal(&self) -> bool {
        matches!(
            self,
            Self::Validation(_)
                | Self::RetryExhausted { .. }
                | Self::Configuration(_)
                | Self::Internal(_)
        )
    }

    /// Build a `Transport` variant conveniently.
    pub fn transport(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }
}

impl From<IllegalTransition> for SolverError {
    fn from(err: IllegalTransition) -> Self {
        Self::Internal(err.to_string())
    }
}
