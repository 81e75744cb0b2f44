//! Error types for agentpad-core
//!
//! Every store-level failure is a distinct variant so the request layer can
//! tell "the session does not exist" apart from "storage could not be reached".

use thiserror::Error;

/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    /// Session id absent or expired
    #[error("session not found: {0}")]
    SessionNotFound(String),

    /// Caller identity does not match the session's bound owner
    #[error("session {0} is bound to a different caller")]
    OwnerMismatch(String),

    /// Todo id absent within an existing session
    #[error("todo {todo_id} not found in session {session_id}")]
    TodoNotFound {
        /// Owning session
        session_id: String,
        /// Missing todo
        todo_id: String,
    },

    /// Identifier collisions exceeded the retry bound
    #[error("could not generate a unique session id after {attempts} attempts")]
    GenerationExhausted {
        /// Number of candidates tried
        attempts: usize,
    },

    /// Storage could not be reached (connection refused, dropped, timed out)
    #[error("storage backend unavailable: {0}")]
    BackendUnavailable(String),

    /// A record with this id is already stored
    #[error("duplicate session id: {0}")]
    DuplicateId(String),

    /// Backend rejected a command for a non-connectivity reason
    #[error("storage backend error: {0}")]
    Backend(String),

    /// Record could not be encoded or decoded
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Invalid settings rejected at startup
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Caller-supplied value is malformed
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Stable machine-readable code for the error kind
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Error::SessionNotFound(_) => "session_not_found",
            Error::OwnerMismatch(_) => "owner_mismatch",
            Error::TodoNotFound { .. } => "todo_not_found",
            Error::GenerationExhausted { .. } => "generation_exhausted",
            Error::BackendUnavailable(_) => "backend_unavailable",
            Error::DuplicateId(_) => "duplicate_id",
            Error::Backend(_) => "backend_error",
            Error::Serialization(_) => "serialization_error",
            Error::Configuration(_) => "configuration_error",
            Error::InvalidInput(_) => "invalid_input",
        }
    }

    /// Whether retrying the same call later may succeed.
    ///
    /// Only connectivity faults qualify. `GenerationExhausted` is fatal.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::BackendUnavailable(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<redis::RedisError> for Error {
    fn from(e: redis::RedisError) -> Self {
        if e.is_connection_refusal()
            || e.is_connection_dropped()
            || e.is_io_error()
            || e.is_timeout()
        {
            Error::BackendUnavailable(e.to_string())
        } else {
            Error::Backend(e.to_string())
        }
    }
}
