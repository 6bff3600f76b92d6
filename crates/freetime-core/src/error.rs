//! Error types for availability computations.

use thiserror::Error;

/// Result type for core availability operations.
pub type AvailabilityResult<T> = Result<T, AvailabilityError>;

/// Errors raised by the pure availability pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AvailabilityError {
    /// The caller supplied something that cannot be queried: an empty
    /// attendee set, a non-monotonic window or an unsupported slot length.
    #[error("invalid query: {message}")]
    InvalidQuery { message: String },

    /// The remote payload does not have the shape the query expects.
    #[error("malformed response: {message}")]
    MalformedResponse { message: String },
}

impl AvailabilityError {
    /// Creates an invalid query error.
    pub fn invalid_query(message: impl Into<String>) -> Self {
        Self::InvalidQuery {
            message: message.into(),
        }
    }

    /// Creates a malformed response error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            message: message.into(),
        }
    }

    /// Returns the human-readable message without the category prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::InvalidQuery { message } | Self::MalformedResponse { message } => message,
        }
    }
}
