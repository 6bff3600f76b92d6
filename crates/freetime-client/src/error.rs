//! Client error types.

use std::fmt;

use freetime_core::AvailabilityError;
use freetime_graph::GraphError;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur in the client.
#[derive(Debug)]
pub enum ClientError {
    /// Configuration error.
    Config(String),
    /// A command-line value could not be used.
    InvalidArgument(String),
    /// Failure talking to the calendar service.
    Graph(GraphError),
    /// IO error.
    Io(std::io::Error),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration error: {}", msg),
            Self::InvalidArgument(msg) => write!(f, "invalid argument: {}", msg),
            Self::Graph(err) => write!(f, "{}", err),
            Self::Io(err) => write!(f, "IO error: {}", err),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Graph(err) => Some(err),
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<GraphError> for ClientError {
    fn from(err: GraphError) -> Self {
        Self::Graph(err)
    }
}

impl From<AvailabilityError> for ClientError {
    fn from(err: AvailabilityError) -> Self {
        Self::InvalidArgument(err.message().to_string())
    }
}
