//! Error types for Graph operations.
//!
//! Every failure is classified by a [`GraphErrorCode`] so callers can tell
//! "the credential is broken" from "the service rejected the request" without
//! parsing messages. Messages carry HTTP status codes, response bodies of
//! failed requests and missing field names, never token values.

use std::fmt;
use thiserror::Error;

use freetime_core::AvailabilityError;

/// Longest response body kept in an error message.
const MAX_BODY_CHARS: usize = 512;

/// The category of a Graph error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GraphErrorCode {
    /// The token endpoint rejected the refresh grant.
    AuthServerError,
    /// The access token was rejected. Handled inside the fetcher by a single
    /// refresh-and-retry; callers never see it.
    AuthenticationExpired,
    /// Any other non-success status from the data endpoint.
    RemoteRequestError,
    /// The payload does not match the expected shape.
    MalformedResponse,
    /// The caller asked for something that cannot be queried.
    InvalidQuery,
    /// The credential record is missing required fields or is unreadable JSON.
    CorruptCredential,
    /// Connection failure, DNS error or timeout.
    NetworkError,
    /// Invalid settings or an unreadable/unwritable file.
    ConfigurationError,
}

impl GraphErrorCode {
    /// Returns a stable snake_case name for this error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthServerError => "auth_server_error",
            Self::AuthenticationExpired => "authentication_expired",
            Self::RemoteRequestError => "remote_request_error",
            Self::MalformedResponse => "malformed_response",
            Self::InvalidQuery => "invalid_query",
            Self::CorruptCredential => "corrupt_credential",
            Self::NetworkError => "network_error",
            Self::ConfigurationError => "configuration_error",
        }
    }
}

impl fmt::Display for GraphErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An error that occurred while talking to the calendar service.
#[derive(Debug, Error)]
pub struct GraphError {
    code: GraphErrorCode,
    message: String,
    /// HTTP status of the failed exchange, when there was one.
    status: Option<u16>,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl GraphError {
    /// Creates a new error with the given code and message.
    pub fn new(code: GraphErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            status: None,
            source: None,
        }
    }

    /// The token endpoint answered `status` with `body`.
    pub fn auth_server(status: u16, body: &str) -> Self {
        Self::new(
            GraphErrorCode::AuthServerError,
            format!("token refresh rejected: {}", truncate_body(body)),
        )
        .with_status(status)
    }

    /// The data endpoint rejected the access token.
    pub fn authentication_expired() -> Self {
        Self::new(
            GraphErrorCode::AuthenticationExpired,
            "access token expired or invalid",
        )
        .with_status(401)
    }

    /// The data endpoint answered `status` with `body`.
    pub fn remote_request(status: u16, body: &str) -> Self {
        Self::new(
            GraphErrorCode::RemoteRequestError,
            format!("request failed: {}", truncate_body(body)),
        )
        .with_status(status)
    }

    /// Creates a malformed response error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(GraphErrorCode::MalformedResponse, message)
    }

    /// Creates an invalid query error.
    pub fn invalid_query(message: impl Into<String>) -> Self {
        Self::new(GraphErrorCode::InvalidQuery, message)
    }

    /// Creates a corrupt credential error.
    pub fn corrupt_credential(message: impl Into<String>) -> Self {
        Self::new(GraphErrorCode::CorruptCredential, message)
    }

    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(GraphErrorCode::NetworkError, message)
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(GraphErrorCode::ConfigurationError, message)
    }

    /// Maps a transport failure from reqwest.
    pub fn from_transport(context: &str, err: reqwest::Error) -> Self {
        if err.is_builder() {
            return Self::configuration(format!("{}: invalid request", context))
                .with_source(err.without_url());
        }
        let message = if err.is_timeout() {
            format!("{}: request timed out", context)
        } else if err.is_connect() {
            format!("{}: connection failed", context)
        } else {
            format!("{}: transport error", context)
        };
        Self::network(message).with_source(err.without_url())
    }

    /// Sets the HTTP status for this error.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Sets the source error for this error.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    /// Returns the error code.
    pub fn code(&self) -> GraphErrorCode {
        self.code
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the HTTP status, if the error came from an HTTP exchange.
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    /// True for the one error kind the fetcher recovers from.
    pub fn is_authentication_expired(&self) -> bool {
        self.code == GraphErrorCode::AuthenticationExpired
    }
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code)?;
        if let Some(status) = self.status {
            write!(f, " (HTTP {})", status)?;
        }
        write!(f, ": {}", self.message)
    }
}

impl From<AvailabilityError> for GraphError {
    fn from(err: AvailabilityError) -> Self {
        match err {
            AvailabilityError::InvalidQuery { message } => Self::invalid_query(message),
            AvailabilityError::MalformedResponse { message } => Self::malformed(message),
        }
    }
}

/// A specialized Result type for Graph operations.
pub type GraphResult<T> = Result<T, GraphError>;

fn truncate_body(body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        return "<empty body>".to_string();
    }
    if body.chars().count() <= MAX_BODY_CHARS {
        return body.to_string();
    }
    let mut cut: String = body.chars().take(MAX_BODY_CHARS).collect();
    cut.push('…');
    cut
}
