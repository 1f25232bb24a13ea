//! The normalized error envelope.
//!
//! Every failure — network, validation, authorization, server — is
//! coerced into one shape before it reaches UI code:
//!
//! ```json
//! { "message": "Invalid credentials", "details": [{ "field": "email", "message": "..." }] }
//! ```
//!
//! The transport builds it, the session layer passes it through untouched,
//! and forms render it: `details` inline next to inputs, `message` as a
//! banner.

use serde::{Deserialize, Serialize};

/// Message used when an error response carries no `message` of its own.
pub const REQUEST_FAILED: &str = "Request failed";
/// Message used when an error response body isn't readable JSON.
pub const UNREADABLE_ERROR: &str = "An error occurred";
/// Message used when nothing at all is known about the failure.
pub const UNEXPECTED_ERROR: &str = "An unexpected error occurred";

/// A validation message attached to a single input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// The class of failure, derived from the status and the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The request never produced an HTTP response.
    Network,
    /// The server rejected specific fields (`details` is non-empty).
    Validation,
    /// HTTP 401. On `/auth/me` this means "confirmed logged out".
    Unauthorized,
    /// Anything else: 4xx/5xx with a root-level message only.
    Server,
}

/// The normalized `{message, details?}` error.
///
/// `Clone` matters: a single in-flight fetch may be awaited by several
/// readers, and each of them receives the same error.
///
/// The HTTP status isn't part of the wire envelope (`#[serde(skip)]`);
/// the transport fills it in from the response line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,

    #[serde(skip)]
    pub status: Option<u16>,
}

impl ApiError {
    /// A root-level error with the given HTTP status.
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            details: None,
            status: Some(status),
        }
    }

    /// A failure that never got an HTTP response (DNS, refused, reset...).
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            details: None,
            status: None,
        }
    }

    /// A field-level validation failure.
    ///
    /// The status is 422 regardless of whether the check happened on the
    /// server or was caught before sending.
    pub fn validation(message: impl Into<String>, details: Vec<FieldError>) -> Self {
        Self {
            message: message.into(),
            details: Some(details),
            status: Some(422),
        }
    }

    /// HTTP 401 with the given message.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(401, message)
    }

    /// Builds an error from a non-2xx response.
    ///
    /// `body` is whatever the server sent. A body that parses as an
    /// envelope keeps its message and details (falling back to
    /// [`REQUEST_FAILED`] for an empty message); an unreadable body
    /// becomes [`UNREADABLE_ERROR`].
    #[cfg(feature = "json")]
    pub fn from_response(status: u16, body: &[u8]) -> Self {
        #[derive(Deserialize)]
        struct Envelope {
            #[serde(default)]
            message: Option<String>,
            #[serde(default)]
            details: Option<serde_json::Value>,
        }

        if body.iter().all(u8::is_ascii_whitespace) {
            return Self::new(status, REQUEST_FAILED);
        }

        match serde_json::from_slice::<Envelope>(body) {
            Ok(envelope) => {
                let message = envelope
                    .message
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| REQUEST_FAILED.to_string());
                // `details` is only honored when it's an array of
                // `{field, message}`; anything else is dropped.
                let details = envelope
                    .details
                    .and_then(|d| serde_json::from_value::<Vec<FieldError>>(d).ok());
                Self {
                    message,
                    details,
                    status: Some(status),
                }
            }
            Err(_) => Self::new(status, UNREADABLE_ERROR),
        }
    }

    /// Classifies this error per the failure taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self.status {
            None => ErrorKind::Network,
            Some(_) if self.has_field_errors() => ErrorKind::Validation,
            Some(401) => ErrorKind::Unauthorized,
            Some(_) => ErrorKind::Server,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == Some(401)
    }

    /// Returns `true` if the error names at least one field.
    pub fn has_field_errors(&self) -> bool {
        self.details.as_ref().is_some_and(|d| !d.is_empty())
    }

    /// The field-level details, or an empty slice.
    pub fn field_errors(&self) -> &[FieldError] {
        self.details.as_deref().unwrap_or_default()
    }
}

impl Default for ApiError {
    fn default() -> Self {
        Self::network(UNEXPECTED_ERROR)
    }
}
