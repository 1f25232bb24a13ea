//! Error types for the session layer.

use tablekeep_cache::{CacheError, QueryKey};
use tablekeep_protocol::ApiError;

/// Errors from reading the current-user resource.
///
/// The mutating operations (`login`, `signup`, `logout`) return the
/// normalized [`ApiError`] as-is; only session reads can fail in ways
/// that aren't a server answer.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SessionError {
    /// `/auth/me` failed with something other than a 401: no network, a
    /// server error. The session is in the `Error` state.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The current-user key holds a value that isn't a user. Some other
    /// code stored a different resource under the same key.
    #[error("current-user resource under {0} holds a value of another type")]
    Corrupted(QueryKey),
}

impl SessionError {
    /// The normalized server error, if that's what this is.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Api(err) => Some(err),
            Self::Corrupted(_) => None,
        }
    }
}

impl From<CacheError> for SessionError {
    fn from(err: CacheError) -> Self {
        match err {
            CacheError::Fetch(err) => Self::Api(err),
            CacheError::TypeMismatch(key) => Self::Corrupted(key),
        }
    }
}
