//! Error types for the cache layer.

use tablekeep_protocol::ApiError;

use crate::QueryKey;

/// Errors returned by [`QueryCache::read`](crate::QueryCache::read).
#[derive(Debug, Clone, thiserror::Error)]
pub enum CacheError {
    /// The fetch failed (after any retries). The normalized error is
    /// passed through untouched.
    #[error(transparent)]
    Fetch(#[from] ApiError),

    /// The key holds a value of a different type than the one requested.
    /// Two call sites are using the same key for different resources.
    #[error("cached value for {0} has a different type")]
    TypeMismatch(QueryKey),
}

impl CacheError {
    /// The normalized fetch error, if that's what this is.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Fetch(err) => Some(err),
            Self::TypeMismatch(_) => None,
        }
    }
}
