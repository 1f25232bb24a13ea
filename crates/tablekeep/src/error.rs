//! Unified error type for Tablekeep.

use tablekeep_cache::CacheError;
use tablekeep_protocol::{ApiError, ProtocolError};
use tablekeep_session::SessionError;
use tablekeep_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `tablekeep` crate, you deal with this single error type
/// instead of importing errors from each sub-crate. The `#[from]`
/// attribute on each variant generates the `From` impls, so `?` converts
/// sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum TablekeepError {
    /// Setting up the transport failed (bad base URL, client build).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Encoding or decoding a body failed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A cached resource couldn't be read.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// The current-user resource couldn't be read.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The server (or the network) rejected a request.
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl TablekeepError {
    /// The normalized server error underneath, wherever it came from.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Api(err) => Some(err),
            Self::Cache(err) => err.api_error(),
            Self::Session(err) => err.api_error(),
            Self::Transport(_) | Self::Protocol(_) => None,
        }
    }
}
