/// Errors that can occur while setting up a transport.
///
/// Request failures are not `TransportError`s: they are normalized into
/// [`ApiError`](tablekeep_protocol::ApiError) so the UI can render them.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The base URL is missing a scheme or is otherwise unusable.
    #[error("invalid base url: {0}")]
    InvalidBaseUrl(String),

    /// The underlying HTTP client could not be constructed.
    #[cfg(feature = "http")]
    #[error("http client setup failed: {0}")]
    ClientBuild(#[source] reqwest::Error),
}
